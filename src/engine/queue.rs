use thiserror::Error;
use tracing::warn;

use crate::protocol::Event;

/// An event together with its local fire time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduled {
    pub fire_at: i64,
    pub event: Event,
}

impl Scheduled {
    pub fn new(fire_at: i64, event: Event) -> Self {
        Self { fire_at, event }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Empty,
    Scheduled,
    Played,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    status: Status,
    fire_at: i64,
    event: Event,
}

/// Returned when the next write slot still holds an unplayed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event queue full ({capacity} slots), dropping newest event")]
pub struct QueueFull {
    pub capacity: usize,
}

/// Fixed pool of delta slots.
///
/// Writes go round-robin; a write that lands on a slot still `Scheduled`
/// is refused rather than overwriting it. Draining scans the whole pool, so
/// order of application is slot order, not fire-time order.
pub struct EventQueue {
    slots: Vec<Slot>,
    write: usize,
    dropped: u64,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default(); capacity.max(1)],
            write: 0,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots waiting to fire.
    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == Status::Scheduled)
            .count()
    }

    /// Total events shed since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn status(&self, slot: usize) -> Option<Status> {
        self.slots.get(slot).map(|s| s.status)
    }

    pub fn push(&mut self, scheduled: Scheduled) -> Result<(), QueueFull> {
        let slot = &mut self.slots[self.write];
        if slot.status == Status::Scheduled {
            self.dropped += 1;
            warn!(
                slot = self.write,
                fire_at = scheduled.fire_at,
                dropped = self.dropped,
                "event queue full"
            );
            return Err(QueueFull {
                capacity: self.slots.len(),
            });
        }

        slot.event = scheduled.event;
        slot.fire_at = scheduled.fire_at;
        slot.status = Status::Scheduled;
        self.write = (self.write + 1) % self.slots.len();
        Ok(())
    }

    /// Hand every due event to `apply` and mark it played. Returns how many
    /// fired.
    pub fn drain_due<F>(&mut self, now: i64, mut apply: F) -> usize
    where
        F: FnMut(&Event),
    {
        let mut fired = 0;
        for slot in &mut self.slots {
            if slot.status == Status::Scheduled && slot.fire_at <= now {
                apply(&slot.event);
                slot.status = Status::Played;
                fired += 1;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(fire_at: i64, voice: u8) -> Scheduled {
        Scheduled::new(fire_at, Event::for_voice(voice))
    }

    #[test]
    fn due_events_fire_once() {
        let mut q = EventQueue::with_capacity(4);
        q.push(at(10, 0)).unwrap();
        q.push(at(20, 1)).unwrap();

        let mut seen = Vec::new();
        assert_eq!(q.drain_due(15, |e| seen.push(e.voice)), 1);
        assert_eq!(seen, vec![0]);
        assert_eq!(q.drain_due(15, |e| seen.push(e.voice)), 0);
        assert_eq!(q.drain_due(25, |e| seen.push(e.voice)), 1);
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(q.status(0), Some(Status::Played));
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn full_queue_drops_newest() {
        let mut q = EventQueue::with_capacity(3);
        for v in 0..3 {
            q.push(at(100, v)).unwrap();
        }
        assert_eq!(q.push(at(100, 9)), Err(QueueFull { capacity: 3 }));
        assert_eq!(q.dropped(), 1);

        let mut seen = Vec::new();
        q.drain_due(100, |e| seen.push(e.voice));
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn played_slots_are_reused() {
        let mut q = EventQueue::with_capacity(2);
        q.push(at(0, 0)).unwrap();
        q.push(at(50, 1)).unwrap();
        q.drain_due(10, |_| {});
        // slot 0 is played, slot 1 still waiting
        q.push(at(5, 2)).unwrap();
        assert!(q.push(at(5, 3)).is_err());

        let mut seen = Vec::new();
        q.drain_due(60, |e| seen.push(e.voice));
        assert_eq!(seen, vec![2, 1]);
    }
}
