/*
Swarm Clock Synchronisation
===========================

Every node keeps its own millisecond clock starting at boot. Senders stamp
events with *their* clock (`t`). To play an event at the same instant on
every node, each node estimates

    delta = network_time - local_time

once, and from then on translates every stamp with

    local_fire_time = network_time - delta + LATENCY

LATENCY is the same on every node, so the constant network jitter is
absorbed as long as a packet arrives less than LATENCY late.


Drift Guard
-----------

  local time ─────────────────────────────────────────────────────→
               now                 now + LATENCY + MAX_DRIFT
          ✗     │████████ accepted ███████│      ✗
          re-anchor                        re-anchor

A translated time that lands before `now` (sender restarted, host clock
jumped back) or too far ahead (this node restarted, long disconnection)
means the stored delta no longer describes the sender. The delta is then
recomputed from the offending packet, which plays at `now + LATENCY`.

Re-anchoring only changes how *future* stamps are translated. Fire times
already handed to the audio thread are never touched.
*/

use tracing::info;

#[derive(Debug, Clone)]
pub struct ClockSync {
    delta: Option<i64>,
    latency_ms: i64,
    max_drift_ms: i64,
}

impl ClockSync {
    pub fn new(latency_ms: i64, max_drift_ms: i64) -> Self {
        Self {
            delta: None,
            latency_ms,
            max_drift_ms,
        }
    }

    /// Current `network - local` estimate, if one has been established.
    pub fn delta(&self) -> Option<i64> {
        self.delta
    }

    pub fn latency_ms(&self) -> i64 {
        self.latency_ms
    }

    /// Translate a sender timestamp into a local fire time.
    ///
    /// Events without a timestamp play at `now + latency`.
    pub fn schedule(&mut self, network_time: Option<i64>, now: i64) -> i64 {
        let Some(network_time) = network_time else {
            return now + self.latency_ms;
        };

        let delta = match self.delta {
            Some(delta) => delta,
            None => {
                let delta = network_time.saturating_sub(now);
                info!(delta, "clock delta established");
                self.delta = Some(delta);
                delta
            }
        };

        // a stamp that overflows the local time base is outside any window
        let translated = network_time
            .checked_sub(delta)
            .and_then(|t| t.checked_add(self.latency_ms));
        if let Some(fire_at) = translated.filter(|&t| self.within_window(t, now)) {
            return fire_at;
        }

        let fresh = network_time.saturating_sub(now);
        info!(
            network_time,
            local_time = now,
            old_delta = delta,
            new_delta = fresh,
            "recomputing time base"
        );
        self.delta = Some(fresh);
        now.saturating_add(self.latency_ms)
    }

    /// Take the delta directly from a host sync token, skipping the guard.
    pub fn anchor(&mut self, network_time: i64, now: i64) {
        self.delta = Some(network_time.saturating_sub(now));
    }

    fn within_window(&self, fire_at: i64, now: i64) -> bool {
        let horizon = now
            .saturating_add(self.latency_ms)
            .saturating_add(self.max_drift_ms);
        fire_at >= 0 && fire_at >= now && fire_at <= horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATENCY: i64 = 1_000;
    const DRIFT: i64 = 20_000;

    #[test]
    fn untimed_events_play_after_latency() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        assert_eq!(clock.schedule(None, 500), 1_500);
        assert_eq!(clock.delta(), None);
    }

    #[test]
    fn first_stamp_sets_delta() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        let fire = clock.schedule(Some(50_000), 2_000);
        assert_eq!(clock.delta(), Some(48_000));
        assert_eq!(fire, 3_000);
    }

    #[test]
    fn later_stamps_keep_relative_timing() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        clock.schedule(Some(50_000), 2_000);
        // 250 ms later on the sender, arriving 40 ms later here
        let fire = clock.schedule(Some(50_250), 2_040);
        assert_eq!(fire, 50_250 - 48_000 + LATENCY);
        assert_eq!(clock.delta(), Some(48_000));
    }

    #[test]
    fn stamp_in_the_past_recomputes() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        clock.schedule(Some(50_000), 2_000);
        // sender clock jumped back by a minute
        let fire = clock.schedule(Some(-10_000 + 50_000), 3_000);
        assert_eq!(clock.delta(), Some(40_000 - 3_000));
        assert_eq!(fire, 3_000 + LATENCY);
    }

    #[test]
    fn stamp_too_far_ahead_recomputes() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        clock.schedule(Some(50_000), 2_000);
        let far = 50_000 + LATENCY + DRIFT + 5_000;
        let fire = clock.schedule(Some(far), 2_000);
        assert_eq!(clock.delta(), Some(far - 2_000));
        assert_eq!(fire, 2_000 + LATENCY);
    }

    #[test]
    fn edge_of_window_is_accepted() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        clock.schedule(Some(10_000), 0);
        let fire = clock.schedule(Some(10_000 + DRIFT), 0);
        assert_eq!(fire, LATENCY + DRIFT);
        assert_eq!(clock.delta(), Some(10_000));
    }

    #[test]
    fn saturated_stamp_recomputes_instead_of_overflowing() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        clock.schedule(Some(1), 5_000);
        assert_eq!(clock.delta(), Some(-4_999));

        let fire = clock.schedule(Some(i64::MAX), 5_001);
        assert_eq!(fire, 5_001 + LATENCY);
        assert_eq!(clock.delta(), Some(i64::MAX - 5_001));

        // and back down again from the extreme delta
        let fire = clock.schedule(Some(1), 5_002);
        assert_eq!(fire, 5_002 + LATENCY);
        assert_eq!(clock.delta(), Some(1 - 5_002));
    }

    #[test]
    fn anchor_overrides_delta() {
        let mut clock = ClockSync::new(LATENCY, DRIFT);
        clock.schedule(Some(50_000), 2_000);
        clock.anchor(90_000, 2_500);
        assert_eq!(clock.delta(), Some(87_500));
    }
}
