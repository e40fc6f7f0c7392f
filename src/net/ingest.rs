use rtrb::Producer;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::engine::Scheduled;
use crate::net::transport::MulticastTransport;
use crate::protocol::{decode, ping, sync_reply, Message, Packet, SyncResponse};
use crate::swarm::{delivers, ClockSync, Swarm};
use crate::time::TimeSource;
use crate::RunFlag;

/// What the ingest unit did with one datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Handed to the audio thread, to fire at local time `fire_at`.
    Queued { fire_at: i64 },
    /// Addressed to this node but the handoff ring was full.
    Shed,
    /// Addressed to some other node.
    Filtered,
    /// A sync request; the reply should be broadcast.
    Reply(String),
    /// Another node's sync reply or ping, recorded in membership.
    Recorded,
    Malformed,
}

/// The network-ingest unit.
///
/// Owns the time base and membership view; the only thing it shares with
/// the audio thread is the producer end of the handoff ring.
pub struct Ingest {
    clock: ClockSync,
    swarm: Swarm,
    tx: Producer<Scheduled>,
    ping_interval_ms: i64,
    last_ping: Option<i64>,
}

impl Ingest {
    pub fn new(config: &NodeConfig, tx: Producer<Scheduled>) -> Self {
        let timing = &config.timing;
        Self {
            clock: ClockSync::new(timing.latency_ms, timing.max_drift_ms),
            swarm: Swarm::new(
                config.node.address,
                timing.liveness_window_ms(),
                config.node.id,
            ),
            tx,
            ping_interval_ms: timing.ping_interval_ms,
            last_ping: None,
        }
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn handle(&mut self, bytes: &[u8], now: i64) -> Outcome {
        match decode(bytes) {
            Message::Malformed => {
                debug!(len = bytes.len(), "malformed datagram");
                Outcome::Malformed
            }
            Message::SyncRequest { token, slot } => {
                self.clock.anchor(token, now);
                info!(token, slot, delta = ?self.clock.delta(), "sync request");
                Outcome::Reply(sync_reply(
                    now,
                    slot,
                    self.swarm.node_id(),
                    self.swarm.address(),
                ))
            }
            Message::SyncResponse(SyncResponse {
                client,
                address,
                token,
                ..
            }) => {
                self.swarm.record_sync_response(client, address, token, now);
                Outcome::Recorded
            }
            Message::Event(packet) => self.route(packet, now),
        }
    }

    fn route(&mut self, packet: Packet, now: i64) -> Outcome {
        // every timed event feeds the time base, even ones for other nodes
        let fire_at = self.clock.schedule(packet.network_time, now);

        if !delivers(packet.destination, self.swarm.node_id(), self.swarm.alive()) {
            debug!(destination = ?packet.destination, node = self.swarm.node_id(), "not for this node");
            return Outcome::Filtered;
        }

        match self.tx.push(Scheduled::new(fire_at, packet.event)) {
            Ok(()) => {
                debug!(voice = packet.event.voice, fire_at, "event queued");
                Outcome::Queued { fire_at }
            }
            Err(_) => {
                warn!(fire_at, "handoff ring full, dropping event");
                Outcome::Shed
            }
        }
    }

    /// The liveness ping to broadcast, if one is due. Also records this node
    /// and expires silent peers.
    pub fn ping_due(&mut self, now: i64) -> Option<String> {
        if self
            .last_ping
            .is_some_and(|last| now - last < self.ping_interval_ms)
        {
            return None;
        }
        self.last_ping = Some(now);

        let address = self.swarm.address();
        let id = i64::from(self.swarm.node_id());
        self.swarm.record_sync_response(id, address, now, now);
        self.swarm.expire(now);
        Some(ping(now, self.swarm.node_id(), address))
    }

    /// Receive and dispatch datagrams until `running` is cleared.
    pub fn run<T: TimeSource>(
        &mut self,
        transport: &MulticastTransport,
        time: &T,
        running: &RunFlag,
        max_datagram: usize,
    ) {
        let mut buf = vec![0u8; max_datagram];
        info!(address = self.swarm.address(), "ingest running");
        while running.is_running() {
            if let Some(message) = self.ping_due(time.now_ms()) {
                transport.broadcast(message.as_bytes());
            }

            match transport.recv(&mut buf) {
                Ok(Some(n)) => {
                    if let Outcome::Reply(reply) = self.handle(&buf[..n], time.now_ms()) {
                        transport.broadcast(reply.as_bytes());
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(%err, "receive failed"),
            }
        }
        info!("ingest stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::{Consumer, RingBuffer};

    fn ingest(address: u8, id: Option<u8>) -> (Ingest, Consumer<Scheduled>) {
        let mut config = NodeConfig::default();
        config.node.address = address;
        config.node.id = id;
        let (tx, rx) = RingBuffer::new(4);
        (Ingest::new(&config, tx), rx)
    }

    #[test]
    fn event_is_translated_and_queued() {
        let (mut ingest, mut rx) = ingest(1, Some(2));
        let outcome = ingest.handle(b"v2w1n60l100t1000", 500);
        assert_eq!(outcome, Outcome::Queued { fire_at: 1_500 });
        assert_eq!(ingest.clock().delta(), Some(500));

        let scheduled = rx.pop().unwrap();
        assert_eq!(scheduled.fire_at, 1_500);
        assert_eq!(scheduled.event.voice, 2);
        assert_eq!(scheduled.event.velocity, Some(100.0));
    }

    #[test]
    fn untimed_event_plays_after_latency() {
        let (mut ingest, _rx) = ingest(1, None);
        assert_eq!(ingest.handle(b"v0l1", 40), Outcome::Queued { fire_at: 1_040 });
        assert_eq!(ingest.clock().delta(), None);
    }

    #[test]
    fn other_nodes_events_are_filtered() {
        let (mut ingest, mut rx) = ingest(1, Some(3));
        assert_eq!(ingest.handle(b"v0l1c4", 0), Outcome::Filtered);
        assert_eq!(ingest.handle(b"v0l1c260", 0), Outcome::Filtered);
        assert_eq!(ingest.handle(b"v0l1c3", 0), Outcome::Queued { fire_at: 1_000 });
        assert!(rx.pop().is_ok());
        assert!(rx.pop().is_err());
    }

    #[test]
    fn full_ring_sheds() {
        let (mut ingest, _rx) = ingest(1, None);
        for _ in 0..4 {
            assert!(matches!(ingest.handle(b"v0", 0), Outcome::Queued { .. }));
        }
        assert_eq!(ingest.handle(b"v0", 0), Outcome::Shed);
    }

    #[test]
    fn sync_request_replies_and_anchors() {
        let (mut ingest, mut rx) = ingest(17, Some(4));
        let outcome = ingest.handle(b"s90000i3", 1_000);
        assert_eq!(outcome, Outcome::Reply("_s1000i3c4r17y0".into()));
        assert_eq!(ingest.clock().delta(), Some(89_000));
        assert!(rx.pop().is_err());
    }

    #[test]
    fn sync_responses_grow_the_swarm() {
        let (mut ingest, _rx) = ingest(20, None);
        assert_eq!(ingest.handle(b"_s10i0c0r10y0", 0), Outcome::Recorded);
        assert_eq!(ingest.handle(b"_s10i0c1r30y0", 0), Outcome::Recorded);
        assert_eq!(ingest.swarm().alive(), 2);

        ingest.ping_due(0);
        assert_eq!(ingest.swarm().alive(), 3);
        assert_eq!(ingest.swarm().node_id(), 1);
    }

    #[test]
    fn pings_follow_the_interval() {
        let (mut ingest, _rx) = ingest(9, Some(0));
        assert_eq!(ingest.ping_due(0).as_deref(), Some("_s0i-1c0r9y0"));
        assert_eq!(ingest.ping_due(9_999), None);
        assert!(ingest.ping_due(10_000).is_some());
    }

    #[test]
    fn huge_stamp_reanchors_instead_of_panicking() {
        let (mut ingest, _rx) = ingest(1, None);
        assert_eq!(ingest.handle(b"t1v0", 5_000), Outcome::Queued { fire_at: 6_000 });
        assert_eq!(
            ingest.handle(b"t99999999999999999999v0", 5_001),
            Outcome::Queued { fire_at: 6_001 }
        );
        assert_eq!(ingest.clock().delta(), Some(i64::MAX - 5_001));
    }

    #[test]
    fn garbage_is_malformed() {
        let (mut ingest, _rx) = ingest(1, None);
        assert_eq!(ingest.handle(b"", 0), Outcome::Malformed);
        assert_eq!(ingest.handle(b"\x00v1", 0), Outcome::Malformed);
    }
}
