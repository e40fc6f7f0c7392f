use std::collections::BTreeMap;

use tracing::{debug, info};

/// Who else is on the multicast group, as learned from sync replies and
/// liveness pings.
///
/// Peers are keyed by their address tag (last IPv4 octet). A node's id is
/// its rank in ascending address order among live peers, so ids stay dense
/// (`0..alive`) as nodes come and go.
#[derive(Debug, Clone)]
pub struct Swarm {
    address: u8,
    window_ms: i64,
    pinned_id: Option<u8>,
    /// Last-seen local time per peer address.
    peers: BTreeMap<u8, i64>,
    node_id: u8,
    alive: u8,
}

impl Swarm {
    pub fn new(address: u8, window_ms: i64, pinned_id: Option<u8>) -> Self {
        Self {
            address,
            window_ms,
            pinned_id,
            peers: BTreeMap::new(),
            node_id: pinned_id.unwrap_or(0),
            alive: 0,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Number of nodes seen within the liveness window.
    pub fn alive(&self) -> u8 {
        self.alive
    }

    pub fn record_sync_response(&mut self, client: i64, address: u8, token: i64, now: i64) {
        debug!(client, address, token, "sync response");
        self.peers.insert(address, now);
        self.recount(now);
    }

    /// Forget peers that have not been heard from within the window.
    pub fn expire(&mut self, now: i64) {
        self.recount(now);
    }

    fn recount(&mut self, now: i64) {
        let window = self.window_ms;
        self.peers.retain(|_, &mut last_seen| now - last_seen <= window);
        self.alive = u8::try_from(self.peers.len()).unwrap_or(u8::MAX);

        let ranked = self.peers.keys().position(|&a| a == self.address);
        let id = match (self.pinned_id, ranked) {
            (Some(pinned), _) => pinned,
            (None, Some(rank)) => u8::try_from(rank).unwrap_or(u8::MAX),
            (None, None) => self.node_id,
        };

        if id != self.node_id {
            info!(old = self.node_id, new = id, alive = self.alive, "node id changed");
            self.node_id = id;
        }
    }
}
