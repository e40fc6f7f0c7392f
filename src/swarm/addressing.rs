//! Per-node delivery decision for the `c` destination field.
//!
//! - no destination: every node plays it
//! - `0..=255`: one node. The id is first folded into the current swarm
//!   size (`d % alive`) so controllers can address "node 13" in a swarm of
//!   ten and still hit someone.
//! - `> 255`: a group of every `(d - 255)`-th node, i.e. nodes whose id is
//!   a multiple of the group size.

/// Highest destination that addresses a single node.
pub const MAX_NODE_ID: u32 = 255;

pub fn delivers(destination: Option<u32>, node_id: u8, alive: u8) -> bool {
    let Some(destination) = destination else {
        return true;
    };

    if destination <= MAX_NODE_ID {
        // alive can drop to zero while membership is being rebuilt
        let folded = if alive > 0 {
            destination % u32::from(alive)
        } else {
            destination
        };
        return folded == u32::from(node_id);
    }

    let group = destination - MAX_NODE_ID;
    u32::from(node_id) % group == 0
}
