//! Swarm coordination: shared time base, addressing and membership.
//!
//! All of this state lives on the network-ingest thread. The audio thread
//! only ever sees fire times that were already translated here.

pub mod addressing;
pub mod clock;
pub mod membership;

pub use addressing::delivers;
pub use clock::ClockSync;
pub use membership::Swarm;
