//! Core of a multicast-controlled synthesizer node.
//!
//! Many nodes listen on one multicast group. Each datagram is a compact
//! tag-letter message (see [`protocol`]) that is decoded, checked against
//! this node's swarm address, translated onto the local clock and handed to
//! the audio thread, which applies it to persistent voice state when its
//! fire time arrives and renders fixed-size blocks to an output sink.
//!
//! ```text
//!   datagram ─→ codec ─→ sync / membership ─→ clock ─→ addressing ─┐
//!                                  (network-ingest thread)          │ rtrb
//!   sink ←─ quantize/filter ←─ renderers ←─ envelopes ←─ queue ←────┘
//!                                  (audio-render thread)
//! ```

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod io;
pub mod net;
pub mod protocol;
pub mod swarm;
pub mod synth;
pub mod time;

pub use config::NodeConfig;
pub use engine::{Engine, EventQueue, OutputSink, Scheduled};
pub use error::{Error, Result};
pub use net::{Ingest, Outcome};
pub use protocol::{decode, encode, Event, Message, ModTargets, Wave};
pub use swarm::{delivers, ClockSync, Swarm};
pub use synth::{GlobalState, Sequencer, VoiceState};
pub use time::{ManualClock, MonotonicClock, TimeSource};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub const SAMPLE_RATE: u32 = 44_100;
pub const BLOCK_SIZE: usize = 256;
pub const VOICES: usize = 10;
pub const EVENT_QUEUE_LEN: usize = 400;

/// Added to every translated fire time so the whole swarm plays together.
pub const LATENCY_MS: i64 = 1_000;
/// How far past `now + LATENCY_MS` a translated time may land before the
/// clock delta is considered stale.
pub const MAX_DRIFT_MS: i64 = 20_000;
pub const PING_INTERVAL_MS: i64 = 10_000;
pub const MAX_DATAGRAM_LEN: usize = 512;

/// Outer run/stop flag shared by the ingest and render loops.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}
