//! Local millisecond time bases.
//!
//! Every timestamp inside a node is "milliseconds since this node booted".
//! Network timestamps are translated onto this base by
//! [`ClockSync`](crate::swarm::ClockSync) before anything is scheduled.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};
use std::time::Instant;

pub trait TimeSource {
    fn now_ms(&self) -> i64;
}

/// Wall time since construction. Clones share the same origin.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

/// Hand-advanced clock for tests and offline rendering.
///
/// Clones share the same counter, so a test can keep one handle and move
/// another into an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(start_ms)))
    }

    pub fn set(&self, ms: i64) {
        self.0.store(ms, Ordering::Release);
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::AcqRel);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }
}
