//! The audio-render unit: slot pool, block loop and output sinks.

pub mod inbox;
pub mod mixer;
pub mod queue;
pub mod sink;

pub use inbox::{EventReceiver, NoInbox};
pub use mixer::{blocks_for, BlockReport, Engine};
pub use queue::{EventQueue, QueueFull, Scheduled, Status};
pub use sink::{CaptureSink, NullSink, OutputSink};
