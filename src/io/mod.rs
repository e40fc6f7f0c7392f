// Purpose - hardware output for rendered blocks

pub mod cpal_sink;

pub use cpal_sink::CpalSink;
