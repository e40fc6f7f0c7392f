//! End-to-end scenario benchmarks.
//!
//! These model what a node does per datagram and per block.

mod ingest;
mod render;

pub use ingest::bench_ingest;
pub use render::bench_render;
