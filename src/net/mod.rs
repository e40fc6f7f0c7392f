//! The network-ingest unit and its multicast socket.

pub mod ingest;
pub mod transport;

pub use ingest::{Ingest, Outcome};
pub use transport::MulticastTransport;
