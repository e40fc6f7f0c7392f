//! Errors for the setup paths of a node.
//!
//! The ingest and render loops never fail: dropped events, underruns and
//! malformed datagrams are reported as values. Only loading configuration,
//! opening sockets and opening the audio device can return an [`Error`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a configuration file
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        /// Path of the file that could not be read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Socket creation, bind, or multicast membership failed.
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("no audio output device available")]
    NoDevice,

    /// Output device or stream setup failed.
    #[error("audio stream error: {0}")]
    Audio(String),
}

pub type Result<T> = std::result::Result<T, Error>;
