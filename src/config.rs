//! Node configuration.
//!
//! Every field has a default matching the wire protocol's fixed constants,
//! so an empty file (or none at all) gives a node that interoperates with
//! an existing swarm. Example:
//!
//! ```toml
//! [node]
//! address = 17
//!
//! [network]
//! group = "232.10.11.12"
//! port = 3333
//!
//! [timing]
//! latency_ms = 1000
//!
//! [audio]
//! voices = 10
//! ```

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::UNKNOWN_VOICE;
use crate::{
    BLOCK_SIZE, EVENT_QUEUE_LEN, LATENCY_MS, MAX_DATAGRAM_LEN, MAX_DRIFT_MS, PING_INTERVAL_MS,
    SAMPLE_RATE, VOICES,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub network: NetworkSection,
    pub timing: TimingSection,
    pub audio: AudioSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeSection {
    /// Address this node reports in sync replies (`r`). Usually the last
    /// octet of the node's IP.
    pub address: u8,
    /// Fixed node id. When unset the id is this node's rank among live
    /// swarm members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u8>,
    /// Play the rising/falling chime on start and stop.
    pub chimes: bool,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            address: 0,
            id: None,
            chimes: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkSection {
    pub group: Ipv4Addr,
    pub port: u16,
    /// Local interface to join the group on.
    pub interface: Ipv4Addr,
    pub ttl: u32,
    /// Receive timeout; bounds how long the ingest loop takes to notice a
    /// stop request.
    pub recv_timeout_ms: u64,
    pub max_datagram: usize,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(232, 10, 11, 12),
            port: 3333,
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            recv_timeout_ms: 100,
            max_datagram: MAX_DATAGRAM_LEN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingSection {
    pub latency_ms: i64,
    pub max_drift_ms: i64,
    pub ping_interval_ms: i64,
}

impl TimingSection {
    /// Peers unheard for longer than this stop counting as alive.
    pub fn liveness_window_ms(&self) -> i64 {
        self.ping_interval_ms * 2
    }
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            latency_ms: LATENCY_MS,
            max_drift_ms: MAX_DRIFT_MS,
            ping_interval_ms: PING_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSection {
    pub sample_rate: u32,
    pub block_size: usize,
    pub voices: usize,
    pub queue_len: usize,
    /// Longest a block write may wait for room in the device buffer.
    pub write_timeout_ms: u64,
    /// Output device name; the host default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK_SIZE,
            voices: VOICES,
            queue_len: EVENT_QUEUE_LEN,
            write_timeout_ms: 50,
            device: None,
        }
    }
}

impl NodeConfig {
    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        let checks = [
            (audio.sample_rate == 0, "audio.sample_rate must be non-zero"),
            (audio.block_size == 0, "audio.block_size must be non-zero"),
            (audio.voices == 0, "audio.voices must be non-zero"),
            (
                audio.voices > usize::from(UNKNOWN_VOICE),
                "audio.voices must be at most 255",
            ),
            (audio.queue_len == 0, "audio.queue_len must be non-zero"),
            (
                self.timing.ping_interval_ms <= 0,
                "timing.ping_interval_ms must be positive",
            ),
            (self.timing.latency_ms < 0, "timing.latency_ms must not be negative"),
            (self.timing.max_drift_ms < 0, "timing.max_drift_ms must not be negative"),
            (self.network.max_datagram == 0, "network.max_datagram must be non-zero"),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, reason)) => Err(Error::InvalidConfig((*reason).to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_protocol_defaults() {
        let config = NodeConfig::from_toml("").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.audio.block_size, 256);
        assert_eq!(config.audio.voices, 10);
        assert_eq!(config.audio.queue_len, 400);
        assert_eq!(config.network.port, 3333);
        assert_eq!(config.timing.liveness_window_ms(), 20_000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = NodeConfig::from_toml(
            r#"
            [node]
            address = 42
            id = 3

            [timing]
            latency_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.node.address, 42);
        assert_eq!(config.node.id, Some(3));
        assert!(config.node.chimes);
        assert_eq!(config.timing.latency_ms, 250);
        assert_eq!(config.timing.max_drift_ms, 20_000);
    }

    #[test]
    fn rejects_zero_voices() {
        let err = NodeConfig::from_toml("[audio]\nvoices = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn voice_count_leaves_the_unknown_index_free() {
        assert!(NodeConfig::from_toml("[audio]\nvoices = 255\n").is_ok());
        let err = NodeConfig::from_toml("[audio]\nvoices = 256\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn rejects_bad_toml() {
        let err = NodeConfig::from_toml("[audio\n").unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = NodeConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn survives_toml_round_trip() {
        let mut config = NodeConfig::default();
        config.node.id = Some(7);
        config.audio.device = Some("default".into());
        let text = config.to_toml().unwrap();
        assert_eq!(NodeConfig::from_toml(&text).unwrap(), config);
    }
}
