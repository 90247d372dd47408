//! Engine configuration.
//!
//! Tuning knobs for index fan-out and buffer fidelity, designed to be
//! easily serializable and loadable from JSON while keeping complexity
//! minimal.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// # Example
///
/// ```rust
/// use veld::Config;
///
/// // Create default config
/// let config = Config::default();
/// assert_eq!(config.node_capacity, 16);
///
/// // Load from JSON
/// let json = r#"{
///     "node_capacity": 8,
///     "buffer_segments": 64
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.buffer_segments, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of children per index node (default: 16).
    /// Higher values mean shallower trees but coarser pruning.
    #[serde(default = "Config::default_node_capacity")]
    pub node_capacity: usize,

    /// Number of segments used to approximate a full circle when
    /// buffering (default: 32). Higher values mean rounder buffers
    /// but more vertices downstream.
    #[serde(default = "Config::default_buffer_segments")]
    pub buffer_segments: usize,
}

impl Config {
    const fn default_node_capacity() -> usize {
        16
    }

    const fn default_buffer_segments() -> usize {
        32
    }

    pub fn with_node_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity >= 2, "Node capacity must be at least 2");
        self.node_capacity = capacity;
        self
    }

    pub fn with_buffer_segments(mut self, segments: usize) -> Self {
        assert!(segments >= 8, "Buffer segments must be at least 8");
        self.buffer_segments = segments;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.node_capacity < 2 {
            return Err("Node capacity must be at least 2".to_string());
        }
        if self.buffer_segments < 8 {
            return Err("Buffer segments must be at least 8".to_string());
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_capacity: Self::default_node_capacity(),
            buffer_segments: Self::default_buffer_segments(),
        }
    }
}
