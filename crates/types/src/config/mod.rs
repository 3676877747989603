// Path: crates/types/src/config/mod.rs

//! Configuration structures for the Weft validator node.
use crate::app::ChainInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Epoch sealing parameters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EpochConfig {
    /// Number of blocks per epoch. Zero disables sealing.
    #[serde(default = "default_blocks_per_epoch")]
    pub blocks_per_epoch: u64,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            blocks_per_epoch: default_blocks_per_epoch(),
        }
    }
}

/// Notification fan-out parameters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Buffer size of each broadcast channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Parameters handed to the transaction executor for every transaction.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ExecutionConfig {
    /// The lowest gas price accepted, in base units.
    #[serde(default)]
    pub min_gas_price: u64,
    /// Strict mode turns inapplicable transactions into errors instead of skips.
    /// Block application always runs non-strict; the flag is not read from files.
    #[serde(skip)]
    pub strict: bool,
}

/// Top-level configuration of a validator node, loaded from TOML.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    /// The node's own genesis descriptor. Consensus must deliver an identical one.
    pub chain: ChainInfo,
    /// Directory holding the node database.
    pub data_dir: PathBuf,
    /// Whether every commit is written through to disk.
    #[serde(default = "default_true")]
    pub flush_to_disk: bool,
    /// Epoch sealing.
    #[serde(default)]
    pub epoch: EpochConfig,
    /// Notification fan-out.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Executor parameters.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// How many committed blocks are kept in memory for queries.
    #[serde(default = "default_recent_blocks")]
    pub recent_blocks: usize,
    /// Listen address for the metrics and health endpoints. Disabled when absent.
    #[serde(default)]
    pub telemetry_addr: Option<String>,
}

impl NodeConfig {
    /// Validates the configuration for logical consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.chain.block_gas_limit == 0 {
            return Err("Configuration Error: 'chain.block_gas_limit' must be greater than 0.".to_string());
        }
        if self.chain.validators.is_empty() {
            return Err("Configuration Error: 'chain.validators' must not be empty.".to_string());
        }
        if self.chain.validators.iter().any(|v| v.weight == 0) {
            return Err("Configuration Error: genesis validators must have non-zero weight.".to_string());
        }
        if self.notifications.channel_capacity == 0 {
            return Err(
                "Configuration Error: 'notifications.channel_capacity' must be greater than 0."
                    .to_string(),
            );
        }
        if self.recent_blocks == 0 {
            return Err("Configuration Error: 'recent_blocks' must be greater than 0.".to_string());
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_blocks_per_epoch() -> u64 {
    100
}
fn default_channel_capacity() -> usize {
    1024
}
fn default_recent_blocks() -> usize {
    100
}
