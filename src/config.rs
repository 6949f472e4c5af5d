//! Configuration management for EmberChain

use crate::error::ChainError;
use crate::ledger::{
    DEFAULT_DIFFICULTY, DEFAULT_MAX_TRANSACTIONS_PER_BLOCK, DEFAULT_MINING_REWARD,
    DEFAULT_TARGET_BLOCK_INTERVAL_MS,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub mining: MiningConfig,
}

#[derive(Debug, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_mining_reward")]
    pub mining_reward: f64,
    #[serde(default = "default_max_transactions_per_block")]
    pub max_transactions_per_block: usize,
    #[serde(default = "default_target_block_interval_ms")]
    pub target_block_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct MiningConfig {
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
            max_transactions_per_block: default_max_transactions_per_block(),
            target_block_interval_ms: default_target_block_interval_ms(),
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            mining: MiningConfig::default(),
        }
    }
}

/// Load configuration from a TOML file; an absent file yields defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    // Validate critical values
    if config.ledger.difficulty == 0 {
        return Err(ChainError::ConfigError(
            "ledger.difficulty must be at least 1".to_string(),
        ));
    }
    if config.ledger.max_transactions_per_block == 0 {
        return Err(ChainError::ConfigError(
            "ledger.max_transactions_per_block must be at least 1".to_string(),
        ));
    }
    if !config.ledger.mining_reward.is_finite() || config.ledger.mining_reward < 0.0 {
        return Err(ChainError::ConfigError(
            "ledger.mining_reward must be a non-negative number".to_string(),
        ));
    }

    Ok(config)
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_mining_reward() -> f64 {
    DEFAULT_MINING_REWARD
}

fn default_max_transactions_per_block() -> usize {
    DEFAULT_MAX_TRANSACTIONS_PER_BLOCK
}

fn default_target_block_interval_ms() -> u64 {
    DEFAULT_TARGET_BLOCK_INTERVAL_MS
}

fn default_progress_interval() -> u64 {
    crate::block::PROGRESS_INTERVAL
}
