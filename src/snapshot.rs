//! Versioned structural export / import of a ledger
//!
//! A snapshot is a plain serde schema sufficient to rebuild an equivalent
//! ledger. It is an exchange format, not a durability mechanism: import
//! validates fields and shape, while full chain integrity stays with
//! [`Ledger::is_chain_valid`] so callers decide how much to trust foreign
//! data.

use crate::block::Block;
use crate::error::ChainError;
use crate::ledger::Ledger;
use crate::transaction::Transaction;
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
    pub difficulty: u32,
    pub mining_reward: f64,
    pub max_transactions_per_block: usize,
    pub target_block_interval_ms: u64,
}

impl LedgerSnapshot {
    /// Field-level validation of the snapshot shape and parameters.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ChainError::InvalidSnapshot(format!(
                "Unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.chain.is_empty() {
            return Err(ChainError::InvalidSnapshot(
                "Snapshot chain is empty; a genesis block is required".to_string(),
            ));
        }
        if self.chain[0].index != 0 {
            return Err(ChainError::InvalidSnapshot(
                "First snapshot block is not a genesis block".to_string(),
            ));
        }
        if self.difficulty == 0 {
            return Err(ChainError::InvalidSnapshot(
                "Difficulty must be at least 1".to_string(),
            ));
        }
        if let Some(block) = self.chain.iter().find(|block| block.difficulty == 0) {
            return Err(ChainError::InvalidSnapshot(format!(
                "Block {} records a zero mining difficulty",
                block.index
            )));
        }
        if self.max_transactions_per_block == 0 {
            return Err(ChainError::InvalidSnapshot(
                "Max transactions per block must be at least 1".to_string(),
            ));
        }
        if !self.mining_reward.is_finite() || self.mining_reward < 0.0 {
            return Err(ChainError::InvalidSnapshot(
                "Mining reward must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ChainError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ChainError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

impl Ledger {
    pub fn export(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: SNAPSHOT_VERSION,
            chain: self.chain.clone(),
            pending: self.pending.clone(),
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            max_transactions_per_block: self.max_transactions_per_block,
            target_block_interval_ms: self.target_block_interval_ms,
        }
    }

    /// Rebuild a ledger from a snapshot after field-level validation.
    pub fn import(snapshot: LedgerSnapshot) -> Result<Ledger, ChainError> {
        snapshot.validate()?;
        Ok(Ledger {
            chain: snapshot.chain,
            pending: snapshot.pending,
            difficulty: snapshot.difficulty,
            mining_reward: snapshot.mining_reward,
            max_transactions_per_block: snapshot.max_transactions_per_block,
            target_block_interval_ms: snapshot.target_block_interval_ms,
        })
    }
}
