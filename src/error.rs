//! Error types for EmberChain

use std::fmt;

#[derive(Debug, Clone)]
pub enum ChainError {
    InvalidTransaction(String),
    InsufficientFunds { required: f64, available: f64 },
    DuplicateTransaction(String),
    InvalidBlock(String),
    InvalidProofOfWork,
    InvalidMerkleRoot,
    InvalidBlockLinkage,
    MiningInProgress,
    NothingToMine,
    InvalidSnapshot(String),
    ConfigError(String),
    IoError(String),
    SerializationError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            ChainError::InsufficientFunds { required, available } => write!(
                f,
                "Insufficient funds: required {}, available {}",
                required, available
            ),
            ChainError::DuplicateTransaction(hash) => {
                write!(f, "Duplicate transaction already pending: {}", hash)
            }
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            ChainError::InvalidProofOfWork => write!(f, "Invalid proof of work"),
            ChainError::InvalidMerkleRoot => write!(f, "Invalid Merkle root"),
            ChainError::InvalidBlockLinkage => write!(f, "Invalid block linkage"),
            ChainError::MiningInProgress => write!(f, "A mining run is already in progress"),
            ChainError::NothingToMine => write!(f, "No pending transactions to mine"),
            ChainError::InvalidSnapshot(msg) => write!(f, "Invalid snapshot: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
            ChainError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
