//! EmberChain - a single-node proof-of-work ledger simulator
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Engine
//! - [`ledger`] - Chain ownership, pending pool, admission, queries
//! - [`block`] - Block structure, mining loop, validation
//! - [`transaction`] - Transaction value object and pseudo-signatures
//!
//! ## Hashing
//! - [`digest`] - SHA-256 digests, Merkle reduction, difficulty predicate
//!
//! ## Mining
//! - [`miner`] - Background mining coordinator (one run process-wide)
//!
//! ## State Export
//! - [`snapshot`] - Versioned structural export / import
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`clock`] - Monotonic logical clock
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Engine
// ============================================================================
pub mod block;
pub mod ledger;
pub mod transaction;

// ============================================================================
// Hashing
// ============================================================================
pub mod digest;

// ============================================================================
// Mining
// ============================================================================
pub mod miner;

// ============================================================================
// State Export
// ============================================================================
pub mod snapshot;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod clock;
pub mod config;
pub mod error;
