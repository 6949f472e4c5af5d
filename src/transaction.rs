//! Transaction types for EmberChain

use crate::clock;
use crate::digest::digest;
use crate::error::ChainError;

/// Sentinel sender for coinbase (miner reward) transactions.
pub const SYSTEM_SENDER: &str = "SYSTEM";

/// A signed value transfer between two addresses.
///
/// The hash covers {sender, recipient, amount, fee, timestamp} only and is
/// deliberately decoupled from the signature value, so signing never changes
/// what the hash identifies.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub fee: f64,
    pub timestamp: u64,
    pub signature: String,
    pub hash: String,
}

impl Transaction {
    /// Create an unsigned transaction stamped with the logical clock.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        fee: f64,
    ) -> Self {
        let mut tx = Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            fee,
            timestamp: clock::now_millis(),
            signature: String::new(),
            hash: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Create a coinbase transaction rewarding `recipient`.
    ///
    /// Coinbase transactions carry a deterministic sentinel signature (signed
    /// with the SYSTEM secret) so validation stays uniform across all
    /// transaction kinds.
    pub fn coinbase(recipient: impl Into<String>, amount: f64) -> Self {
        let mut tx = Transaction::new(SYSTEM_SENDER, recipient, amount, 0.0);
        tx.sign(SYSTEM_SENDER);
        tx
    }

    /// Canonical encoding of the hashed fields.
    fn payload(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.sender, self.recipient, self.amount, self.fee, self.timestamp
        )
    }

    /// Digest over the five signable fields. The signature is not part of it.
    pub fn compute_hash(&self) -> String {
        digest(self.payload())
    }

    /// Pseudo-sign in place: signature = digest(payload ++ secret), then the
    /// public hash is re-derived from the signable fields.
    pub fn sign(&mut self, secret: &str) {
        self.signature = digest(format!("{}{}", self.payload(), secret));
        self.hash = self.compute_hash();
    }

    pub fn is_coinbase(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }

    /// Stateless validation with a reason on rejection. Balance coverage is
    /// the ledger's concern at admission time, not checked here.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.sender == self.recipient {
            return Err(ChainError::InvalidTransaction(
                "Sender and recipient cannot be the same".to_string(),
            ));
        }
        if !self.amount.is_finite() || !self.fee.is_finite() {
            return Err(ChainError::InvalidTransaction(
                "Amount and fee must be finite numbers".to_string(),
            ));
        }
        if self.is_coinbase() {
            if self.amount < 0.0 {
                return Err(ChainError::InvalidTransaction(
                    "Coinbase amount cannot be negative".to_string(),
                ));
            }
        } else if self.amount <= 0.0 {
            return Err(ChainError::InvalidTransaction(
                "Transfer amount must be greater than zero".to_string(),
            ));
        }
        if self.fee < 0.0 {
            return Err(ChainError::InvalidTransaction(
                "Fee cannot be negative".to_string(),
            ));
        }
        if self.signature.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "Transaction is not signed".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
