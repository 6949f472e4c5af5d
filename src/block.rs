//! Block structure, proof-of-work search, and validation

use crate::clock;
use crate::digest::{digest, merkle_root, satisfies_difficulty, DIGEST_LEN};
use crate::transaction::Transaction;

/// How often the mining loop reports progress and checks for cancellation,
/// in nonce attempts.
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Terminal result of a mining run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineOutcome {
    Mined,
    Cancelled,
}

/// A mined (or about-to-be-mined) container of transactions.
///
/// The block hash covers {index, previous_hash, timestamp, merkle_root,
/// nonce}. The difficulty a block was mined under is recorded on the block
/// itself so revalidation never depends on the ledger's current difficulty.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub merkle_root: String,
    pub difficulty: u32,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        previous_hash: String,
        difficulty: u32,
    ) -> Self {
        let mut block = Block {
            index,
            timestamp: clock::now_millis(),
            merkle_root: Self::calculate_merkle_root(&transactions),
            transactions,
            previous_hash,
            difficulty,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// The unmined genesis block: a single zero-value coinbase to the
    /// "genesis" sentinel recipient, linked to an all-zero previous hash.
    pub fn genesis(difficulty: u32) -> Self {
        Block::new(
            0,
            vec![Transaction::coinbase("genesis", 0.0)],
            "0".repeat(DIGEST_LEN),
            difficulty,
        )
    }

    pub fn compute_hash(&self) -> String {
        digest(format!(
            "{}:{}:{}:{}:{}",
            self.index, self.previous_hash, self.timestamp, self.merkle_root, self.nonce
        ))
    }

    pub fn calculate_merkle_root(transactions: &[Transaction]) -> String {
        let leaves: Vec<String> = transactions.iter().map(|tx| tx.hash.clone()).collect();
        merkle_root(&leaves)
    }

    /// Search for a nonce whose hash satisfies `difficulty`. Unbounded in the
    /// worst case (expected attempts ~ 16^difficulty); callers needing bounded
    /// latency should use [`Block::mine_with_progress`] and cancel.
    pub fn mine(&mut self, difficulty: u32) {
        let outcome = self.mine_with_progress(difficulty, PROGRESS_INTERVAL, |_, _| true);
        debug_assert_eq!(outcome, MineOutcome::Mined);
    }

    /// Mine, invoking `progress(attempts, current_hash)` every `cadence`
    /// attempts. Returning `false` from the callback cancels the search
    /// cooperatively and leaves the block unmined at its current nonce.
    pub fn mine_with_progress<F>(&mut self, difficulty: u32, cadence: u64, mut progress: F) -> MineOutcome
    where
        F: FnMut(u64, &str) -> bool,
    {
        let cadence = cadence.max(1);
        self.difficulty = difficulty;
        self.hash = self.compute_hash();

        let mut attempts: u64 = 0;
        while !satisfies_difficulty(&self.hash, difficulty) {
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.compute_hash();
            attempts += 1;
            if attempts % cadence == 0 && !progress(attempts, &self.hash) {
                return MineOutcome::Cancelled;
            }
        }
        MineOutcome::Mined
    }

    /// Structural validity: stored hash and Merkle root match recomputation,
    /// linkage to `previous` holds when given, the hash meets `difficulty`
    /// when given, and every contained transaction is valid.
    pub fn is_valid(&self, previous: Option<&Block>, difficulty: Option<u32>) -> bool {
        if self.hash != self.compute_hash() {
            return false;
        }
        if self.merkle_root != Self::calculate_merkle_root(&self.transactions) {
            return false;
        }
        if let Some(prev) = previous {
            if self.previous_hash != prev.hash {
                return false;
            }
        }
        if let Some(d) = difficulty {
            if !satisfies_difficulty(&self.hash, d) {
                return false;
            }
        }
        self.transactions.iter().all(|tx| tx.is_valid())
    }

    /// Sum of fees across all transactions.
    pub fn total_fees(&self) -> f64 {
        self.transactions.iter().map(|tx| tx.fee).sum()
    }

    /// Sum of transferred amounts, excluding coinbase rewards.
    pub fn total_amount(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .map(|tx| tx.amount)
            .sum()
    }
}
