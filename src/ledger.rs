//! The ledger engine: chain ownership, pending pool, admission, mining,
//! queries, and whole-chain validation.
//!
//! One `Ledger` is authoritative per simulation. All mutation goes through
//! its methods; concurrent access is arranged by the caller (the mining
//! coordinator wraps it in a read/write lock).

use crate::block::Block;
use crate::error::ChainError;
use crate::transaction::Transaction;
use log::{debug, info};

pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const DEFAULT_MINING_REWARD: f64 = 10.0;
pub const DEFAULT_MAX_TRANSACTIONS_PER_BLOCK: usize = 10;
/// Target interval between blocks, driving [`Ledger::adjust_difficulty`].
pub const DEFAULT_TARGET_BLOCK_INTERVAL_MS: u64 = 30_000;

/// Where a transaction was found by [`Ledger::find_transaction`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionLookup {
    /// Still in the pending pool, zero confirmations.
    Pending(Transaction),
    /// Mined; confirmation depth = chain length - containing block index.
    Confirmed {
        transaction: Transaction,
        block_index: u64,
        confirmations: u64,
    },
}

/// Aggregate statistics over the chain and pool.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LedgerStats {
    pub total_blocks: usize,
    pub total_transactions: usize,
    pub pending_transactions: usize,
    pub difficulty: u32,
    pub mining_reward: f64,
    pub average_block_time_ms: f64,
    pub is_valid: bool,
}

pub struct Ledger {
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
    pub difficulty: u32,
    pub mining_reward: f64,
    pub max_transactions_per_block: usize,
    pub target_block_interval_ms: u64,
}

impl Ledger {
    /// Create a ledger with a freshly mined genesis block.
    pub fn new(difficulty: u32, mining_reward: f64, max_transactions_per_block: usize) -> Self {
        let difficulty = difficulty.max(1);
        let mut genesis = Block::genesis(difficulty);
        genesis.mine(difficulty);
        info!("genesis block mined: {}", genesis.hash);

        Ledger {
            chain: vec![genesis],
            pending: Vec::new(),
            difficulty,
            mining_reward: mining_reward.max(0.0),
            max_transactions_per_block: max_transactions_per_block.max(1),
            target_block_interval_ms: DEFAULT_TARGET_BLOCK_INTERVAL_MS,
        }
    }

    pub fn tip(&self) -> &Block {
        // The chain is never empty: genesis is mined at construction and
        // blocks are only ever appended.
        self.chain.last().expect("chain always holds genesis")
    }

    /// Admit a transaction into the pending pool.
    ///
    /// Rejections are recoverable errors: validation failure, insufficient
    /// derived balance (required vs available surfaced), or a duplicate hash
    /// already pending. The duplicate guard is pool-scoped only; a mined
    /// transaction's hash is not checked chain-wide.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<String, ChainError> {
        tx.validate()?;

        if !tx.is_coinbase() {
            let required = tx.amount + tx.fee;
            let available = self.balance(&tx.sender);
            if available < required {
                return Err(ChainError::InsufficientFunds { required, available });
            }
        }

        if self.pending.iter().any(|pending| pending.hash == tx.hash) {
            return Err(ChainError::DuplicateTransaction(tx.hash));
        }

        debug!("admitted transaction {} ({} -> {})", tx.hash, tx.sender, tx.recipient);
        let hash = tx.hash.clone();
        self.pending.push(tx);
        Ok(hash)
    }

    /// Assemble an unmined candidate block for `miner`: up to
    /// `max_transactions_per_block` transactions from the front of the pool
    /// (FIFO, no fee reordering), preceded by a coinbase worth the mining
    /// reward plus the collected fees.
    pub fn assemble_candidate(&self, miner: &str) -> Block {
        let selected: Vec<Transaction> = self
            .pending
            .iter()
            .take(self.max_transactions_per_block)
            .cloned()
            .collect();
        let fees: f64 = selected.iter().map(|tx| tx.fee).sum();

        let mut transactions = Vec::with_capacity(selected.len() + 1);
        transactions.push(Transaction::coinbase(miner, self.mining_reward + fees));
        transactions.extend(selected);

        let tip = self.tip();
        Block::new(tip.index + 1, transactions, tip.hash.clone(), self.difficulty)
    }

    /// Append a mined block to the chain and drop its transactions from the
    /// pending pool. The block must extend the current tip and carry a hash
    /// that matches its contents and recorded difficulty.
    pub fn commit_block(&mut self, block: Block) -> Result<&Block, ChainError> {
        let tip = self.tip();
        if block.index != tip.index + 1 {
            return Err(ChainError::InvalidBlock(format!(
                "Invalid block index. Expected {}, but got {}.",
                tip.index + 1,
                block.index
            )));
        }
        if block.previous_hash != tip.hash {
            return Err(ChainError::InvalidBlockLinkage);
        }
        // The recorded difficulty is self-declared and not covered by the
        // block hash, so an under-declared value must never reach the chain:
        // the block has to carry at least the difficulty currently in force.
        if block.difficulty < self.difficulty {
            return Err(ChainError::InvalidBlock(format!(
                "Block declares difficulty {} below the required {}",
                block.difficulty, self.difficulty
            )));
        }
        if block.merkle_root != Block::calculate_merkle_root(&block.transactions) {
            return Err(ChainError::InvalidMerkleRoot);
        }
        if !block.is_valid(Some(tip), Some(block.difficulty)) {
            return Err(ChainError::InvalidProofOfWork);
        }

        self.pending
            .retain(|pending| !block.transactions.iter().any(|tx| tx.hash == pending.hash));
        info!(
            "block {} committed: {} ({} transactions)",
            block.index,
            block.hash,
            block.transactions.len()
        );
        self.chain.push(block);
        Ok(self.tip())
    }

    /// Synchronous convenience: assemble, mine at the current difficulty, and
    /// commit. The background path goes through the mining coordinator.
    pub fn mine_block(&mut self, miner: &str) -> Result<Block, ChainError> {
        let mut block = self.assemble_candidate(miner);
        block.mine(self.difficulty);
        self.commit_block(block).map(Block::clone)
    }

    /// Derive an address balance by full replay of the chain. Pending
    /// transactions do not count until mined.
    pub fn balance(&self, address: &str) -> f64 {
        let mut balance = 0.0;
        for block in &self.chain {
            for tx in &block.transactions {
                if tx.recipient == address {
                    balance += tx.amount;
                }
                if tx.sender == address {
                    balance -= tx.amount + tx.fee;
                }
            }
        }
        balance
    }

    /// All mined transactions touching `address`, in chain order.
    pub fn history(&self, address: &str) -> Vec<Transaction> {
        self.chain
            .iter()
            .flat_map(|block| block.transactions.iter())
            .filter(|tx| tx.sender == address || tx.recipient == address)
            .cloned()
            .collect()
    }

    /// Locate a transaction by hash: the pending pool is searched first,
    /// then the chain, reporting confirmation depth for mined transactions.
    pub fn find_transaction(&self, hash: &str) -> Option<TransactionLookup> {
        if let Some(tx) = self.pending.iter().find(|tx| tx.hash == hash) {
            return Some(TransactionLookup::Pending(tx.clone()));
        }
        for block in &self.chain {
            if let Some(tx) = block.transactions.iter().find(|tx| tx.hash == hash) {
                return Some(TransactionLookup::Confirmed {
                    transaction: tx.clone(),
                    block_index: block.index,
                    confirmations: self.chain.len() as u64 - block.index,
                });
            }
        }
        None
    }

    pub fn block_by_index(&self, index: u64) -> Option<&Block> {
        self.chain.iter().find(|block| block.index == index)
    }

    pub fn block_by_hash(&self, hash: &str) -> Option<&Block> {
        self.chain.iter().find(|block| block.hash == hash)
    }

    /// Validate the whole chain: every non-genesis block must be internally
    /// consistent, linked to its predecessor, and satisfy the difficulty
    /// recorded on the block itself at mining time.
    pub fn is_chain_valid(&self) -> bool {
        self.chain.windows(2).all(|pair| {
            let (prev, block) = (&pair[0], &pair[1]);
            block.is_valid(Some(prev), Some(block.difficulty)) && block.previous_hash == prev.hash
        })
    }

    /// Last-interval-only retargeting: compare the delta between the two most
    /// recent blocks against the target interval. Under half the target raises
    /// difficulty by one; over double lowers it, floored at 1.
    pub fn adjust_difficulty(&mut self) {
        if self.chain.len() < 2 {
            return;
        }
        let last = &self.chain[self.chain.len() - 1];
        let prev = &self.chain[self.chain.len() - 2];
        let delta = last.timestamp.saturating_sub(prev.timestamp);

        if delta < self.target_block_interval_ms / 2 {
            self.difficulty += 1;
            info!("difficulty raised to {} (last interval {} ms)", self.difficulty, delta);
        } else if delta > self.target_block_interval_ms * 2 && self.difficulty > 1 {
            self.difficulty -= 1;
            info!("difficulty lowered to {} (last interval {} ms)", self.difficulty, delta);
        }
    }

    pub fn stats(&self) -> LedgerStats {
        let deltas: Vec<u64> = self
            .chain
            .windows(2)
            .map(|pair| pair[1].timestamp.saturating_sub(pair[0].timestamp))
            .collect();
        let average_block_time_ms = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().sum::<u64>() as f64 / deltas.len() as f64
        };

        LedgerStats {
            total_blocks: self.chain.len(),
            total_transactions: self.chain.iter().map(|b| b.transactions.len()).sum(),
            pending_transactions: self.pending.len(),
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            average_block_time_ms,
            is_valid: self.is_chain_valid(),
        }
    }
}
