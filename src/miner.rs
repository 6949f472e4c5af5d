//! Background mining coordinator
//!
//! At most one mining run may be active process-wide. The coordinator clones
//! a candidate block under a read lock, hashes on a dedicated thread without
//! holding any lock, and commits under a write lock only once a satisfying
//! nonce is found. Progress is published as a mutex-guarded snapshot that
//! status queries poll; a stop request flips an atomic flag the mining loop
//! observes at its progress cadence.

use crate::block::{MineOutcome, PROGRESS_INTERVAL};
use crate::error::ChainError;
use crate::ledger::Ledger;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Lifecycle of the most recent mining run.
#[derive(Debug, Clone, PartialEq)]
pub enum MiningState {
    Idle,
    Running,
    Completed {
        block_index: u64,
        block_hash: String,
        reward: f64,
    },
    Cancelled,
    Failed(String),
}

/// Pollable snapshot of the current (or last) mining run.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningStatus {
    pub state: MiningState,
    pub miner: String,
    pub attempts: u64,
    pub current_hash: String,
    pub started_at_ms: u64,
}

impl Default for MiningStatus {
    fn default() -> Self {
        MiningStatus {
            state: MiningState::Idle,
            miner: String::new(),
            attempts: 0,
            current_hash: String::new(),
            started_at_ms: 0,
        }
    }
}

struct Shared {
    active: AtomicBool,
    cancel: AtomicBool,
    status: Mutex<MiningStatus>,
}

pub struct MiningCoordinator {
    ledger: Arc<RwLock<Ledger>>,
    shared: Arc<Shared>,
    progress_interval: u64,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MiningCoordinator {
    pub fn new(ledger: Arc<RwLock<Ledger>>) -> Self {
        Self::with_progress_interval(ledger, PROGRESS_INTERVAL)
    }

    pub fn with_progress_interval(ledger: Arc<RwLock<Ledger>>, progress_interval: u64) -> Self {
        MiningCoordinator {
            ledger,
            shared: Arc::new(Shared {
                active: AtomicBool::new(false),
                cancel: AtomicBool::new(false),
                status: Mutex::new(MiningStatus::default()),
            }),
            progress_interval: progress_interval.max(1),
            worker: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> Arc<RwLock<Ledger>> {
        Arc::clone(&self.ledger)
    }

    /// Start a background mining run for `miner`.
    ///
    /// Rejected before any work begins when a run is already active or the
    /// pending pool is empty; neither condition queues work.
    pub fn start(&self, miner: &str) -> Result<(), ChainError> {
        if self
            .shared
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChainError::MiningInProgress);
        }

        let (mut candidate, difficulty) = {
            let ledger = self.ledger.read();
            if ledger.pending.is_empty() {
                self.shared.active.store(false, Ordering::SeqCst);
                return Err(ChainError::NothingToMine);
            }
            (ledger.assemble_candidate(miner), ledger.difficulty)
        };

        self.shared.cancel.store(false, Ordering::SeqCst);
        *self.shared.status.lock() = MiningStatus {
            state: MiningState::Running,
            miner: miner.to_string(),
            attempts: 0,
            current_hash: candidate.hash.clone(),
            started_at_ms: crate::clock::now_millis(),
        };
        log::info!("mining run started for {} at difficulty {}", miner, difficulty);

        let ledger = Arc::clone(&self.ledger);
        let shared = Arc::clone(&self.shared);
        let cadence = self.progress_interval;
        let handle = std::thread::spawn(move || {
            let outcome = candidate.mine_with_progress(difficulty, cadence, |attempts, hash| {
                {
                    let mut status = shared.status.lock();
                    status.attempts = attempts;
                    status.current_hash = hash.to_string();
                }
                !shared.cancel.load(Ordering::SeqCst)
            });

            let terminal = match outcome {
                MineOutcome::Cancelled => {
                    log::info!("mining run cancelled after {} attempts", candidate.nonce);
                    MiningState::Cancelled
                }
                MineOutcome::Mined => {
                    let reward = candidate
                        .transactions
                        .first()
                        .map(|tx| tx.amount)
                        .unwrap_or(0.0);
                    let mut ledger = ledger.write();
                    match ledger.commit_block(candidate) {
                        Ok(block) => MiningState::Completed {
                            block_index: block.index,
                            block_hash: block.hash.clone(),
                            reward,
                        },
                        Err(err) => MiningState::Failed(err.to_string()),
                    }
                }
            };

            shared.status.lock().state = terminal;
            shared.active.store(false, Ordering::SeqCst);
        });
        *self.worker.lock() = Some(handle);

        Ok(())
    }

    /// Request cooperative cancellation of the active run. Takes effect the
    /// next time the mining loop reaches its progress cadence.
    pub fn stop(&self) {
        self.cancel();
    }

    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_mining(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Snapshot of the current (or last) run's status.
    pub fn status(&self) -> MiningStatus {
        self.shared.status.lock().clone()
    }

    /// Block until the active run (if any) reaches a terminal state.
    pub fn wait(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}
