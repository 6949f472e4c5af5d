#![forbid(unsafe_code)]
//! EmberChain CLI - a thin client driving the ledger engine through a
//! JSON snapshot file.

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::Table;
use emberchain::config::load_config;
use emberchain::error::ChainError;
use emberchain::ledger::{Ledger, TransactionLookup};
use emberchain::miner::{MiningCoordinator, MiningState};
use emberchain::snapshot::LedgerSnapshot;
use emberchain::transaction::Transaction;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ember", about = "Single-node proof-of-work ledger simulator")]
struct Cli {
    /// Path of the ledger snapshot file
    #[arg(long, default_value = "ember.json", global = true)]
    state: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a fresh ledger (mines the genesis block)
    Init {
        /// Optional TOML config file for ledger parameters
        #[arg(long, default_value = "ember.toml")]
        config: String,
        #[arg(long)]
        difficulty: Option<u32>,
        #[arg(long)]
        reward: Option<f64>,
        #[arg(long)]
        max_txs: Option<usize>,
    },
    /// Submit a transaction to the pending pool
    Submit {
        from: String,
        to: String,
        amount: f64,
        #[arg(long, default_value_t = 0.0)]
        fee: f64,
        /// Signing secret for the pseudo-signature
        #[arg(long, default_value = "secret")]
        secret: String,
    },
    /// Mine the pending pool into a new block
    Mine {
        /// Address credited with the mining reward
        miner: String,
    },
    /// Show the balance of an address
    Balance { address: String },
    /// Show all mined transactions touching an address
    History { address: String },
    /// Look up a transaction by its hash
    Lookup { hash: String },
    /// Show aggregate chain statistics
    Stats,
    /// Retarget difficulty from the last block interval
    Retarget,
    /// Revalidate the whole chain
    Validate,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ChainError> {
    match cli.command {
        Command::Init {
            config,
            difficulty,
            reward,
            max_txs,
        } => {
            let defaults = load_config(&config)?;
            let ledger = Ledger::new(
                difficulty.unwrap_or(defaults.ledger.difficulty),
                reward.unwrap_or(defaults.ledger.mining_reward),
                max_txs.unwrap_or(defaults.ledger.max_transactions_per_block),
            );
            ledger.export().save(&cli.state)?;
            println!(
                "{} genesis {} at difficulty {}",
                "ledger created:".green().bold(),
                short_hash(&ledger.chain[0].hash),
                ledger.difficulty
            );
        }
        Command::Submit {
            from,
            to,
            amount,
            fee,
            secret,
        } => {
            let mut ledger = load_ledger(&cli.state)?;
            let mut tx = Transaction::new(from, to, amount, fee);
            tx.sign(&secret);
            let hash = ledger.add_transaction(tx)?;
            ledger.export().save(&cli.state)?;
            println!("{} {}", "accepted:".green().bold(), hash);
        }
        Command::Mine { miner } => {
            let ledger = Arc::new(RwLock::new(load_ledger(&cli.state)?));
            mine(&miner, Arc::clone(&ledger))?;
            ledger.read().export().save(&cli.state)?;
        }
        Command::Balance { address } => {
            let ledger = load_ledger(&cli.state)?;
            println!("{}", ledger.balance(&address));
        }
        Command::History { address } => {
            let ledger = load_ledger(&cli.state)?;
            let mut table = Table::new();
            table.set_header(vec!["From", "To", "Amount", "Fee", "Hash"]);
            for tx in ledger.history(&address) {
                table.add_row(vec![
                    tx.sender.clone(),
                    tx.recipient.clone(),
                    tx.amount.to_string(),
                    tx.fee.to_string(),
                    short_hash(&tx.hash),
                ]);
            }
            println!("{table}");
        }
        Command::Lookup { hash } => {
            let ledger = load_ledger(&cli.state)?;
            match ledger.find_transaction(&hash) {
                Some(TransactionLookup::Pending(tx)) => {
                    println!(
                        "{} {} -> {} for {}",
                        "pending:".yellow().bold(),
                        tx.sender,
                        tx.recipient,
                        tx.amount
                    );
                }
                Some(TransactionLookup::Confirmed {
                    transaction,
                    block_index,
                    confirmations,
                }) => {
                    println!(
                        "{} {} -> {} for {} (block {}, {} confirmations)",
                        "confirmed:".green().bold(),
                        transaction.sender,
                        transaction.recipient,
                        transaction.amount,
                        block_index,
                        confirmations
                    );
                }
                None => println!("{}", "not found".red()),
            }
        }
        Command::Stats => {
            let ledger = load_ledger(&cli.state)?;
            let stats = ledger.stats();
            let mut table = Table::new();
            table.set_header(vec!["Metric", "Value"]);
            table.add_row(vec!["Blocks".to_string(), stats.total_blocks.to_string()]);
            table.add_row(vec![
                "Transactions".to_string(),
                stats.total_transactions.to_string(),
            ]);
            table.add_row(vec![
                "Pending".to_string(),
                stats.pending_transactions.to_string(),
            ]);
            table.add_row(vec!["Difficulty".to_string(), stats.difficulty.to_string()]);
            table.add_row(vec![
                "Mining reward".to_string(),
                stats.mining_reward.to_string(),
            ]);
            table.add_row(vec![
                "Avg block time (ms)".to_string(),
                format!("{:.0}", stats.average_block_time_ms),
            ]);
            table.add_row(vec!["Chain valid".to_string(), stats.is_valid.to_string()]);
            println!("{table}");
        }
        Command::Retarget => {
            let mut ledger = load_ledger(&cli.state)?;
            let before = ledger.difficulty;
            ledger.adjust_difficulty();
            ledger.export().save(&cli.state)?;
            println!("difficulty: {} -> {}", before, ledger.difficulty);
        }
        Command::Validate => {
            let ledger = load_ledger(&cli.state)?;
            if ledger.is_chain_valid() {
                println!("{}", "chain is valid".green().bold());
            } else {
                println!("{}", "chain is INVALID".red().bold());
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn load_ledger(path: &str) -> Result<Ledger, ChainError> {
    Ledger::import(LedgerSnapshot::load(path)?)
}

fn mine(miner: &str, ledger: Arc<RwLock<Ledger>>) -> Result<(), ChainError> {
    let coordinator = MiningCoordinator::new(ledger);
    coordinator.start(miner)?;

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    while coordinator.is_mining() {
        let status = coordinator.status();
        bar.set_message(format!(
            "{} attempts, trying {}",
            status.attempts,
            short_hash(&status.current_hash)
        ));
        bar.tick();
        std::thread::sleep(Duration::from_millis(100));
    }
    coordinator.wait();
    bar.finish_and_clear();

    match coordinator.status().state {
        MiningState::Completed {
            block_index,
            block_hash,
            reward,
        } => {
            println!(
                "{} block {} {} (reward {})",
                "mined:".green().bold(),
                block_index,
                short_hash(&block_hash),
                reward
            );
            Ok(())
        }
        MiningState::Cancelled => {
            println!("{}", "mining cancelled".yellow());
            Ok(())
        }
        MiningState::Failed(msg) => Err(ChainError::InvalidBlock(msg)),
        state => Err(ChainError::InvalidBlock(format!(
            "unexpected terminal mining state: {:?}",
            state
        ))),
    }
}

fn short_hash(hash: &str) -> String {
    if hash.len() > 16 {
        format!("{}...{}", &hash[..8], &hash[hash.len() - 8..])
    } else {
        hash.to_string()
    }
}
