//! Single-node ledger simulation with two consensus mechanisms:
//! Proof-of-Work mining by concurrent miner workers and stake-weighted
//! validator selection, both over one in-memory chain.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod stake;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, Ledger, MineOutcome, MinerWorker, MiningPolicy, NonceStrategy};
pub use config::Config;
pub use error::{Error, Result};
pub use stake::StakeRegistry;
pub use transaction::Transaction;
pub use wallet::{Signer, Wallet};
