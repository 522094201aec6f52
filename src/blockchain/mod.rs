pub mod block;
pub mod ledger;
pub mod miner;

pub use block::{Block, MiningPolicy, NonceStrategy};
pub use ledger::{Ledger, MineOutcome};
pub use miner::{MinerReport, MinerWorker, race_miners};

/// Default Proof-of-Work difficulty (number of leading zero hex characters).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Default payout credited to the miner of each block.
pub const DEFAULT_REWARD: u64 = 10;

/// Largest reward carried exactly by the `f64` amount of a reward transfer (2^53).
pub const MAX_REWARD: u64 = 1 << 53;

/// Length of a hex-encoded SHA-256 digest; no difficulty above this can be met.
pub const MAX_DIFFICULTY: u32 = 64;

/// Upper bound (inclusive) of the random nonce sampling range.
pub const MAX_RANDOM_NONCE: u64 = 1_000_000;

/// Default cap on hash attempts before a mining round gives up.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 5_000_000;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
