use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use super::{Block, GENESIS_PREVIOUS_HASH, MAX_DIFFICULTY, MAX_REWARD, MiningPolicy};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// Result of one call to [`Ledger::mine_pending_transactions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    Mined {
        miner: String,
        index: u64,
        hash: String,
    },
    /// The pending pool was empty; nothing changed.
    NothingToMine,
}

/// Chain and pending pool. Only ever touched while holding [`Ledger::state`].
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl LedgerState {
    fn tip_hash(&self) -> String {
        self.chain
            .last()
            .and_then(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
    }
}

/// In-memory Proof-of-Work ledger shared by concurrent miners.
///
/// A single mutex covers both the chain and the pending pool, and
/// `mine_pending_transactions` holds it for the entire snapshot, search and
/// append sequence. Miners therefore serialize: at most one searches at a time.
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
    difficulty: u32,
    reward: u64,
    policy: MiningPolicy,
}

impl Ledger {
    /// Initialize a new ledger with a genesis block and the default mining policy.
    pub fn new(difficulty: u32, reward: u64) -> Result<Self> {
        Self::with_policy(difficulty, reward, MiningPolicy::default())
    }

    pub fn with_policy(difficulty: u32, reward: u64, policy: MiningPolicy) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(Error::InvalidConfig(format!(
                "difficulty {difficulty} exceeds digest length {MAX_DIFFICULTY}"
            )));
        }
        if reward > MAX_REWARD {
            return Err(Error::InvalidConfig(format!("reward {reward} exceeds {MAX_REWARD}")));
        }
        let genesis = Self::create_genesis_block(difficulty, reward);
        info!(
            "ledger created (difficulty={}, reward={}, genesis={})",
            difficulty,
            reward,
            genesis.hash.as_deref().unwrap_or_default()
        );
        Ok(Self {
            state: Mutex::new(LedgerState {
                chain: vec![genesis],
                pending: Vec::new(),
            }),
            difficulty,
            reward,
            policy,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_policy(config.difficulty, config.reward, config.policy)
    }

    fn create_genesis_block(difficulty: u32, reward: u64) -> Block {
        Block::genesis(difficulty, reward)
    }

    // Poison is ignored: each mutation is a single push or assignment.
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record to the pending pool. No validation is performed.
    pub fn add_transaction(&self, transaction: impl Into<Transaction>) {
        let mut state = self.state();
        state.pending.push(transaction.into());
    }

    /// Mine the pending pool into a new block credited to `miner`.
    ///
    /// On success the block is appended and the pool is replaced by a single
    /// reward transfer to `miner`. If the search gives up, the ledger is left
    /// exactly as it was.
    pub fn mine_pending_transactions(&self, miner: &str) -> Result<MineOutcome> {
        let mut state = self.state();
        if state.pending.is_empty() {
            info!("no transactions to mine for {miner}");
            return Ok(MineOutcome::NothingToMine);
        }

        let index = state.chain.len() as u64;
        let mut block = Block::new(
            index,
            state.tip_hash(),
            state.pending.clone(),
            self.difficulty,
            self.reward,
        );
        let hash = block.mine(&self.policy).inspect_err(|e| {
            warn!("miner {miner} abandoned block {index}: {e}");
        })?;

        state.chain.push(block);
        state.pending = vec![Transaction::reward(miner, self.reward)];
        info!("Miner {miner} mined block {index} with hash {hash}");

        Ok(MineOutcome::Mined {
            miner: miner.to_string(),
            index,
            hash,
        })
    }

    /// Snapshot of the whole chain, genesis first.
    pub fn chain(&self) -> Vec<Block> {
        self.state().chain.clone()
    }

    /// Snapshot of the pending pool.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state().pending.clone()
    }

    /// Whole chain as pretty-printed JSON, for display.
    pub fn chain_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state().chain)?)
    }

    pub fn last_block(&self) -> Block {
        self.state()
            .chain
            .last()
            .cloned()
            .expect("ledger always holds at least the genesis block")
    }

    /// Validate the entire chain: genesis, linkage, hashes and PoW.
    pub fn is_valid_chain(&self) -> bool {
        is_valid_chain(&self.state().chain)
    }

    pub fn len(&self) -> usize {
        self.state().chain.len()
    }

    /// Always false: the genesis block is installed at construction.
    pub fn is_empty(&self) -> bool {
        self.state().chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn reward(&self) -> u64 {
        self.reward
    }

    pub fn policy(&self) -> MiningPolicy {
        self.policy
    }
}

fn is_valid_chain(chain: &[Block]) -> bool {
    let Some(genesis) = chain.first() else {
        return false;
    };

    if genesis.index != 0
        || genesis.previous_hash != GENESIS_PREVIOUS_HASH
        || genesis.hash.as_deref() != Some(genesis.compute_hash().as_str())
    {
        return false;
    }

    chain.windows(2).enumerate().all(|(i, pair)| {
        let (prev, current) = (&pair[0], &pair[1]);
        current.index == (i + 1) as u64
            && prev.hash.as_deref() == Some(current.previous_hash.as_str())
            && current.is_valid()
    })
}
