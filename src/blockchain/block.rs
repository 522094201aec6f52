use chrono::Utc;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{DEFAULT_MAX_ATTEMPTS, GENESIS_PREVIOUS_HASH, MAX_RANDOM_NONCE};
use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// How the Proof-of-Work search picks the next candidate nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceStrategy {
    /// Uniform draw from `0..=max_nonce` on every attempt. Nonces may repeat.
    Random { max_nonce: u64 },
    /// 0, 1, 2, ...
    Sequential,
}

/// Search parameters for [`Block::mine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningPolicy {
    pub strategy: NonceStrategy,
    /// `None` searches until a nonce is found, which may never happen.
    pub max_attempts: Option<u64>,
}

impl Default for MiningPolicy {
    fn default() -> Self {
        Self {
            strategy: NonceStrategy::Random {
                max_nonce: MAX_RANDOM_NONCE,
            },
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

/// A single block in the chain holding a list of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix milliseconds (UTC), taken at construction
    pub previous_hash: String,
    pub nonce: u64,           // Proof-of-Work nonce
    pub hash: Option<String>, // unset until mined (or computed, for genesis)
    pub transactions: Vec<Transaction>,
    pub difficulty: u32,
    pub reward: u64,
}

impl Block {
    /// Create the genesis block. Its hash is computed directly, never mined.
    pub fn genesis(difficulty: u32, reward: u64) -> Self {
        let mut block = Self::new(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
            difficulty,
            reward,
        );
        block.hash = Some(block.compute_hash());
        block
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
        reward: u64,
    ) -> Self {
        Self::new_with_timestamp(
            index,
            previous_hash,
            transactions,
            difficulty,
            reward,
            Utc::now().timestamp_millis(),
        )
    }

    pub fn new_with_timestamp(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
        reward: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            index,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: None,
            transactions,
            difficulty,
            reward,
        }
    }

    /// Compute the SHA-256 hash of this block over index, timestamp, previous hash,
    /// nonce and transactions. Transactions are serialized as JSON into the preimage.
    pub fn compute_hash(&self) -> String {
        // Vec<Transaction> has no map keys or custom serializers, so this cannot fail.
        let txs_json = serde_json::to_string(&self.transactions).expect("serialize txs");
        let preimage = format!(
            "{}:{}:{}:{}:{}",
            self.index, self.timestamp, self.previous_hash, self.nonce, txs_json
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Perform Proof-of-Work: search for a nonce whose hash starts with
    /// `self.difficulty` zero hex characters. On success `nonce` and `hash` hold
    /// the accepted values and the hash is returned.
    pub fn mine(&mut self, policy: &MiningPolicy) -> Result<String> {
        self.mine_with_rng(policy, &mut rand::thread_rng())
    }

    pub fn mine_with_rng<R: Rng + ?Sized>(
        &mut self,
        policy: &MiningPolicy,
        rng: &mut R,
    ) -> Result<String> {
        let mut attempts: u64 = 0;
        loop {
            if policy.max_attempts.is_some_and(|max| attempts >= max) {
                self.hash = None;
                return Err(Error::MiningExhausted { attempts });
            }

            self.nonce = match policy.strategy {
                NonceStrategy::Random { max_nonce } => rng.gen_range(0..=max_nonce),
                NonceStrategy::Sequential => attempts,
            };
            attempts += 1;

            let hash = self.compute_hash();
            if meets_difficulty(&hash, self.difficulty) {
                debug!(
                    "block #{} sealed after {} attempts (nonce={})",
                    self.index, attempts, self.nonce
                );
                self.hash = Some(hash.clone());
                return Ok(hash);
            }
        }
    }

    /// Validate that the block's cached `hash` matches its content and
    /// satisfies its own difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self) -> bool {
        match &self.hash {
            Some(hash) => *hash == self.compute_hash() && meets_difficulty(hash, self.difficulty),
            None => false,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

/// True when `hash` starts with `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    hash.len() >= difficulty as usize
        && hash.chars().take(difficulty as usize).all(|c| c == '0')
}
