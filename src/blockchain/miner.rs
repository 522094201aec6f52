use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::debug;

use super::{Ledger, MineOutcome};
use crate::error::{Error, Result};

/// Named worker that repeatedly tries to extend a shared ledger.
pub struct MinerWorker {
    identity: String,
    ledger: Arc<Ledger>,
    rounds: usize,
}

/// Everything one worker produced, in the order it happened.
#[derive(Debug)]
pub struct MinerReport {
    pub miner: String,
    pub outcomes: Vec<Result<MineOutcome>>,
}

impl MinerReport {
    /// Indices of the blocks this worker appended.
    pub fn mined_indices(&self) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                Ok(MineOutcome::Mined { index, .. }) => Some(*index),
                _ => None,
            })
            .collect()
    }
}

impl MinerWorker {
    /// Worker performing a single mining round.
    pub fn new(identity: impl Into<String>, ledger: Arc<Ledger>) -> Self {
        Self {
            identity: identity.into(),
            ledger,
            rounds: 1,
        }
    }

    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Run every round on the calling thread.
    pub fn run(&self) -> MinerReport {
        let outcomes = (0..self.rounds)
            .map(|round| {
                debug!("{} starting round {}", self.identity, round + 1);
                self.ledger.mine_pending_transactions(&self.identity)
            })
            .collect();
        MinerReport {
            miner: self.identity.clone(),
            outcomes,
        }
    }

    /// Run on a dedicated OS thread named after the miner.
    pub fn spawn(self) -> Result<JoinHandle<MinerReport>> {
        let name = self.identity.clone();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run())
            .map_err(|_| Error::WorkerFailed(name))
    }
}

/// Start one worker per identity against the same ledger and wait for all of them.
/// Reports come back in the order the identities were given.
pub fn race_miners<I, S>(
    ledger: &Arc<Ledger>,
    identities: I,
    rounds: usize,
) -> Result<Vec<MinerReport>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let handles = identities
        .into_iter()
        .map(|id| {
            let worker = MinerWorker::new(id, Arc::clone(ledger)).rounds(rounds);
            let name = worker.identity().to_string();
            worker.spawn().map(|handle| (name, handle))
        })
        .collect::<Result<Vec<_>>>()?;

    handles
        .into_iter()
        .map(|(name, handle)| handle.join().map_err(|_| Error::WorkerFailed(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn concurrent_miners_append_contiguous_blocks() {
        let ledger = Arc::new(Ledger::new(1, 10).unwrap());
        ledger.add_transaction("A->B:5");
        ledger.add_transaction("B->C:2");

        let miners: Vec<String> = (1..=8).map(|i| format!("Miner{i}")).collect();
        let reports = race_miners(&ledger, miners, 1).unwrap();

        assert_eq!(reports.len(), 8);
        for report in &reports {
            assert_eq!(
                report.mined_indices().len(),
                1,
                "{} did not mine",
                report.miner
            );
        }

        let chain = ledger.chain();
        assert_eq!(chain.len(), 9);
        let mut hashes = HashSet::new();
        for (i, block) in chain.iter().enumerate() {
            assert_eq!(block.index, i as u64);
            assert!(hashes.insert(block.hash.clone().unwrap()), "duplicate hash");
        }
        for i in 1..chain.len() {
            assert_eq!(
                Some(chain[i].previous_hash.as_str()),
                chain[i - 1].hash.as_deref()
            );
            assert!(chain[i].hash.as_deref().unwrap().starts_with('0'));
        }

        let indices: HashSet<u64> = reports.iter().flat_map(|r| r.mined_indices()).collect();
        assert_eq!(indices, (1..=8).collect());
        assert!(ledger.is_valid_chain());
    }

    #[test]
    fn worker_rounds_keep_mining_reward_pool() {
        let ledger = Arc::new(Ledger::new(1, 10).unwrap());
        ledger.add_transaction("seed");

        let report = MinerWorker::new("Solo", Arc::clone(&ledger)).rounds(3).run();

        assert_eq!(report.mined_indices(), vec![1, 2, 3]);
        assert_eq!(ledger.len(), 4);
        assert_eq!(
            ledger.chain()[3].transactions[0].to_string(),
            "Reward to Solo: 10"
        );
    }

    #[test]
    fn worker_on_empty_pool_reports_nothing_to_mine() {
        let ledger = Arc::new(Ledger::new(1, 10).unwrap());
        let handle = MinerWorker::new("Idle", Arc::clone(&ledger)).spawn().unwrap();
        let report = handle.join().unwrap();

        assert_eq!(report.miner, "Idle");
        assert!(matches!(
            report.outcomes.as_slice(),
            [Ok(MineOutcome::NothingToMine)]
        ));
        assert_eq!(ledger.len(), 1);
    }
}
