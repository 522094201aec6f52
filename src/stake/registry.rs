use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use rand::Rng;

use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// Stake-weighted validator registry (simplified Proof-of-Stake).
///
/// Entries keep the order in which each validator first staked; selection
/// walks them in that order. Independent of the ledger lock.
#[derive(Debug, Default)]
pub struct StakeRegistry {
    stakes: Mutex<Vec<(String, f64)>>,
}

impl StakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn stakes(&self) -> MutexGuard<'_, Vec<(String, f64)>> {
        self.stakes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Credit `amount` to `validator`, creating the entry if needed.
    /// Negative or non-finite amounts are rejected, as is any credit that would
    /// push the validator's stake or the registry total past `f64::MAX`.
    pub fn stake(&self, validator: &str, amount: f64) -> Result<()> {
        let invalid = || Error::InvalidStake {
            validator: validator.to_string(),
            amount,
        };
        if !amount.is_finite() || amount < 0.0 {
            return Err(invalid());
        }

        let mut stakes = self.stakes();
        let current = stakes
            .iter()
            .find(|(v, _)| v == validator)
            .map_or(0.0, |(_, s)| *s);
        let total: f64 = stakes.iter().map(|(_, s)| s).sum();
        if !(current + amount).is_finite() || !(total + amount).is_finite() {
            return Err(invalid());
        }

        match stakes.iter_mut().find(|(v, _)| v == validator) {
            Some((_, total)) => *total += amount,
            None => stakes.push((validator.to_string(), amount)),
        }
        debug!("{validator} staked {amount}");
        Ok(())
    }

    /// Weighted-random validator; `None` when the total stake is zero.
    pub fn select_validator(&self) -> Option<String> {
        self.select_validator_with(&mut rand::thread_rng())
    }

    pub fn select_validator_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        let stakes = self.stakes();
        let total: f64 = stakes.iter().map(|(_, s)| s).sum();
        if total <= 0.0 {
            return None;
        }
        let point = rng.gen_range(0.0..total);
        roulette(&stakes, point).map(str::to_string)
    }

    /// Have a selected validator approve an already captured batch.
    /// Returns the approving validator, or `None` if nobody holds stake.
    pub fn validate_block(&self, transactions: &[Transaction]) -> Option<String> {
        let validator = self.select_validator()?;
        let batch: Vec<String> = transactions.iter().map(ToString::to_string).collect();
        info!("Validator {validator} approved transactions: {batch:?}");
        Some(validator)
    }

    pub fn total_stake(&self) -> f64 {
        self.stakes().iter().map(|(_, s)| s).sum()
    }

    pub fn stake_of(&self, validator: &str) -> Option<f64> {
        self.stakes()
            .iter()
            .find(|(v, _)| v == validator)
            .map(|(_, s)| *s)
    }

    /// Snapshot of all entries in selection order.
    pub fn validators(&self) -> Vec<(String, f64)> {
        self.stakes().clone()
    }
}

/// Walk `entries` accumulating stake and return the first validator whose
/// running total reaches `point`. Ties on an exact boundary go to the earlier entry.
pub fn roulette(entries: &[(String, f64)], point: f64) -> Option<&str> {
    let mut cumulative = 0.0;
    for (validator, stake) in entries {
        cumulative += stake;
        if cumulative >= point {
            return Some(validator.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn entries(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(v, s)| (v.to_string(), *s)).collect()
    }

    #[test]
    fn stake_accumulates_in_first_insertion_order() {
        let registry = StakeRegistry::new();
        registry.stake("A", 10.0).unwrap();
        registry.stake("B", 5.0).unwrap();
        registry.stake("A", 15.0).unwrap();

        assert_eq!(registry.validators(), entries(&[("A", 25.0), ("B", 5.0)]));
        assert_eq!(registry.stake_of("A"), Some(25.0));
        assert_eq!(registry.stake_of("nobody"), None);
        assert_eq!(registry.total_stake(), 30.0);
    }

    #[test]
    fn rejects_negative_and_non_finite_amounts() {
        let registry = StakeRegistry::new();
        assert!(matches!(registry.stake("A", -1.0), Err(Error::InvalidStake { .. })));
        assert!(registry.stake("A", f64::NAN).is_err());
        assert!(registry.stake("A", f64::INFINITY).is_err());
        assert!(registry.validators().is_empty());
    }

    #[test]
    fn rejects_credit_that_overflows_totals() {
        let registry = StakeRegistry::new();
        registry.stake("A", f64::MAX).unwrap();

        assert!(matches!(registry.stake("B", f64::MAX), Err(Error::InvalidStake { .. })));
        assert!(registry.stake("A", f64::MAX).is_err());
        assert_eq!(registry.validators(), entries(&[("A", f64::MAX)]));
        assert!(registry.total_stake().is_finite());
        assert_eq!(registry.select_validator(), Some("A".to_string()));
    }

    #[test]
    fn no_stake_means_no_validator() {
        let registry = StakeRegistry::new();
        assert_eq!(registry.select_validator(), None);
        assert_eq!(registry.validate_block(&[Transaction::from("A->B:5")]), None);

        registry.stake("A", 0.0).unwrap();
        assert_eq!(registry.select_validator(), None);
    }

    #[test]
    fn boundary_goes_to_earlier_entry() {
        let stakes = entries(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]);
        assert_eq!(roulette(&stakes, 0.0), Some("A"));
        assert_eq!(roulette(&stakes, 50.0), Some("A"));
        assert_eq!(roulette(&stakes, 50.5), Some("B"));
        assert_eq!(roulette(&stakes, 80.0), Some("B"));
        assert_eq!(roulette(&stakes, 99.9), Some("C"));

        let zero_first = entries(&[("Z", 0.0), ("A", 5.0)]);
        assert_eq!(roulette(&zero_first, 0.0), Some("Z"));
        assert_eq!(roulette(&zero_first, 0.1), Some("A"));
    }

    #[test]
    fn selection_follows_stake_weights() {
        let registry = StakeRegistry::new();
        registry.stake("A", 50.0).unwrap();
        registry.stake("B", 30.0).unwrap();
        registry.stake("C", 20.0).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let draws = 10_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..draws {
            let v = registry.select_validator_with(&mut rng).unwrap();
            *counts.entry(v).or_default() += 1;
        }

        for (validator, expected) in [("A", 0.5), ("B", 0.3), ("C", 0.2)] {
            let freq = counts.get(validator).copied().unwrap_or(0) as f64 / draws as f64;
            assert!(
                (freq - expected).abs() < 0.03,
                "{validator}: {freq} vs {expected}"
            );
        }
    }

    #[test]
    fn validate_block_reports_staked_validator() {
        let registry = StakeRegistry::new();
        registry.stake("Validator1", 50.0).unwrap();

        let batch = vec![Transaction::reward("M1", 10)];
        assert_eq!(registry.validate_block(&batch), Some("Validator1".to_string()));
    }
}
