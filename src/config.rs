use std::env;
use std::str::FromStr;

use crate::blockchain::{
    DEFAULT_DIFFICULTY, DEFAULT_MAX_ATTEMPTS, DEFAULT_REWARD, MAX_DIFFICULTY, MAX_RANDOM_NONCE,
    MAX_REWARD, MiningPolicy, NonceStrategy,
};
use crate::error::{Error, Result};

/// Default number of concurrent miner workers started by the demo driver.
pub const DEFAULT_MINERS: usize = 2;

/// Process-wide settings, fixed once the ledger is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub difficulty: u32,
    pub reward: u64,
    pub policy: MiningPolicy,
    pub miners: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            reward: DEFAULT_REWARD,
            policy: MiningPolicy::default(),
            miners: DEFAULT_MINERS,
        }
    }
}

impl Config {
    /// Read configuration from the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Missing keys fall back to defaults.
    ///
    /// Recognized keys: `DIFFICULTY`, `REWARD`, `NONCE_STRATEGY` (`random` or `sequential`),
    /// `MAX_NONCE`, `MAX_MINING_ATTEMPTS` (`0` = unbounded) and `MINERS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let difficulty = parse_or(&lookup, "DIFFICULTY", DEFAULT_DIFFICULTY)?;
        if difficulty > MAX_DIFFICULTY {
            return Err(Error::InvalidConfig(format!(
                "DIFFICULTY {difficulty} exceeds digest length {MAX_DIFFICULTY}"
            )));
        }
        let reward = parse_or(&lookup, "REWARD", DEFAULT_REWARD)?;
        if reward > MAX_REWARD {
            return Err(Error::InvalidConfig(format!("REWARD {reward} exceeds {MAX_REWARD}")));
        }

        let max_nonce = parse_or(&lookup, "MAX_NONCE", MAX_RANDOM_NONCE)?;
        let strategy = match lookup("NONCE_STRATEGY").as_deref().map(str::trim) {
            None | Some("") | Some("random") => NonceStrategy::Random { max_nonce },
            Some("sequential") => NonceStrategy::Sequential,
            Some(other) => {
                return Err(Error::InvalidConfig(format!(
                    "NONCE_STRATEGY must be `random` or `sequential`, got `{other}`"
                )));
            }
        };
        let max_attempts = match parse_or(&lookup, "MAX_MINING_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)? {
            0 => None,
            n => Some(n),
        };

        let miners = parse_or(&lookup, "MINERS", DEFAULT_MINERS)?;
        if miners == 0 {
            return Err(Error::InvalidConfig("MINERS must be at least 1".into()));
        }

        Ok(Self {
            difficulty,
            reward,
            policy: MiningPolicy {
                strategy,
                max_attempts,
            },
            miners,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("{key} has invalid value `{raw}`"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.difficulty, 4);
        assert_eq!(cfg.reward, 10);
        assert_eq!(
            cfg.policy.strategy,
            NonceStrategy::Random {
                max_nonce: 1_000_000
            }
        );
        assert_eq!(cfg.policy.max_attempts, Some(DEFAULT_MAX_ATTEMPTS));
    }

    #[test]
    fn reads_all_keys() {
        let cfg = config_from(&[
            ("DIFFICULTY", "2"),
            ("REWARD", "50"),
            ("NONCE_STRATEGY", "sequential"),
            ("MAX_MINING_ATTEMPTS", "0"),
            ("MINERS", "8"),
        ])
        .unwrap();
        assert_eq!(cfg.difficulty, 2);
        assert_eq!(cfg.reward, 50);
        assert_eq!(cfg.policy.strategy, NonceStrategy::Sequential);
        assert_eq!(cfg.policy.max_attempts, None);
        assert_eq!(cfg.miners, 8);
    }

    #[test]
    fn largest_reward_is_accepted() {
        let cfg = config_from(&[("REWARD", "9007199254740992")]).unwrap();
        assert_eq!(cfg.reward, MAX_REWARD);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("DIFFICULTY", "65")]).is_err());
        assert!(config_from(&[("DIFFICULTY", "-1")]).is_err());
        assert!(config_from(&[("REWARD", "lots")]).is_err());
        assert!(config_from(&[("REWARD", "9007199254740993")]).is_err());
        assert!(config_from(&[("NONCE_STRATEGY", "lucky")]).is_err());
        assert!(config_from(&[("MINERS", "0")]).is_err());
    }
}
