use thiserror::Error;

/// Errors surfaced by the ledger, the stake registry and configuration loading.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not mine block after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    #[error("invalid stake amount {amount} for validator {validator}")]
    InvalidStake { validator: String, amount: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("miner worker {0} failed")]
    WorkerFailed(String),

    #[error("invalid key material: {0}")]
    InvalidKey(&'static str),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
