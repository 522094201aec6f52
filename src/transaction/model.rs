use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::wallet::Signer;

/// Sender used by reward (coinbase) transfers created after a block is mined.
pub const COINBASE_SENDER: &str = "0";

/// A pending or mined transaction record. The ledger treats it as an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transaction {
    /// Free-form record, e.g. `"Alice -> Bob: 5 BTC"`.
    Note(String),
    /// Structured transfer between two identities.
    Transfer {
        sender: String,
        recipient: String,
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
}

impl Transaction {
    pub fn note(text: impl Into<String>) -> Self {
        Transaction::Note(text.into())
    }

    /// Unsigned transfer. Use [`Transaction::signed`] to attach a signature.
    pub fn transfer(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transaction::Transfer {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            signature: None,
        }
    }

    /// Reward credited to `miner` once it seals a block. Amounts above 2^53 lose
    /// precision in the `f64` field; the ledger refuses such rewards.
    pub fn reward(miner: impl Into<String>, amount: u64) -> Self {
        Self::transfer(COINBASE_SENDER, miner, amount as f64)
    }

    pub fn is_reward(&self) -> bool {
        matches!(self, Transaction::Transfer { sender, .. } if sender == COINBASE_SENDER)
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Transaction::Transfer { signature, .. } => signature.as_deref(),
            Transaction::Note(_) => None,
        }
    }

    /// Sign a transfer with `signer`. Notes carry no signature and are returned as is.
    pub fn signed(mut self, signer: &impl Signer) -> Self {
        let sig = signer.sign(&self);
        if let Transaction::Transfer { signature, .. } = &mut self {
            *signature = Some(sig);
        }
        self
    }

    /// Canonical signing payload (JSON) that excludes the signature itself.
    pub fn signing_payload(&self) -> Vec<u8> {
        let payload = match self {
            Transaction::Note(text) => serde_json::json!({ "note": text }),
            Transaction::Transfer {
                sender,
                recipient,
                amount,
                ..
            } => serde_json::json!({
                "sender": sender,
                "recipient": recipient,
                "amount": amount,
            }),
        };
        payload.to_string().into_bytes()
    }

    /// SHA-256 of the signing payload.
    pub fn sighash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_payload());
        hasher.finalize().into()
    }
}

impl From<&str> for Transaction {
    fn from(text: &str) -> Self {
        Transaction::Note(text.to_string())
    }
}

impl From<String> for Transaction {
    fn from(text: String) -> Self {
        Transaction::Note(text)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Note(text) => f.write_str(text),
            Transaction::Transfer {
                recipient, amount, ..
            } if self.is_reward() => write!(f, "Reward to {recipient}: {amount}"),
            Transaction::Transfer {
                sender,
                recipient,
                amount,
                ..
            } => write!(f, "{sender} -> {recipient}: {amount}"),
        }
    }
}
