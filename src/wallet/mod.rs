use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::error::{Error, Result};
use crate::transaction::Transaction;

/// Signing capability consumed by transaction producers. The ledger itself only
/// ever sees the resulting identity and signature strings.
pub trait Signer {
    /// Identity of the signer (hex of the compressed public key for [`Wallet`]).
    fn public_key(&self) -> String;

    /// Hex-encoded signature over the transaction's sighash.
    fn sign(&self, transaction: &Transaction) -> String;
}

/// secp256k1 key pair. Address is simply the hex of the compressed public key (didactic).
pub struct Wallet {
    secret: SecretKey,
    public: PublicKey,
}

impl Wallet {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut OsRng);
        Self { secret, public }
    }

    /// Restore a wallet from a hex-encoded 32-byte secret key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex).map_err(|_| Error::InvalidKey("invalid secret hex"))?;
        let secret =
            SecretKey::from_slice(&bytes).map_err(|_| Error::InvalidKey("invalid secret bytes"))?;
        let public = secret.public_key(&Secp256k1::signing_only());
        Ok(Self { secret, public })
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }
}

impl Signer for Wallet {
    fn public_key(&self) -> String {
        hex::encode(self.public.serialize())
    }

    fn sign(&self, transaction: &Transaction) -> String {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest(transaction.sighash());
        let sig = secp.sign_ecdsa(&msg, &self.secret);
        hex::encode(&sig.serialize_der()[..])
    }
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed)
/// and message hash (32 bytes).
pub fn verify_signature_hex(pubkey_hex: &str, sig_hex: &str, msg32: [u8; 32]) -> Result<bool> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| Error::InvalidKey("invalid signature hex"))?;
    let sig =
        Signature::from_der(&sig_bytes).map_err(|_| Error::InvalidKey("invalid DER signature"))?;

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| Error::InvalidKey("invalid pubkey hex"))?;
    let pk =
        PublicKey::from_slice(&pk_bytes).map_err(|_| Error::InvalidKey("invalid pubkey bytes"))?;

    let msg = Message::from_digest(msg32);
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

/// Check a signed transfer against the sender's public key. Notes and unsigned transfers fail.
pub fn verify_transaction(pubkey_hex: &str, transaction: &Transaction) -> Result<bool> {
    match transaction.signature() {
        Some(sig) => verify_signature_hex(pubkey_hex, sig, transaction.sighash()),
        None => Ok(false),
    }
}
