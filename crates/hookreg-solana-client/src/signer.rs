//! Signer capability.
//!
//! Key custody lives outside the client. The submitter hands a
//! bincode-encoded, possibly partially signed transaction to a
//! `TransactionSigner` and gets the signed bytes back.

use std::path::Path;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use solana_sdk::transaction::Transaction;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signer is not connected")]
    NotConnected,

    #[error("failed to load keypair from {path}: {reason}")]
    Keypair { path: String, reason: String },

    #[error("signing failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address that will sign; also used as fee payer.
    fn pubkey(&self) -> Result<Pubkey, SignerError>;

    async fn sign(&self, tx: Vec<u8>) -> Result<Vec<u8>, SignerError>;
}

/// Signs with a local keypair. A disconnected signer has no key and fails
/// every call with `NotConnected`.
#[derive(Debug, Default)]
pub struct KeypairSigner {
    keypair: Option<Keypair>,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Some(keypair),
        }
    }

    pub fn disconnected() -> Self {
        Self { keypair: None }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SignerError> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path).map_err(|e| SignerError::Keypair {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(keypair))
    }

    pub fn keypair(&self) -> Option<&Keypair> {
        self.keypair.as_ref()
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> Result<Pubkey, SignerError> {
        self.keypair
            .as_ref()
            .map(|k| k.pubkey())
            .ok_or(SignerError::NotConnected)
    }

    async fn sign(&self, tx: Vec<u8>) -> Result<Vec<u8>, SignerError> {
        let keypair = self.keypair.as_ref().ok_or(SignerError::NotConnected)?;
        let mut tx: Transaction =
            bincode::deserialize(&tx).map_err(|e| SignerError::Failed(e.to_string()))?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[keypair], blockhash)
            .map_err(|e| SignerError::Failed(e.to_string()))?;
        bincode::serialize(&tx).map_err(|e| SignerError::Failed(e.to_string()))
    }
}
