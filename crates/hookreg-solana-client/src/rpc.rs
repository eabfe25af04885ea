//! Network RPC boundary.
//!
//! The engine needs four things from the ledger: a freshness anchor, raw
//! account reads, dispatch of signed bytes and a confirmation probe.
//! `LedgerRpc` captures exactly that so the workflow can run against the
//! real cluster (`SolanaRpc`) or an in-process ledger in tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::InstructionError;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use solana_sdk::transaction::{Transaction, TransactionError};
use thiserror::Error;
use tracing::debug;

/// Recent blockhash plus the last block height at which it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Raw account as returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub data: Vec<u8>,
    pub owner: Pubkey,
    pub executable: bool,
    pub lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// Not yet visible at the requested commitment.
    Pending,
    Confirmed,
    Failed(CommitFailure),
    /// The anchor expired and the transaction can no longer land.
    Expired,
}

/// Why the ledger refused a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitFailure {
    /// A create targeted an address that already holds an account.
    #[error("account already in use")]
    AccountInUse,

    #[error("program error {code}")]
    Program { code: u32 },

    /// Custom error not yet attributed to a program; see [`CommitFailure::attribute`].
    #[error("custom error {code} in instruction {instruction}")]
    Custom { instruction: u8, code: u32 },

    #[error("blockhash not found")]
    BlockhashNotFound,

    #[error("{0}")]
    Other(String),
}

impl CommitFailure {
    /// Custom codes are left unattributed: their meaning depends on which
    /// program raised them.
    pub fn from_transaction_error(err: &TransactionError) -> Self {
        match err {
            TransactionError::InstructionError(_, InstructionError::AccountAlreadyInitialized)
            | TransactionError::AccountInUse => Self::AccountInUse,
            TransactionError::InstructionError(instruction, InstructionError::Custom(code)) => {
                Self::Custom {
                    instruction: *instruction,
                    code: *code,
                }
            }
            TransactionError::BlockhashNotFound => Self::BlockhashNotFound,
            other => Self::Other(other.to_string()),
        }
    }

    /// Resolve a custom code against the failing instruction. Code 0 is the
    /// system program's `AccountAlreadyInUse` only when that instruction is a
    /// system call or hands the system program to its callee (an `init`);
    /// from any other program it is that program's own error 0.
    pub fn attribute(self, message: &Message) -> Self {
        let Self::Custom { instruction, code } = self else {
            return self;
        };
        if code == 0 && reaches_system_program(message, instruction) {
            Self::AccountInUse
        } else {
            Self::Program { code }
        }
    }
}

fn reaches_system_program(message: &Message, instruction: u8) -> bool {
    let Some(ix) = message.instructions.get(usize::from(instruction)) else {
        return false;
    };
    let key = |index: &u8| message.account_keys.get(usize::from(*index));
    key(&ix.program_id_index) == Some(&system_program::id())
        || ix
            .accounts
            .iter()
            .any(|index| key(index) == Some(&system_program::id()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// The ledger refused the transaction before it was committed.
    #[error("transaction refused: {0}")]
    Refused(CommitFailure),

    #[error("malformed transaction bytes: {0}")]
    InvalidTransaction(String),

    #[error("unexpected rpc response: {0}")]
    Malformed(String),
}

impl RpcError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    fn from_client(err: ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => Self::Refused(CommitFailure::from_transaction_error(&tx_err)),
            None => Self::Transport(err.to_string()),
        }
    }
}

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn get_latest_anchor(&self) -> Result<Anchor, RpcError>;

    /// `None` when the address holds no account.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, RpcError>;

    /// Dispatch a signed, bincode-encoded transaction.
    async fn send(&self, signed_tx: &[u8]) -> Result<Signature, RpcError>;

    async fn confirm(&self, signature: &Signature, anchor: &Anchor)
        -> Result<CommitStatus, RpcError>;
}

#[async_trait]
impl<T: LedgerRpc + ?Sized> LedgerRpc for Arc<T> {
    async fn get_latest_anchor(&self) -> Result<Anchor, RpcError> {
        (**self).get_latest_anchor().await
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, RpcError> {
        (**self).get_account(address).await
    }

    async fn send(&self, signed_tx: &[u8]) -> Result<Signature, RpcError> {
        (**self).send(signed_tx).await
    }

    async fn confirm(
        &self,
        signature: &Signature,
        anchor: &Anchor,
    ) -> Result<CommitStatus, RpcError> {
        (**self).confirm(signature, anchor).await
    }
}

/// `LedgerRpc` over the Solana JSON-RPC API.
pub struct SolanaRpc {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("url", &self.client.url())
            .field("commitment", &self.commitment.commitment)
            .finish()
    }
}

impl SolanaRpc {
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), commitment),
            commitment,
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    async fn get_latest_anchor(&self) -> Result<Anchor, RpcError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(RpcError::from_client)?;
        Ok(Anchor {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, RpcError> {
        let resp = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(RpcError::from_client)?;
        Ok(resp.value.map(|a| AccountSnapshot {
            data: a.data,
            owner: a.owner,
            executable: a.executable,
            lamports: a.lamports,
        }))
    }

    async fn send(&self, signed_tx: &[u8]) -> Result<Signature, RpcError> {
        let tx: Transaction = bincode::deserialize(signed_tx)
            .map_err(|e| RpcError::InvalidTransaction(e.to_string()))?;
        let sig = self
            .client
            .send_transaction(&tx)
            .await
            .map_err(RpcError::from_client)?;
        debug!(signature = %sig, "transaction sent");
        Ok(sig)
    }

    async fn confirm(
        &self,
        signature: &Signature,
        anchor: &Anchor,
    ) -> Result<CommitStatus, RpcError> {
        let statuses = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(RpcError::from_client)?
            .value;

        if let Some(status) = statuses.into_iter().next().flatten() {
            if let Some(err) = &status.err {
                return Ok(CommitStatus::Failed(CommitFailure::from_transaction_error(
                    err,
                )));
            }
            return Ok(if status.satisfies_commitment(self.commitment) {
                CommitStatus::Confirmed
            } else {
                CommitStatus::Pending
            });
        }

        let height = self
            .client
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(RpcError::from_client)?;
        Ok(if height > anchor.last_valid_block_height {
            CommitStatus::Expired
        } else {
            CommitStatus::Pending
        })
    }
}
