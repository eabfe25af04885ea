//! Client error taxonomy.
//!
//! Every failure surfaced by the client names exactly one kind. State errors
//! are reported verbatim and never retried; network/timing errors are
//! recoverable by the caller but the engine does not retry them itself.

use std::fmt;

use hookreg_core::codec::CodecError;
use hookreg_core::config::SettingsError;
use hookreg_core::model::ApprovalStatus;
use hookreg_core::rules::TransitionError;
use solana_sdk::program_error::ProgramError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::rpc::{CommitFailure, RpcError};
use crate::signer::SignerError;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Malformed caller input, rejected before any network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("invalid address {value:?}: {reason}")]
    Address { value: String, reason: String },

    #[error("unknown hook kind {0:?} (expected \"royalty\" or \"custom:<address>\")")]
    UnknownHookKind(String),

    #[error("invalid payload: {0}")]
    Payload(#[from] CodecError),

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("mints must be strictly ordered: {mint_a} is not below {mint_b}")]
    UnorderedMints { mint_a: Pubkey, mint_b: Pubkey },

    #[error("initial price must be finite and positive, got {0}")]
    Price(f64),

    #[error("too many seeds ({0}, max 15 plus the bump)")]
    TooManySeeds(usize),

    #[error("seed {index} is {len} bytes (max 32)")]
    SeedTooLong { index: usize, len: usize },

    #[error("risk score {0} is out of range 0..=100")]
    RiskScore(u8),

    #[error("a transaction needs at least one instruction")]
    EmptyTransaction,

    #[error("token interface rejected the arguments: {0}")]
    Interface(#[from] ProgramError),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification of [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Input,
    Derivation,
    State,
    Network,
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Derivation => "derivation",
            Self::State => "state",
            Self::Network => "network",
            Self::Decode => "decode",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("no bump in 0..=255 yields an off-curve address for program {program_id}")]
    NoValidDerivation { program_id: Pubkey },

    #[error("hook program {program_id} is already submitted")]
    AlreadySubmitted { program_id: Pubkey },

    #[error("{what} {address} is already initialized")]
    AlreadyInitialized { what: &'static str, address: Pubkey },

    #[error("{voter} already voted on submission {submission}")]
    DuplicateVote { submission: Pubkey, voter: Pubkey },

    #[error("submission {submission} already has a risk assessment")]
    AlreadyAssessed { submission: Pubkey },

    #[error("vote window for {submission} closed at {review_ends_at} (ledger time {now})")]
    VoteWindowClosed {
        submission: Pubkey,
        review_ends_at: i64,
        now: i64,
    },

    #[error("review of {submission} ends at {review_ends_at} (ledger time {now})")]
    ReviewNotEnded {
        submission: Pubkey,
        review_ends_at: i64,
        now: i64,
    },

    #[error("submission {submission}: {source}")]
    InvalidStatus {
        submission: Pubkey,
        #[source]
        source: TransitionError,
    },

    #[error("hook program {program_id} is {status}, not approved")]
    HookNotApproved {
        program_id: Pubkey,
        status: ApprovalStatus,
    },

    #[error("mint {mint} carries hook {found:?}, expected {expected}")]
    HookMismatch {
        mint: Pubkey,
        expected: Pubkey,
        found: Option<Pubkey>,
    },

    #[error("{what} {address} not found")]
    NotFound { what: &'static str, address: Pubkey },

    #[error("hook program {program_id} is missing or not executable")]
    ProgramNotExecutable { program_id: Pubkey },

    #[error("freshness anchor expired before {signature} was confirmed; rebuild and resubmit")]
    StaleAnchor { signature: Signature },

    #[error("transaction {signature} was not confirmed in time; re-query before resubmitting")]
    Unconfirmed { signature: Signature },

    #[error("transaction {signature} was rejected: {failure}")]
    Rejected {
        signature: Signature,
        failure: CommitFailure,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("account {account} is not a {expected} (discriminator {found})")]
    UnexpectedAccountLayout {
        account: Pubkey,
        expected: &'static str,
        found: String,
    },

    #[error("failed to decode account {account}: {source}")]
    Decode {
        account: Pubkey,
        #[source]
        source: CodecError,
    },

    #[error("account {account} is not a valid token-interface account: {source}")]
    TokenLayout {
        account: Pubkey,
        #[source]
        source: ProgramError,
    },

    #[error("cannot resolve transfer-hook accounts for mint {mint}: {reason}")]
    HookAccounts { mint: Pubkey, reason: String },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) | Self::Signer(_) => ErrorKind::Input,
            Self::NoValidDerivation { .. } => ErrorKind::Derivation,
            Self::AlreadySubmitted { .. }
            | Self::DuplicateVote { .. }
            | Self::AlreadyAssessed { .. }
            | Self::AlreadyInitialized { .. }
            | Self::VoteWindowClosed { .. }
            | Self::ReviewNotEnded { .. }
            | Self::InvalidStatus { .. }
            | Self::HookNotApproved { .. }
            | Self::HookMismatch { .. }
            | Self::NotFound { .. }
            | Self::ProgramNotExecutable { .. }
            | Self::HookAccounts { .. }
            | Self::Rejected { .. } => ErrorKind::State,
            Self::StaleAnchor { .. } | Self::Unconfirmed { .. } | Self::Rpc(_) => {
                ErrorKind::Network
            }
            Self::UnexpectedAccountLayout { .. } | Self::Decode { .. } | Self::TokenLayout { .. } => {
                ErrorKind::Decode
            }
        }
    }

    /// Whether rebuilding and resubmitting may succeed. The engine never
    /// acts on this; it is advice for the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StaleAnchor { .. } | Self::Unconfirmed { .. } => true,
            Self::Rpc(e) => e.is_transport(),
            _ => false,
        }
    }

    /// Map a codec failure on an account read.
    pub(crate) fn from_account_decode(account: Pubkey, err: CodecError) -> Self {
        match err {
            CodecError::DiscriminatorMismatch {
                type_name, found, ..
            } => Self::UnexpectedAccountLayout {
                account,
                expected: type_name,
                found: hex::encode(found),
            },
            source => Self::Decode { account, source },
        }
    }

    /// Map a transition check against a specific submission.
    pub(crate) fn from_transition(submission: Pubkey, err: TransitionError) -> Self {
        match err {
            TransitionError::VoteWindowClosed {
                review_ends_at,
                now,
            } => Self::VoteWindowClosed {
                submission,
                review_ends_at,
                now,
            },
            TransitionError::ReviewNotEnded {
                review_ends_at,
                now,
            } => Self::ReviewNotEnded {
                submission,
                review_ends_at,
                now,
            },
            source => Self::InvalidStatus { submission, source },
        }
    }
}

impl From<CodecError> for RegistryError {
    fn from(e: CodecError) -> Self {
        Self::Input(InputError::Payload(e))
    }
}

impl From<ProgramError> for RegistryError {
    fn from(e: ProgramError) -> Self {
        Self::Input(InputError::Interface(e))
    }
}
