//! hookreg-solana-client
//!
//! Off-chain client for the transfer-hook registry program and the
//! pool program that consumes its approvals.
//!
//! It includes:
//! - PDA derivation and the seed namespaces shared with the programs
//! - the extension catalog (`HookKind`) and extra-account-meta encoding
//! - pure instruction builders for the registry, Token-2022 and pools
//! - the RPC and signer boundaries, and a one-shot transaction submitter
//! - a read-only ledger query façade
//! - the registry workflow engine and the token-launch saga
//!
//! Connections and signers are passed explicitly; the crate keeps no global
//! state.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod pda;
pub mod query;
pub mod rpc;
pub mod saga;
pub mod signer;
pub mod submitter;
pub mod workflow;

pub use catalog::{ExtraAccountMeta, HookKind, Seed};
pub use config::{ClientConfig, Commitment, ConfirmSettings, ProgramIds};
pub use constants::*;
pub use error::{ErrorKind, InputError, RegistryError, RegistryResult};
pub use query::LedgerQuery;
pub use rpc::{LedgerRpc, SolanaRpc};
pub use saga::{LaunchPlan, LaunchStep, RetrySafety, StepStatus, TokenLaunch};
pub use signer::{KeypairSigner, SignerError, TransactionSigner};
pub use submitter::{SubmitRequest, Submitter};
pub use workflow::RegistryClient;
