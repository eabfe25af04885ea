//! hookreg-core
//!
//! Core primitives for the transfer-hook registry:
//! - Binary wire codec (little-endian integers, length-prefixed strings, tagged options)
//! - Account-state layouts with 8-byte type discriminators
//! - Registry and pool instruction payloads
//! - Approval state machine and vote tally
//! - Risk scoring from observable hook properties
//!
//! Nothing in this crate performs I/O. The client crate composes these pieces
//! with a ledger connection.

pub mod codec;
pub mod config;
pub mod hash;
pub mod model;
pub mod risk;
pub mod rules;

pub use crate::codec::{CodecError, CodecResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::codec::{CodecError, CodecResult, Reader, Writer};
    pub use crate::config::{validate_settings, RegistrySettings, SettingsError};
    pub use crate::hash::{account_discriminator, sha256};
    pub use crate::model::{
        AccountState, ApprovalStatus, GovernanceVote, HookSubmission, PoolInstruction,
        RegistryConfig, RegistryInstruction, RiskAssessment, TokenBadge,
    };
    pub use crate::risk::{RiskBand, RiskFlags, RiskReport};
    pub use crate::rules::{decide_outcome, Tally, TransitionError};
}
