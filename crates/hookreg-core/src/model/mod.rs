//! Registry data models.
//!
//! Account state and instruction payloads are plain data. Each type owns its
//! exact wire layout (see `accounts` and `instruction`); policy such as which
//! status transitions are legal lives in `crate::rules`.

use std::fmt;

use crate::codec::{CodecError, CodecResult, Reader, Writer};
use crate::hash::account_discriminator;
use crate::risk::RiskFlags;

pub mod accounts;
pub mod instruction;

pub use accounts::{
    GovernanceVote, HookSubmission, RegistryConfig, RiskAssessment, TokenBadge, NO_RISK_CAP,
};
pub use instruction::{PoolInstruction, RegistryInstruction};

/// Maximum metadata URI length accepted by the registry program.
pub const MAX_METADATA_URI_LEN: usize = 256;
/// Maximum vote rationale length.
pub const MAX_RATIONALE_LEN: usize = 256;
/// Maximum status-update reason length.
pub const MAX_REASON_LEN: usize = 256;
/// Maximum assessment notes length.
pub const MAX_NOTES_LEN: usize = 512;

/// Length of the leading account discriminator region.
pub const ACCOUNT_DISCRIMINATOR_LEN: usize = 8;

/// Lifecycle status of a hook submission.
///
/// The byte values are the on-chain encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ApprovalStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Suspended,
    /// Written by older program versions; this client never requests it.
    Deprecated,
}

impl ApprovalStatus {
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::UnderReview => 1,
            Self::Approved => 2,
            Self::Rejected => 3,
            Self::Suspended => 4,
            Self::Deprecated => 5,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0 => Self::Pending,
            1 => Self::UnderReview,
            2 => Self::Approved,
            3 => Self::Rejected,
            4 => Self::Suspended,
            5 => Self::Deprecated,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Suspended => "suspended",
            Self::Deprecated => "deprecated",
        }
    }

    /// Parse the snake_case name used by the CLI and JSON output.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => Self::Pending,
            "under_review" | "under-review" => Self::UnderReview,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "suspended" => Self::Suspended,
            "deprecated" => Self::Deprecated,
            _ => return None,
        })
    }

    /// States that can never change again. `Approved` ends the review but can
    /// still be revoked to `Suspended`, so it is not reported here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Suspended | Self::Deprecated)
    }

    pub(crate) fn read(r: &mut Reader<'_>, field: &'static str) -> CodecResult<Self> {
        let offset = r.offset();
        let tag = r.u8(field)?;
        Self::from_byte(tag).ok_or(CodecError::InvalidTag { field, offset, tag })
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RiskFlags {
    /// Eight one-byte booleans in declaration order.
    pub(crate) fn read(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            has_upgrade_authority: r.bool("has_upgrade_authority")?,
            is_verified_build: r.bool("is_verified_build")?,
            performs_token_transfers: r.bool("performs_token_transfers")?,
            requests_many_accounts: r.bool("requests_many_accounts")?,
            can_block_transfers: r.bool("can_block_transfers")?,
            is_audited: r.bool("is_audited")?,
            source_code_available: r.bool("source_code_available")?,
            follows_best_practices: r.bool("follows_best_practices")?,
        })
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.bool(self.has_upgrade_authority)
            .bool(self.is_verified_build)
            .bool(self.performs_token_transfers)
            .bool(self.requests_many_accounts)
            .bool(self.can_block_transfers)
            .bool(self.is_audited)
            .bool(self.source_code_available)
            .bool(self.follows_best_practices);
    }
}

/// An on-chain account with a fixed leading discriminator and an ordered field layout.
pub trait AccountState: Sized {
    /// Type name hashed into the discriminator.
    const TYPE_NAME: &'static str;

    fn discriminator() -> [u8; 8] {
        account_discriminator(Self::TYPE_NAME)
    }

    fn read_fields(r: &mut Reader<'_>) -> CodecResult<Self>;

    fn write_fields(&self, w: &mut Writer);

    /// Decode account bytes. A mismatched discriminator is fatal; trailing
    /// reserved space after the last field is ignored.
    fn decode(data: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(data);
        let found = r.array::<ACCOUNT_DISCRIMINATOR_LEN>("discriminator")?;
        let expected = Self::discriminator();
        if found != expected {
            return Err(CodecError::DiscriminatorMismatch {
                type_name: Self::TYPE_NAME,
                expected,
                found,
            });
        }
        Self::read_fields(&mut r)
    }

    fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.raw(&Self::discriminator());
        self.write_fields(&mut w);
        w.into_inner()
    }
}
