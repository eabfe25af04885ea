//! Account-state layouts.
//!
//! Field order follows the deployed registry program. Accounts are allocated
//! with reserved tail space, so decoding stops after the last known field and
//! never requires the buffer to be fully consumed.
//!
//! One field is a client extension: `RegistryConfig::max_risk_score` occupies
//! the first byte of the config's reserved tail. Registries initialized
//! without it read back a zero there, which [`RegistryConfig::settings`]
//! treats as "no risk cap".

use solana_program::pubkey::Pubkey;

use crate::codec::{CodecResult, Reader, Writer};
use crate::config::RegistrySettings;
use crate::model::{AccountState, ApprovalStatus};
use crate::risk::RiskFlags;

/// `max_risk_score` value that admits every score.
pub const NO_RISK_CAP: u8 = 101;

/// Registry root configuration, one per registry program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryConfig {
    pub authority: Pubkey,
    /// Approval ratio required by finalization, in basis points.
    pub governance_threshold_bps: u64,
    pub review_period_seconds: u64,
    pub total_submissions: u64,
    pub total_approved: u64,
    pub bump: u8,
    /// Exclusive upper bound on risk score for approval; zero when unset.
    pub max_risk_score: u8,
}

impl AccountState for RegistryConfig {
    const TYPE_NAME: &'static str = "RegistryConfig";

    fn read_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            authority: r.pubkey("authority")?,
            governance_threshold_bps: r.u64("governance_threshold_bps")?,
            review_period_seconds: r.u64("review_period_seconds")?,
            total_submissions: r.u64("total_submissions")?,
            total_approved: r.u64("total_approved")?,
            bump: r.u8("bump")?,
            max_risk_score: if r.remaining() > 0 {
                r.u8("max_risk_score")?
            } else {
                0
            },
        })
    }

    fn write_fields(&self, w: &mut Writer) {
        w.pubkey(&self.authority)
            .u64(self.governance_threshold_bps)
            .u64(self.review_period_seconds)
            .u64(self.total_submissions)
            .u64(self.total_approved)
            .u8(self.bump)
            .u8(self.max_risk_score);
    }
}

impl RegistryConfig {
    /// Governance parameters in effect for finalization.
    pub fn settings(&self) -> RegistrySettings {
        RegistrySettings {
            governance_threshold_bps: self.governance_threshold_bps,
            review_period_seconds: self.review_period_seconds,
            max_risk_score: match self.max_risk_score {
                0 => NO_RISK_CAP,
                n => n,
            },
        }
    }
}

/// The central workflow entity: one per submitted hook program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HookSubmission {
    pub program_id: Pubkey,
    pub submitter: Pubkey,
    pub status: ApprovalStatus,
    pub submitted_at: i64,
    pub review_ends_at: i64,
    pub last_updated_at: i64,
    pub metadata_uri: String,
    pub governance_proposal_id: Option<Pubkey>,
    pub votes_for: u64,
    pub votes_against: u64,
    /// 0-100, higher is riskier.
    pub risk_score: u8,
    pub automated_checks_passed: bool,
    pub bump: u8,
}

impl AccountState for HookSubmission {
    const TYPE_NAME: &'static str = "HookSubmission";

    fn read_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            program_id: r.pubkey("program_id")?,
            submitter: r.pubkey("submitter")?,
            status: ApprovalStatus::read(r, "status")?,
            submitted_at: r.i64("submitted_at")?,
            review_ends_at: r.i64("review_ends_at")?,
            last_updated_at: r.i64("last_updated_at")?,
            metadata_uri: r.string("metadata_uri")?,
            governance_proposal_id: r
                .option("governance_proposal_id", |r| r.pubkey("governance_proposal_id"))?,
            votes_for: r.u64("votes_for")?,
            votes_against: r.u64("votes_against")?,
            risk_score: r.u8("risk_score")?,
            automated_checks_passed: r.bool("automated_checks_passed")?,
            bump: r.u8("bump")?,
        })
    }

    fn write_fields(&self, w: &mut Writer) {
        w.pubkey(&self.program_id)
            .pubkey(&self.submitter)
            .u8(self.status.as_byte())
            .i64(self.submitted_at)
            .i64(self.review_ends_at)
            .i64(self.last_updated_at)
            .string(&self.metadata_uri)
            .option(self.governance_proposal_id.as_ref(), |w, k| {
                w.pubkey(k);
            })
            .u64(self.votes_for)
            .u64(self.votes_against)
            .u8(self.risk_score)
            .bool(self.automated_checks_passed)
            .u8(self.bump);
    }
}

impl HookSubmission {
    pub fn total_votes(&self) -> u64 {
        self.votes_for.saturating_add(self.votes_against)
    }
}

/// Result of an automated risk assessment, one per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskAssessment {
    pub submission: Pubkey,
    pub overall_score: u8,
    pub risk_flags: RiskFlags,
    pub assessed_at: i64,
    pub assessor: Pubkey,
    pub notes: String,
    pub requires_manual_review: bool,
    pub bump: u8,
}

impl AccountState for RiskAssessment {
    const TYPE_NAME: &'static str = "RiskAssessment";

    fn read_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            submission: r.pubkey("submission")?,
            overall_score: r.u8("overall_score")?,
            risk_flags: RiskFlags::read(r)?,
            assessed_at: r.i64("assessed_at")?,
            assessor: r.pubkey("assessor")?,
            notes: r.string("notes")?,
            requires_manual_review: r.bool("requires_manual_review")?,
            bump: r.u8("bump")?,
        })
    }

    fn write_fields(&self, w: &mut Writer) {
        w.pubkey(&self.submission).u8(self.overall_score);
        self.risk_flags.write(w);
        w.i64(self.assessed_at)
            .pubkey(&self.assessor)
            .string(&self.notes)
            .bool(self.requires_manual_review)
            .u8(self.bump);
    }
}

/// One vote per (submission, voter); uniqueness comes from the derived address.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GovernanceVote {
    pub submission: Pubkey,
    pub voter: Pubkey,
    pub vote: bool,
    pub weight: u64,
    pub voted_at: i64,
    pub rationale: String,
    pub bump: u8,
}

impl AccountState for GovernanceVote {
    const TYPE_NAME: &'static str = "GovernanceVote";

    fn read_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            submission: r.pubkey("submission")?,
            voter: r.pubkey("voter")?,
            vote: r.bool("vote")?,
            weight: r.u64("weight")?,
            voted_at: r.i64("voted_at")?,
            rationale: r.string("rationale")?,
            bump: r.u8("bump")?,
        })
    }

    fn write_fields(&self, w: &mut Writer) {
        w.pubkey(&self.submission)
            .pubkey(&self.voter)
            .bool(self.vote)
            .u64(self.weight)
            .i64(self.voted_at)
            .string(&self.rationale)
            .u8(self.bump);
    }
}

/// Badge issued by the consuming pool program for an extension-bearing mint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenBadge {
    pub whirlpools_config: Pubkey,
    pub token_mint: Pubkey,
}

impl AccountState for TokenBadge {
    const TYPE_NAME: &'static str = "TokenBadge";

    fn read_fields(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            whirlpools_config: r.pubkey("whirlpools_config")?,
            token_mint: r.pubkey("token_mint")?,
        })
    }

    fn write_fields(&self, w: &mut Writer) {
        w.pubkey(&self.whirlpools_config).pubkey(&self.token_mint);
    }
}
