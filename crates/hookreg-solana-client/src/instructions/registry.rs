//! Registry program instructions.

use hookreg_core::config::{validate_settings, RegistrySettings};
use hookreg_core::model::{ApprovalStatus, RegistryInstruction};
use hookreg_core::risk::{RiskFlags, RiskReport};
use serde::{Deserialize, Serialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::system_program;
use tracing::debug;

use super::{readonly, signer_readonly, signer_writable, writable};
use crate::error::{InputError, RegistryResult};
use crate::pda;

/// Values written by an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub risk_score: u8,
    /// Stored next to the score. Records written before flags were tracked
    /// read back as the conservative default.
    #[serde(default)]
    pub risk_flags: RiskFlags,
    pub automated_checks_passed: bool,
    pub requires_manual_review: bool,
    pub notes: String,
}

impl Assessment {
    /// The assessment scored from `flags`.
    pub fn from_report(report: &RiskReport, flags: RiskFlags) -> Self {
        Self {
            risk_score: report.score,
            risk_flags: flags,
            automated_checks_passed: report.automated_checks_passed,
            requires_manual_review: report.requires_manual_review,
            notes: report.notes.clone(),
        }
    }
}

fn build(
    program_id: &Pubkey,
    ix: RegistryInstruction,
    accounts: Vec<AccountMeta>,
) -> RegistryResult<Instruction> {
    ix.validate()?;
    debug!(
        instruction = ix.name(),
        program_id = %program_id,
        accounts = accounts.len(),
        "built registry instruction"
    );
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: ix.encode(),
    })
}

/// Accounts: registry_config(w), payer(s,w), system.
pub fn initialize_registry(
    registry_program: &Pubkey,
    payer: &Pubkey,
    authority: &Pubkey,
    settings: &RegistrySettings,
) -> RegistryResult<Instruction> {
    validate_settings(settings).map_err(InputError::from)?;
    let (config, _) = pda::derive_registry_config(registry_program)?;
    build(
        registry_program,
        RegistryInstruction::InitializeRegistry {
            authority: *authority,
            governance_threshold_bps: settings.governance_threshold_bps,
            review_period_seconds: settings.review_period_seconds,
            max_risk_score: settings.max_risk_score,
        },
        vec![
            writable(config),
            signer_writable(*payer),
            readonly(system_program::id()),
        ],
    )
}

/// Accounts: registry_config(w), submission(w), submitter(s,w), system, hook_program.
pub fn submit_hook_for_approval(
    registry_program: &Pubkey,
    submitter: &Pubkey,
    hook_program: &Pubkey,
    metadata_uri: &str,
    governance_proposal_id: Option<Pubkey>,
) -> RegistryResult<Instruction> {
    let pdas = pda::pdas_for_hook(registry_program, hook_program)?;
    build(
        registry_program,
        RegistryInstruction::SubmitHookForApproval {
            program_id: *hook_program,
            metadata_uri: metadata_uri.to_string(),
            governance_proposal_id,
        },
        vec![
            writable(pdas.registry_config.0),
            writable(pdas.submission.0),
            signer_writable(*submitter),
            readonly(system_program::id()),
            readonly(*hook_program),
        ],
    )
}

/// Accounts: submission(w), risk_assessment(w), hook_program, assessor(s,w), system.
pub fn assess_hook_risk(
    registry_program: &Pubkey,
    assessor: &Pubkey,
    hook_program: &Pubkey,
    assessment: &Assessment,
) -> RegistryResult<Instruction> {
    if assessment.risk_score > 100 {
        return Err(InputError::RiskScore(assessment.risk_score).into());
    }
    let pdas = pda::pdas_for_hook(registry_program, hook_program)?;
    build(
        registry_program,
        RegistryInstruction::AssessHookRisk {
            risk_score: assessment.risk_score,
            risk_flags: assessment.risk_flags,
            automated_checks_passed: assessment.automated_checks_passed,
            requires_manual_review: assessment.requires_manual_review,
            notes: assessment.notes.clone(),
        },
        vec![
            writable(pdas.submission.0),
            writable(pdas.risk_assessment.0),
            readonly(*hook_program),
            signer_writable(*assessor),
            readonly(system_program::id()),
        ],
    )
}

/// Accounts: submission(w), vote_record(w), voter(s,w), system.
pub fn cast_governance_vote(
    registry_program: &Pubkey,
    voter: &Pubkey,
    hook_program: &Pubkey,
    vote: bool,
    rationale: &str,
) -> RegistryResult<Instruction> {
    let (submission, _) = pda::derive_submission(registry_program, hook_program)?;
    let (vote_record, _) = pda::derive_vote(registry_program, &submission, voter)?;
    build(
        registry_program,
        RegistryInstruction::CastGovernanceVote {
            vote,
            rationale: rationale.to_string(),
        },
        vec![
            writable(submission),
            writable(vote_record),
            signer_writable(*voter),
            readonly(system_program::id()),
        ],
    )
}

/// Accounts: registry_config, submission(w), risk_assessment, finalizer(s).
pub fn finalize_hook_approval(
    registry_program: &Pubkey,
    finalizer: &Pubkey,
    hook_program: &Pubkey,
) -> RegistryResult<Instruction> {
    let pdas = pda::pdas_for_hook(registry_program, hook_program)?;
    build(
        registry_program,
        RegistryInstruction::FinalizeHookApproval,
        vec![
            readonly(pdas.registry_config.0),
            writable(pdas.submission.0),
            readonly(pdas.risk_assessment.0),
            signer_readonly(*finalizer),
        ],
    )
}

/// Accounts: registry_config, submission(w), authority(s).
pub fn update_hook_status(
    registry_program: &Pubkey,
    authority: &Pubkey,
    hook_program: &Pubkey,
    new_status: ApprovalStatus,
    reason: &str,
) -> RegistryResult<Instruction> {
    let pdas = pda::pdas_for_hook(registry_program, hook_program)?;
    build(
        registry_program,
        RegistryInstruction::UpdateHookStatus {
            new_status,
            reason: reason.to_string(),
        },
        vec![
            readonly(pdas.registry_config.0),
            writable(pdas.submission.0),
            signer_readonly(*authority),
        ],
    )
}

/// Addresses involved in issuing a whirlpool token badge.
#[derive(Debug, Clone, Copy)]
pub struct BadgeAccounts {
    pub whirlpool_program: Pubkey,
    pub whirlpools_config: Pubkey,
    pub token_mint: Pubkey,
    pub hook_program: Pubkey,
    pub payer: Pubkey,
    pub badge_authority: Pubkey,
}

/// Accounts: submission, token_mint, whirlpools_config(w), token_badge(w),
/// config_extension, payer(s,w), badge_authority(s), whirlpool_program, system.
pub fn auto_approve_token_badge(
    registry_program: &Pubkey,
    a: &BadgeAccounts,
) -> RegistryResult<Instruction> {
    let (submission, _) = pda::derive_submission(registry_program, &a.hook_program)?;
    let (badge, _) =
        pda::derive_token_badge(&a.whirlpool_program, &a.whirlpools_config, &a.token_mint)?;
    let (extension, _) = pda::derive_config_extension(&a.whirlpool_program, &a.whirlpools_config)?;

    let accounts = vec![
        readonly(submission),
        readonly(a.token_mint),
        writable(a.whirlpools_config),
        writable(badge),
        readonly(extension),
        signer_writable(a.payer),
        signer_readonly(a.badge_authority),
        readonly(a.whirlpool_program),
        readonly(system_program::id()),
    ];
    build(
        registry_program,
        RegistryInstruction::AutoApproveTokenBadge {
            whirlpools_config: a.whirlpools_config,
            token_mint: a.token_mint,
        },
        accounts,
    )
}
