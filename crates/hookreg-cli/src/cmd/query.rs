use anyhow::{anyhow, Result};
use hookreg_solana_client::{pda, ClientConfig};
use serde::Serialize;

use crate::args::Cli;
use crate::context;
use crate::output;

#[derive(Debug, Serialize)]
pub struct StatusOut {
    pub submission: String,
    pub hook_program: String,
    pub submitter: String,
    pub status: String,
    pub metadata_uri: String,
    pub governance_proposal_id: Option<String>,
    pub submitted_at: i64,
    pub review_ends_at: i64,
    pub ledger_time: i64,
    pub review_open: bool,
    pub votes_for: u64,
    pub votes_against: u64,
    pub approval_bps: Option<u64>,
    pub risk_score: u8,
    pub risk_band: String,
    pub automated_checks_passed: bool,
    pub assessment: Option<AssessmentOut>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentOut {
    pub assessor: String,
    pub assessed_at: i64,
    pub requires_manual_review: bool,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct RegistryOut {
    pub address: String,
    pub authority: String,
    pub governance_threshold_bps: u64,
    pub review_period_seconds: u64,
    pub max_risk_score: u8,
    pub total_submissions: u64,
    pub total_approved: u64,
}

#[derive(Debug, Serialize)]
pub struct MintOut {
    pub mint: String,
    pub decimals: u8,
    pub supply: u64,
    pub mint_authority: Option<String>,
    pub hook_program: Option<String>,
    pub whirlpools_config: String,
    pub badge_approved: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgramOut {
    pub program_id: String,
    pub owner: String,
    pub executable: bool,
    pub upgradeable: bool,
    pub upgrade_authority: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeriveOut {
    pub hook_program: String,
    pub registry_config: String,
    pub submission: String,
    pub risk_assessment: String,
    pub vote: Option<String>,
    pub extra_account_metas: Option<String>,
    pub token_badge: Option<String>,
}

pub async fn status(cli: &Cli, hook: &str) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let query = client.query();
    let overview = query
        .hook_overview(&hook_program)
        .await?
        .ok_or_else(|| anyhow!("hook {hook_program} has no submission"))?;
    let now = query.ledger_time().await?;

    let s = &overview.submission;
    output::print(&StatusOut {
        submission: overview.address.to_string(),
        hook_program: s.program_id.to_string(),
        submitter: s.submitter.to_string(),
        status: s.status.to_string(),
        metadata_uri: s.metadata_uri.clone(),
        governance_proposal_id: s.governance_proposal_id.map(|p| p.to_string()),
        submitted_at: s.submitted_at,
        review_ends_at: s.review_ends_at,
        ledger_time: now,
        review_open: now < s.review_ends_at,
        votes_for: s.votes_for,
        votes_against: s.votes_against,
        approval_bps: overview.approval_bps,
        risk_score: s.risk_score,
        risk_band: overview.risk_band.to_string(),
        automated_checks_passed: s.automated_checks_passed,
        assessment: overview.assessment.as_ref().map(|a| AssessmentOut {
            assessor: a.assessor.to_string(),
            assessed_at: a.assessed_at,
            requires_manual_review: a.requires_manual_review,
            notes: a.notes.clone(),
        }),
    })
}

pub async fn registry(cli: &Cli) -> Result<()> {
    let client = context::client(cli)?;
    let (address, _) = pda::derive_registry_config(&client.programs().registry)?;
    let cfg = client
        .query()
        .registry_config()
        .await?
        .ok_or_else(|| anyhow!("registry {address} is not initialized"))?;
    output::print(&RegistryOut {
        address: address.to_string(),
        authority: cfg.authority.to_string(),
        governance_threshold_bps: cfg.governance_threshold_bps,
        review_period_seconds: cfg.review_period_seconds,
        max_risk_score: cfg.settings().max_risk_score,
        total_submissions: cfg.total_submissions,
        total_approved: cfg.total_approved,
    })
}

pub async fn mint(cli: &Cli, mint: &str, whirlpools_config: Option<&str>) -> Result<()> {
    let mint = context::pubkey(mint)?;
    let client = context::client(cli)?;
    let whirlpools_config =
        context::opt_pubkey(whirlpools_config)?.unwrap_or(client.config().whirlpools_config);
    let query = client.query();
    let view = query
        .mint(&mint)
        .await?
        .ok_or_else(|| anyhow!("mint {mint} not found"))?;
    let badge = query.badge_status(&whirlpools_config, &mint).await?;
    output::print(&MintOut {
        mint: mint.to_string(),
        decimals: view.decimals,
        supply: view.supply,
        mint_authority: view.mint_authority.map(|k| k.to_string()),
        hook_program: badge.hook_program.map(|k| k.to_string()),
        whirlpools_config: whirlpools_config.to_string(),
        badge_approved: badge.approved,
    })
}

pub async fn program(cli: &Cli, program: &str) -> Result<()> {
    let program_id = context::pubkey(program)?;
    let client = context::client(cli)?;
    let info = client
        .query()
        .inspect_program(&program_id)
        .await?
        .ok_or_else(|| anyhow!("program {program_id} not found"))?;
    output::print(&ProgramOut {
        program_id: info.program_id.to_string(),
        owner: info.owner.to_string(),
        executable: info.executable,
        upgradeable: info.upgradeable,
        upgrade_authority: info.upgrade_authority.map(|k| k.to_string()),
    })
}

pub fn derive(cli: &Cli, hook: &str, voter: Option<&str>, mint: Option<&str>) -> Result<()> {
    let cfg = context::load_config(cli)?;
    output::print(&derive_all(&cfg, hook, voter, mint)?)
}

fn derive_all(
    cfg: &ClientConfig,
    hook: &str,
    voter: Option<&str>,
    mint: Option<&str>,
) -> Result<DeriveOut> {
    let hook_program = context::hook_program(hook)?;
    let registry = cfg.programs.registry;
    let pdas = pda::pdas_for_hook(&registry, &hook_program)?;
    let submission = pdas.submission.0;

    let vote = match context::opt_pubkey(voter)? {
        Some(v) => Some(pda::derive_vote(&registry, &submission, &v)?.0.to_string()),
        None => None,
    };
    let (extra_account_metas, token_badge) = match context::opt_pubkey(mint)? {
        Some(m) => (
            Some(pda::derive_extra_account_metas(&hook_program, &m)?.0.to_string()),
            Some(
                pda::derive_token_badge(&cfg.programs.whirlpool, &cfg.whirlpools_config, &m)?
                    .0
                    .to_string(),
            ),
        ),
        None => (None, None),
    };

    Ok(DeriveOut {
        hook_program: hook_program.to_string(),
        registry_config: pdas.registry_config.0.to_string(),
        submission: submission.to_string(),
        risk_assessment: pdas.risk_assessment.0.to_string(),
        vote,
        extra_account_metas,
        token_badge,
    })
}

pub fn config(cli: &Cli) -> Result<()> {
    let cfg = context::load_config(cli)?;
    output::print(&cfg)
}
