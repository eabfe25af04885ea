use anyhow::{anyhow, Result};
use hookreg_core::config::{validate_settings, RegistrySettings};
use hookreg_core::risk::RiskFlags;
use hookreg_solana_client::instructions::registry::Assessment;
use hookreg_solana_client::workflow::BadgeOutcome;
use serde::Serialize;
use solana_sdk::signature::Signature;

use crate::args::{AssessmentArgs, Cli, FlagArgs, VoteChoice};
use crate::context;
use crate::output;

#[derive(Debug, Serialize)]
pub struct TxOut {
    pub ok: bool,
    pub action: &'static str,
    pub signature: String,
    pub at: String,
}

impl TxOut {
    fn new(action: &'static str, signature: &Signature) -> Self {
        Self {
            ok: true,
            action,
            signature: signature.to_string(),
            at: output::now_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    #[serde(flatten)]
    pub tx: TxOut,
    pub hook_program: String,
    pub submission: String,
}

#[derive(Debug, Serialize)]
pub struct AssessOut {
    #[serde(flatten)]
    pub tx: TxOut,
    pub risk_score: u8,
    pub automated_checks_passed: bool,
    pub requires_manual_review: bool,
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct FinalizeOut {
    #[serde(flatten)]
    pub tx: TxOut,
    pub status: String,
    pub expected: String,
    pub votes_for: u64,
    pub votes_against: u64,
}

#[derive(Debug, Serialize)]
pub struct BadgeOut {
    pub ok: bool,
    pub mint: String,
    pub issued: bool,
    pub signature: Option<String>,
}

impl AssessmentArgs {
    /// The direct assessment, if a score was given.
    pub fn to_assessment(&self, risk_flags: RiskFlags) -> Option<Assessment> {
        self.score.map(|risk_score| Assessment {
            risk_score,
            risk_flags,
            automated_checks_passed: self.checks_passed,
            requires_manual_review: self.manual_review,
            notes: self.notes.clone(),
        })
    }
}

impl FlagArgs {
    fn to_flags(&self) -> RiskFlags {
        RiskFlags {
            is_verified_build: self.verified_build,
            performs_token_transfers: self.token_transfers,
            requests_many_accounts: self.many_accounts,
            can_block_transfers: self.can_block,
            is_audited: self.audited,
            source_code_available: self.source_available,
            follows_best_practices: self.best_practices,
            ..RiskFlags::default()
        }
    }
}

pub async fn init(
    cli: &Cli,
    authority: Option<&str>,
    threshold_bps: Option<u64>,
    review_period: Option<u64>,
    max_risk_score: Option<u8>,
) -> Result<()> {
    let defaults = RegistrySettings::default();
    let settings = RegistrySettings {
        governance_threshold_bps: threshold_bps.unwrap_or(defaults.governance_threshold_bps),
        review_period_seconds: review_period.unwrap_or(defaults.review_period_seconds),
        max_risk_score: max_risk_score.unwrap_or(defaults.max_risk_score),
    };
    check_settings(&settings)?;
    let authority = context::opt_pubkey(authority)?;

    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let pb = output::spinner("initializing registry");
    let sig = client.initialize_registry(&signer, authority, &settings).await;
    pb.finish_and_clear();
    output::print(&TxOut::new("init-registry", &sig?))
}

pub async fn submit(cli: &Cli, hook: &str, uri: &str, proposal: Option<&str>) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let proposal = context::opt_pubkey(proposal)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let pb = output::spinner("submitting hook");
    let res = client.submit_hook(&signer, &hook_program, uri, proposal).await;
    pb.finish_and_clear();
    let submitted = res?;
    output::print(&SubmitOut {
        tx: TxOut::new("submit", &submitted.signature),
        hook_program: hook_program.to_string(),
        submission: submitted.submission.to_string(),
    })
}

pub async fn assess(
    cli: &Cli,
    hook: &str,
    direct: &AssessmentArgs,
    flags: &FlagArgs,
) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let pb = output::spinner("assessing risk");
    let res = match direct.to_assessment(flags.to_flags()) {
        Some(a) => client
            .assess_hook_risk(&signer, &hook_program, &a)
            .await
            .map(|sig| (sig, a)),
        None => client
            .assess_with_flags(&signer, &hook_program, flags.to_flags())
            .await
            .map(|assessed| (assessed.signature, Assessment::from_report(&assessed.report, assessed.flags))),
    };
    pb.finish_and_clear();
    let (sig, a) = res?;
    output::print(&AssessOut {
        tx: TxOut::new("assess", &sig),
        risk_score: a.risk_score,
        automated_checks_passed: a.automated_checks_passed,
        requires_manual_review: a.requires_manual_review,
        notes: a.notes,
    })
}

pub async fn begin_review(cli: &Cli, hook: &str, reason: &str) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let sig = client.begin_review(&signer, &hook_program, reason).await?;
    output::print(&TxOut::new("begin-review", &sig))
}

pub async fn reject(cli: &Cli, hook: &str, reason: &str) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let sig = client.reject(&signer, &hook_program, reason).await?;
    output::print(&TxOut::new("reject", &sig))
}

pub async fn suspend(cli: &Cli, hook: &str, reason: &str) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let sig = client.suspend(&signer, &hook_program, reason).await?;
    output::print(&TxOut::new("suspend", &sig))
}

pub async fn vote(cli: &Cli, hook: &str, choice: VoteChoice, rationale: &str) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let sig = client
        .cast_vote(&signer, &hook_program, choice == VoteChoice::For, rationale)
        .await?;
    output::print(&TxOut::new("vote", &sig))
}

pub async fn finalize(cli: &Cli, hook: &str) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let pb = output::spinner("finalizing review");
    let res = client.finalize(&signer, &hook_program).await;
    pb.finish_and_clear();
    let fin = res?;
    if fin.status == fin.expected {
        output::note("ok", &format!("{hook_program} is {}", fin.status));
    } else {
        output::note(
            "warn",
            &format!("{hook_program} is {}, expected {}", fin.status, fin.expected),
        );
    }
    output::print(&FinalizeOut {
        tx: TxOut::new("finalize", &fin.signature),
        status: fin.status.to_string(),
        expected: fin.expected.to_string(),
        votes_for: fin.votes_for,
        votes_against: fin.votes_against,
    })
}

pub async fn badge(
    cli: &Cli,
    hook: &str,
    mint: &str,
    whirlpools_config: Option<&str>,
) -> Result<()> {
    let hook_program = context::hook_program(hook)?;
    let mint = context::pubkey(mint)?;
    let whirlpools_config = context::opt_pubkey(whirlpools_config)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let outcome = client
        .auto_approve_token_badge(&signer, &hook_program, &mint, whirlpools_config)
        .await?;
    let (issued, signature) = match outcome {
        BadgeOutcome::Issued { signature } => (true, Some(signature.to_string())),
        BadgeOutcome::AlreadyIssued => {
            output::note("skip", &format!("badge for {mint} already exists"));
            (false, None)
        }
    };
    output::print(&BadgeOut {
        ok: true,
        mint: mint.to_string(),
        issued,
        signature,
    })
}

/// Settings flags are validated before any network call.
pub fn check_settings(s: &RegistrySettings) -> Result<()> {
    validate_settings(s).map_err(|e| anyhow!("invalid registry settings: {e}"))
}
