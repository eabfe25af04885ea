use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use hookreg_core::risk::RiskFlags;
use hookreg_solana_client::catalog::parse_extra_accounts;
use hookreg_solana_client::{LaunchPlan, StepStatus, TokenLaunch};
use serde::Serialize;
use solana_sdk::signature::Signer;
use tracing::info;

use crate::args::{AssessmentArgs, Cli, MintArgs};
use crate::context;
use crate::output;

#[derive(Debug, Serialize)]
pub struct StepOut {
    pub step: String,
    pub state: String,
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LaunchOut {
    pub ok: bool,
    pub id: String,
    pub mint: String,
    pub complete: bool,
    pub record: String,
    pub steps: Vec<StepOut>,
}

pub async fn run(
    cli: &Cli,
    record: &str,
    mint_keypair: &str,
    mint_args: &MintArgs,
    uri: Option<&str>,
    assessment: &AssessmentArgs,
    extra_accounts: &[String],
) -> Result<()> {
    let record_path = Path::new(record);
    let (mut launch, mint) = if record_path.exists() {
        let raw = fs::read_to_string(record_path)
            .with_context(|| format!("reading launch record {record}"))?;
        let launch = TokenLaunch::from_json(&raw)?;
        let keypair_path = Path::new(mint_keypair);
        if !keypair_path.exists() {
            return Err(anyhow!(
                "launch {} needs the mint keypair at {mint_keypair}",
                launch.id
            ));
        }
        let (mint, _) = context::load_or_create_keypair(keypair_path)?;
        info!(launch = %launch.id, mint = %launch.mint, "resuming launch");
        (launch, mint)
    } else {
        parse_extra_accounts(extra_accounts)?;
        let (mint, _) = context::load_or_create_keypair(Path::new(mint_keypair))?;
        let plan = LaunchPlan {
            hook: mint_args.hook_kind()?,
            decimals: mint_args.decimals,
            initial_supply: mint_args.supply,
            metadata_uri: uri.map(str::to_string),
            assessment: assessment.to_assessment(RiskFlags::default()),
            extra_accounts: extra_accounts.to_vec(),
        };
        let launch = TokenLaunch::new(mint.pubkey(), plan);
        save(record_path, &launch)?;
        info!(launch = %launch.id, mint = %launch.mint, "starting launch");
        (launch, mint)
    };

    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let pb = output::spinner("launching");
    let res = launch.run(&client, &signer, &mint).await;
    pb.finish_and_clear();
    // The record is written whatever the outcome so a later run resumes.
    save(record_path, &launch)?;
    res?;

    output::note("ok", &format!("launch {} complete", launch.id));
    output::print(&summarize(&launch, record))
}

fn save(path: &Path, launch: &TokenLaunch) -> Result<()> {
    let json = launch.to_json()?;
    fs::write(path, json).with_context(|| format!("writing launch record {}", path.display()))
}

fn summarize(launch: &TokenLaunch, record: &str) -> LaunchOut {
    let steps = launch
        .steps
        .iter()
        .map(|r| {
            let (state, detail) = match &r.status {
                StepStatus::Pending => ("pending", None),
                StepStatus::Completed { signature } => ("completed", signature.clone()),
                StepStatus::Skipped { reason } => ("skipped", Some(reason.clone())),
                StepStatus::SubmittedByOther { submitter } => {
                    ("submitted_by_other", Some(submitter.clone()))
                }
                StepStatus::Unconfirmed { signature } => ("unconfirmed", Some(signature.clone())),
                StepStatus::Failed { error, .. } => ("failed", Some(error.clone())),
            };
            StepOut {
                step: r.step.to_string(),
                state: state.to_string(),
                detail,
            }
        })
        .collect();
    LaunchOut {
        ok: launch.is_complete(),
        id: launch.id.to_string(),
        mint: launch.mint.to_string(),
        complete: launch.is_complete(),
        record: record.to_string(),
        steps,
    }
}
