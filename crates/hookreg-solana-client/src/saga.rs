//! Token-launch saga.
//!
//! Launching a hooked token is four transactions: create the mint, register
//! the hook's extra accounts, submit the hook to the registry and assess it.
//! `TokenLaunch` records the status of every step so a partial launch (mint
//! created, submission failed) is visible and can be resumed. The record is
//! plain data and serializes to JSON.
//!
//! Resuming never resubmits a create-once step blind: the ledger is probed
//! first and an account that already exists completes the step.

use std::fmt;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{parse_extra_accounts, HookKind};
use crate::config::pubkey_string;
use crate::error::{InputError, RegistryError, RegistryResult};
use crate::instructions::registry::Assessment;
use crate::pda;
use crate::rpc::LedgerRpc;
use crate::signer::TransactionSigner;
use crate::workflow::{MintParams, RegistryClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStep {
    CreateMint,
    InitializeExtraAccountMetas,
    SubmitToRegistry,
    AssessRisk,
}

impl LaunchStep {
    pub const ALL: [LaunchStep; 4] = [
        Self::CreateMint,
        Self::InitializeExtraAccountMetas,
        Self::SubmitToRegistry,
        Self::AssessRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateMint => "create_mint",
            Self::InitializeExtraAccountMetas => "initialize_extra_account_metas",
            Self::SubmitToRegistry => "submit_to_registry",
            Self::AssessRisk => "assess_risk",
        }
    }

    pub fn retry_safety(&self) -> RetrySafety {
        match self {
            Self::CreateMint | Self::InitializeExtraAccountMetas => RetrySafety::CreateOnce,
            Self::SubmitToRegistry | Self::AssessRisk => RetrySafety::Idempotent,
        }
    }
}

impl fmt::Display for LaunchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrySafety {
    /// Creates an account owned by this launch. A second commit fails if the
    /// first landed, so the ledger is probed before any resubmission.
    CreateOnce,
    /// Satisfied by an existing registry record, whoever created it.
    Idempotent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    /// `signature` is absent when the step was found already done on the ledger.
    Completed { signature: Option<String> },
    Skipped { reason: String },
    /// The record this step creates already exists but belongs to `submitter`.
    SubmittedByOther { submitter: String },
    /// Sent but not confirmed in time; probed again on resume.
    Unconfirmed { signature: String },
    Failed { error: String, kind: String },
}

impl StepStatus {
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Skipped { .. } | Self::SubmittedByOther { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: LaunchStep,
    pub safety: RetrySafety,
    pub status: StepStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// What to launch. Registry steps are skipped when no metadata URI is given;
/// assessment is skipped when no assessment is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub hook: HookKind,
    pub decimals: u8,
    pub initial_supply: u64,
    #[serde(default)]
    pub metadata_uri: Option<String>,
    #[serde(default)]
    pub assessment: Option<Assessment>,
    /// Extra accounts in text form (see [`crate::catalog::parse_extra_account`]);
    /// empty means the hook's catalogued list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_accounts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLaunch {
    pub id: Uuid,
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    pub plan: LaunchPlan,
    pub steps: Vec<StepRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

enum Outcome {
    Done(Signature),
    Skip(String),
    Foreign(Pubkey),
}

impl TokenLaunch {
    pub fn new(mint: Pubkey, plan: LaunchPlan) -> Self {
        let now = OffsetDateTime::now_utc();
        let steps = LaunchStep::ALL
            .iter()
            .map(|&step| StepRecord {
                step,
                safety: step.retry_safety(),
                status: StepStatus::Pending,
                updated_at: now,
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            mint,
            plan,
            steps,
            created_at: now,
        }
    }

    pub fn from_json(s: &str) -> Result<Self, InputError> {
        serde_json::from_str(s).map_err(|e| InputError::Other(format!("launch record: {e}")))
    }

    pub fn to_json(&self) -> Result<String, InputError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InputError::Other(format!("launch record: {e}")))
    }

    pub fn status(&self, step: LaunchStep) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|r| r.status.is_done())
    }

    fn set(&mut self, step: LaunchStep, status: StepStatus) {
        if let Some(record) = self.steps.iter_mut().find(|r| r.step == step) {
            record.status = status;
            record.updated_at = OffsetDateTime::now_utc();
        }
    }

    /// Run every step that is not done, in order, stopping at the first
    /// failure. The same call resumes a partially completed launch.
    ///
    /// `mint` must be the keypair whose address the record was created for;
    /// it is only used if the mint still has to be created.
    pub async fn run<R: LedgerRpc>(
        &mut self,
        client: &RegistryClient<R>,
        signer: &dyn TransactionSigner,
        mint: &Keypair,
    ) -> RegistryResult<()> {
        if mint.pubkey() != self.mint {
            return Err(InputError::Other(format!(
                "launch {} is for mint {}, got keypair for {}",
                self.id,
                self.mint,
                mint.pubkey()
            ))
            .into());
        }

        for step in LaunchStep::ALL {
            let Some(status) = self.status(step).cloned() else {
                continue;
            };
            if status.is_done() {
                continue;
            }

            if step.retry_safety() == RetrySafety::CreateOnce {
                if self.found_on_ledger(client, step).await? {
                    info!(launch = %self.id, step = %step, "step found complete on ledger");
                    let signature = match status {
                        StepStatus::Unconfirmed { signature } => Some(signature),
                        _ => None,
                    };
                    self.set(step, StepStatus::Completed { signature });
                    continue;
                }
            }

            match self.execute(client, signer, mint, step).await {
                Ok(Outcome::Done(signature)) => {
                    info!(launch = %self.id, step = %step, "step completed");
                    self.set(
                        step,
                        StepStatus::Completed {
                            signature: Some(signature.to_string()),
                        },
                    );
                }
                Ok(Outcome::Skip(reason)) => {
                    info!(launch = %self.id, step = %step, %reason, "step skipped");
                    self.set(step, StepStatus::Skipped { reason });
                }
                Ok(Outcome::Foreign(submitter)) => {
                    warn!(launch = %self.id, step = %step, submitter = %submitter, "record belongs to another signer");
                    self.set(
                        step,
                        StepStatus::SubmittedByOther {
                            submitter: submitter.to_string(),
                        },
                    );
                }
                Err(RegistryError::Unconfirmed { signature }) => {
                    warn!(launch = %self.id, step = %step, signature = %signature, "step unconfirmed");
                    self.set(
                        step,
                        StepStatus::Unconfirmed {
                            signature: signature.to_string(),
                        },
                    );
                    return Err(RegistryError::Unconfirmed { signature });
                }
                Err(e) => {
                    warn!(launch = %self.id, step = %step, error = %e, "step failed");
                    self.set(
                        step,
                        StepStatus::Failed {
                            error: e.to_string(),
                            kind: e.kind().to_string(),
                        },
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Whether the account a create-once step produces already exists.
    async fn found_on_ledger<R: LedgerRpc>(
        &self,
        client: &RegistryClient<R>,
        step: LaunchStep,
    ) -> RegistryResult<bool> {
        let query = client.query();
        match step {
            LaunchStep::CreateMint => Ok(query.mint(&self.mint).await?.is_some()),
            LaunchStep::InitializeExtraAccountMetas => {
                query
                    .extra_account_metas_exists(&self.plan.hook.program_id(), &self.mint)
                    .await
            }
            // Idempotent steps settle an existing record when executed.
            LaunchStep::SubmitToRegistry | LaunchStep::AssessRisk => Ok(false),
        }
    }

    async fn execute<R: LedgerRpc>(
        &self,
        client: &RegistryClient<R>,
        signer: &dyn TransactionSigner,
        mint: &Keypair,
        step: LaunchStep,
    ) -> RegistryResult<Outcome> {
        let hook = self.plan.hook;
        let hook_program = hook.program_id();
        match step {
            LaunchStep::CreateMint => {
                let params = MintParams {
                    hook,
                    decimals: self.plan.decimals,
                    initial_supply: self.plan.initial_supply,
                    freeze_authority: None,
                };
                let sig = client.create_extension_mint(signer, mint, &params).await?;
                Ok(Outcome::Done(sig))
            }
            LaunchStep::InitializeExtraAccountMetas => {
                let metas = parse_extra_accounts(&self.plan.extra_accounts)?;
                let sig = client
                    .initialize_extra_account_metas(signer, hook, &self.mint, metas.as_deref())
                    .await?;
                Ok(Outcome::Done(sig))
            }
            LaunchStep::SubmitToRegistry => {
                let Some(uri) = self.plan.metadata_uri.as_deref() else {
                    return Ok(Outcome::Skip("no metadata uri".to_string()));
                };
                match client.submit_hook(signer, &hook_program, uri, None).await {
                    Ok(s) => Ok(Outcome::Done(s.signature)),
                    Err(RegistryError::AlreadySubmitted { .. }) => {
                        let me = signer.pubkey()?;
                        match client.query().submission(&hook_program).await? {
                            Some(existing) if existing.submitter != me => {
                                Ok(Outcome::Foreign(existing.submitter))
                            }
                            _ => Ok(Outcome::Skip(format!("hook {hook_program} already submitted"))),
                        }
                    }
                    Err(e) => Err(e),
                }
            }
            LaunchStep::AssessRisk => {
                if self.plan.metadata_uri.is_none() {
                    return Ok(Outcome::Skip("hook not submitted".to_string()));
                }
                if let Some(StepStatus::SubmittedByOther { submitter }) =
                    self.status(LaunchStep::SubmitToRegistry)
                {
                    return Ok(Outcome::Skip(format!("submission belongs to {submitter}")));
                }
                let Some(assessment) = &self.plan.assessment else {
                    return Ok(Outcome::Skip("no assessment".to_string()));
                };
                match client.assess_hook_risk(signer, &hook_program, assessment).await {
                    Ok(sig) => Ok(Outcome::Done(sig)),
                    Err(RegistryError::AlreadyAssessed { submission }) => {
                        Ok(Outcome::Skip(format!("submission {submission} already assessed")))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Where the hook's extra account metas live for this launch.
    pub fn extra_account_metas_address(&self) -> RegistryResult<Pubkey> {
        pda::derive_extra_account_metas(&self.plan.hook.program_id(), &self.mint).map(|(a, _)| a)
    }
}
