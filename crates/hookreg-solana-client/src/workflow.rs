//! Registry workflow engine.
//!
//! `RegistryClient` threads an explicit ledger connection and signer through
//! every operation; there is no process-wide wallet or connection. Each
//! operation validates its input, pre-checks the submission state against the
//! ledger (deadlines use ledger time), submits one transaction and maps a
//! commit-time "account already in use" to the create's state error. Nothing
//! is retried here.

use hookreg_core::config::RegistrySettings;
use hookreg_core::model::{ApprovalStatus, HookSubmission};
use hookreg_core::risk::{RiskFlags, RiskReport};
use hookreg_core::rules;
use serde::Serialize;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_transfer_hook_interface::offchain::{add_extra_account_metas_for_execute, AccountFetchError};
use tracing::{debug, info, warn};

use crate::catalog::{ExtraAccountMeta, HookKind};
use crate::config::{ClientConfig, ProgramIds};
use crate::error::{RegistryError, RegistryResult};
use crate::instructions::pool::{self, PoolSpec, SwapSpec, TransferLeg};
use crate::instructions::registry::{self, Assessment, BadgeAccounts};
use crate::instructions::token::{self, MintSpec};
use crate::pda;
use crate::query::LedgerQuery;
use crate::rpc::{CommitFailure, LedgerRpc, RpcError};
use crate::signer::TransactionSigner;
use crate::submitter::{SubmitRequest, Submitter};

/// A confirmed hook submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub signature: Signature,
    pub submission: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessed {
    pub signature: Signature,
    /// Flags as submitted, with the upgrade authority read from the ledger.
    pub flags: RiskFlags,
    pub report: RiskReport,
}

/// Outcome of finalization, read back from the ledger after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Finalized {
    pub signature: Signature,
    /// Status the tally and registry settings called for before commit.
    pub expected: ApprovalStatus,
    pub status: ApprovalStatus,
    pub votes_for: u64,
    pub votes_against: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BadgeOutcome {
    Issued { signature: Signature },
    /// The badge already existed; nothing was sent or the racing create lost.
    AlreadyIssued,
}

/// Parameters of a new hooked mint; the signer is the mint authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintParams {
    pub hook: HookKind,
    pub decimals: u8,
    pub initial_supply: u64,
    pub freeze_authority: Option<Pubkey>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolParams {
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub fee_tier: u16,
    pub initial_price: f64,
    pub initial_liquidity_a: u64,
    pub initial_liquidity_b: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolCreated {
    pub signature: Signature,
    pub whirlpool: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub whirlpool: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub amount: u64,
    pub other_amount_threshold: u64,
    pub a_to_b: bool,
}

/// Replace a commit-time "already in use" rejection with `on_conflict`.
fn map_conflict<T>(
    res: RegistryResult<T>,
    on_conflict: impl FnOnce() -> RegistryResult<T>,
) -> RegistryResult<T> {
    match res {
        Err(RegistryError::Rejected {
            signature,
            failure: CommitFailure::AccountInUse,
        }) => {
            warn!(signature = %signature, "create lost to an existing account");
            on_conflict()
        }
        other => other,
    }
}

#[derive(Debug)]
pub struct RegistryClient<R> {
    rpc: R,
    config: ClientConfig,
}

impl<R: LedgerRpc> RegistryClient<R> {
    pub fn new(rpc: R, config: ClientConfig) -> Self {
        Self { rpc, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn programs(&self) -> &ProgramIds {
        &self.config.programs
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn query(&self) -> LedgerQuery<'_, R> {
        LedgerQuery::new(&self.rpc, self.config.programs)
    }

    async fn submit(
        &self,
        signer: &dyn TransactionSigner,
        calls: Vec<Instruction>,
        co_signers: &[&Keypair],
    ) -> RegistryResult<Signature> {
        let fee_payer = signer.pubkey()?;
        let req = SubmitRequest::new(calls, fee_payer).with_co_signers(co_signers);
        Submitter::new(&self.rpc, self.config.confirm)
            .submit(req, signer)
            .await
    }

    async fn require_submission(
        &self,
        hook_program: &Pubkey,
    ) -> RegistryResult<(Pubkey, HookSubmission)> {
        let (address, _) = pda::derive_submission(&self.config.programs.registry, hook_program)?;
        let submission = self
            .query()
            .fetch::<HookSubmission>(&address)
            .await?
            .ok_or(RegistryError::NotFound {
                what: "hook submission",
                address,
            })?;
        Ok((address, submission))
    }

    /// One-time creation of the registry root. `authority` defaults to the signer.
    pub async fn initialize_registry(
        &self,
        signer: &dyn TransactionSigner,
        authority: Option<Pubkey>,
        settings: &RegistrySettings,
    ) -> RegistryResult<Signature> {
        let payer = signer.pubkey()?;
        let authority = authority.unwrap_or(payer);
        let registry = self.config.programs.registry;
        let ix = registry::initialize_registry(&registry, &payer, &authority, settings)?;

        let (address, _) = pda::derive_registry_config(&registry)?;
        let already = || RegistryError::AlreadyInitialized {
            what: "registry config",
            address,
        };
        if self.query().exists(&address).await? {
            return Err(already());
        }

        let res = self.submit(signer, vec![ix], &[]).await;
        let signature = map_conflict(res, || Err(already()))?;
        info!(registry_config = %address, authority = %authority, "registry initialized");
        Ok(signature)
    }

    /// Create a `Pending` submission for an executable hook program.
    pub async fn submit_hook(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        metadata_uri: &str,
        governance_proposal_id: Option<Pubkey>,
    ) -> RegistryResult<Submitted> {
        let submitter = signer.pubkey()?;
        let registry = self.config.programs.registry;
        let ix = registry::submit_hook_for_approval(
            &registry,
            &submitter,
            hook_program,
            metadata_uri,
            governance_proposal_id,
        )?;

        let (submission, _) = pda::derive_submission(&registry, hook_program)?;
        let query = self.query();
        if query.exists(&submission).await? {
            return Err(RegistryError::AlreadySubmitted {
                program_id: *hook_program,
            });
        }
        match query.inspect_program(hook_program).await? {
            Some(info) if info.executable => {
                debug!(program_id = %hook_program, upgradeable = info.upgradeable, "hook program inspected");
            }
            _ => {
                return Err(RegistryError::ProgramNotExecutable {
                    program_id: *hook_program,
                })
            }
        }

        let res = self.submit(signer, vec![ix], &[]).await;
        let signature = map_conflict(res, || {
            Err(RegistryError::AlreadySubmitted {
                program_id: *hook_program,
            })
        })?;
        info!(program_id = %hook_program, submission = %submission, "hook submitted");
        Ok(Submitted {
            signature,
            submission,
        })
    }

    /// Record a risk assessment. Status is not changed.
    pub async fn assess_hook_risk(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        assessment: &Assessment,
    ) -> RegistryResult<Signature> {
        let assessor = signer.pubkey()?;
        let registry = self.config.programs.registry;
        let ix = registry::assess_hook_risk(&registry, &assessor, hook_program, assessment)?;

        let (address, submission) = self.require_submission(hook_program).await?;
        rules::check_assessment(&submission)
            .map_err(|e| RegistryError::from_transition(address, e))?;
        let (record, _) = pda::derive_risk_assessment(&registry, &address)?;
        let already = || RegistryError::AlreadyAssessed {
            submission: address,
        };
        if self.query().exists(&record).await? {
            return Err(already());
        }

        let res = self.submit(signer, vec![ix], &[]).await;
        let signature = map_conflict(res, || Err(already()))?;
        info!(
            submission = %address,
            risk_score = assessment.risk_score,
            automated_checks_passed = assessment.automated_checks_passed,
            "risk assessed"
        );
        Ok(signature)
    }

    /// Score `flags` and assess. The upgrade-authority flag is taken from the
    /// ledger rather than from the caller.
    pub async fn assess_with_flags(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        mut flags: RiskFlags,
    ) -> RegistryResult<Assessed> {
        let info = self
            .query()
            .inspect_program(hook_program)
            .await?
            .ok_or(RegistryError::ProgramNotExecutable {
                program_id: *hook_program,
            })?;
        flags.has_upgrade_authority = info.has_upgrade_authority();
        let report = flags.report();
        let signature = self
            .assess_hook_risk(signer, hook_program, &Assessment::from_report(&report, flags))
            .await?;
        Ok(Assessed {
            signature,
            flags,
            report,
        })
    }

    /// Authority-only status change; see [`rules::check_status_update`].
    pub async fn update_hook_status(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        new_status: ApprovalStatus,
        reason: &str,
    ) -> RegistryResult<Signature> {
        let authority = signer.pubkey()?;
        let ix = registry::update_hook_status(
            &self.config.programs.registry,
            &authority,
            hook_program,
            new_status,
            reason,
        )?;

        let (address, submission) = self.require_submission(hook_program).await?;
        rules::check_status_update(submission.status, new_status)
            .map_err(|e| RegistryError::from_transition(address, e))?;

        let signature = self.submit(signer, vec![ix], &[]).await?;
        info!(
            submission = %address,
            from = %submission.status,
            to = %new_status,
            "status updated"
        );
        Ok(signature)
    }

    /// `Pending` to `UnderReview`; opens the vote window.
    pub async fn begin_review(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        reason: &str,
    ) -> RegistryResult<Signature> {
        self.update_hook_status(signer, hook_program, ApprovalStatus::UnderReview, reason)
            .await
    }

    pub async fn reject(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        reason: &str,
    ) -> RegistryResult<Signature> {
        self.update_hook_status(signer, hook_program, ApprovalStatus::Rejected, reason)
            .await
    }

    /// Revoke an approved hook.
    pub async fn suspend(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        reason: &str,
    ) -> RegistryResult<Signature> {
        self.update_hook_status(signer, hook_program, ApprovalStatus::Suspended, reason)
            .await
    }

    pub async fn cast_vote(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        vote: bool,
        rationale: &str,
    ) -> RegistryResult<Signature> {
        let voter = signer.pubkey()?;
        let registry = self.config.programs.registry;
        let ix = registry::cast_governance_vote(&registry, &voter, hook_program, vote, rationale)?;

        let (address, submission) = self.require_submission(hook_program).await?;
        let now = self.query().ledger_time().await?;
        rules::check_vote(&submission, now)
            .map_err(|e| RegistryError::from_transition(address, e))?;
        let (record, _) = pda::derive_vote(&registry, &address, &voter)?;
        let duplicate = || RegistryError::DuplicateVote {
            submission: address,
            voter,
        };
        if self.query().exists(&record).await? {
            return Err(duplicate());
        }

        let res = self.submit(signer, vec![ix], &[]).await;
        let signature = map_conflict(res, || Err(duplicate()))?;
        info!(submission = %address, voter = %voter, vote, "vote cast");
        Ok(signature)
    }

    /// Close the review and write the terminal status decided by the tally.
    /// The program's decision is what gets reported; a disagreement with the
    /// locally computed outcome is logged.
    pub async fn finalize(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
    ) -> RegistryResult<Finalized> {
        let finalizer = signer.pubkey()?;
        let ix = registry::finalize_hook_approval(
            &self.config.programs.registry,
            &finalizer,
            hook_program,
        )?;

        let (address, submission) = self.require_submission(hook_program).await?;
        let query = self.query();
        let now = query.ledger_time().await?;
        rules::check_finalize(&submission, now)
            .map_err(|e| RegistryError::from_transition(address, e))?;
        let (config_address, _) = pda::derive_registry_config(&self.config.programs.registry)?;
        let config = query
            .registry_config()
            .await?
            .ok_or(RegistryError::NotFound {
                what: "registry config",
                address: config_address,
            })?;
        let expected = rules::decide_outcome(&submission, &config.settings());
        debug!(submission = %address, expected = %expected, "finalizing");

        let signature = self.submit(signer, vec![ix], &[]).await?;
        let (_, after) = self.require_submission(hook_program).await?;
        if after.status != expected {
            warn!(
                submission = %address,
                expected = %expected,
                status = %after.status,
                "program decided differently than the local tally"
            );
        }
        info!(
            submission = %address,
            status = %after.status,
            votes_for = after.votes_for,
            votes_against = after.votes_against,
            "review finalized"
        );
        Ok(Finalized {
            signature,
            expected,
            status: after.status,
            votes_for: after.votes_for,
            votes_against: after.votes_against,
        })
    }

    /// Issue the whirlpool badge for a mint whose hook is approved.
    /// Re-issuing an existing badge is a no-op success.
    pub async fn auto_approve_token_badge(
        &self,
        signer: &dyn TransactionSigner,
        hook_program: &Pubkey,
        mint: &Pubkey,
        whirlpools_config: Option<Pubkey>,
    ) -> RegistryResult<BadgeOutcome> {
        let payer = signer.pubkey()?;
        let programs = self.config.programs;
        let whirlpools_config = whirlpools_config.unwrap_or(self.config.whirlpools_config);
        let ix = registry::auto_approve_token_badge(
            &programs.registry,
            &BadgeAccounts {
                whirlpool_program: programs.whirlpool,
                whirlpools_config,
                token_mint: *mint,
                hook_program: *hook_program,
                payer,
                badge_authority: payer,
            },
        )?;

        let (_, submission) = self.require_submission(hook_program).await?;
        if rules::check_badge(&submission).is_err() {
            return Err(RegistryError::HookNotApproved {
                program_id: *hook_program,
                status: submission.status,
            });
        }
        let query = self.query();
        let view = query.mint(mint).await?.ok_or(RegistryError::NotFound {
            what: "mint",
            address: *mint,
        })?;
        let found = view.transfer_hook.and_then(|h| h.program_id);
        if found != Some(*hook_program) {
            return Err(RegistryError::HookMismatch {
                mint: *mint,
                expected: *hook_program,
                found,
            });
        }
        if query.token_badge(&whirlpools_config, mint).await?.is_some() {
            info!(mint = %mint, "token badge already issued");
            return Ok(BadgeOutcome::AlreadyIssued);
        }

        let res = self
            .submit(signer, vec![ix], &[])
            .await
            .map(|signature| BadgeOutcome::Issued { signature });
        let outcome = map_conflict(res, || Ok(BadgeOutcome::AlreadyIssued))?;
        info!(mint = %mint, whirlpools_config = %whirlpools_config, "token badge approved");
        Ok(outcome)
    }

    /// Create and initialize a Token-2022 mint carrying `params.hook`.
    /// `mint` is a fresh keypair and co-signs.
    pub async fn create_extension_mint(
        &self,
        signer: &dyn TransactionSigner,
        mint: &Keypair,
        params: &MintParams,
    ) -> RegistryResult<Signature> {
        let payer = signer.pubkey()?;
        let spec = MintSpec {
            mint: mint.pubkey(),
            payer,
            mint_authority: payer,
            freeze_authority: params.freeze_authority,
            hook_program: params.hook.program_id(),
            decimals: params.decimals,
            initial_supply: params.initial_supply,
        };
        let ixs = token::create_extension_mint(&self.config.programs, &spec)?;
        let signature = self.submit(signer, ixs, &[mint]).await?;
        info!(mint = %spec.mint, hook = %params.hook, "extension mint created");
        Ok(signature)
    }

    /// Register the hook's extra accounts for `mint`. The signer must be the
    /// mint authority. `extra_metas` overrides the catalogued list and is how
    /// a custom hook declares what it needs.
    pub async fn initialize_extra_account_metas(
        &self,
        signer: &dyn TransactionSigner,
        hook: HookKind,
        mint: &Pubkey,
        extra_metas: Option<&[ExtraAccountMeta]>,
    ) -> RegistryResult<Signature> {
        let authority = signer.pubkey()?;
        let hook_program = hook.program_id();
        let metas = match extra_metas {
            Some(metas) => metas.to_vec(),
            None => hook.extra_account_metas()?,
        };
        let ixs = token::initialize_extra_account_metas(&hook_program, mint, &authority, &metas)?;

        let (list, _) = pda::derive_extra_account_metas(&hook_program, mint)?;
        let already = || RegistryError::AlreadyInitialized {
            what: "extra account metas",
            address: list,
        };
        // A funded but unallocated list address is still system-owned.
        if let Some(account) = self.query().account(&list).await? {
            if account.owner == hook_program {
                return Err(already());
            }
        }
        let res = self.submit(signer, ixs, &[]).await;
        let signature = map_conflict(res, || Err(already()))?;
        info!(
            mint = %mint,
            hook = %hook,
            extra_metas = %list,
            count = metas.len(),
            "extra account metas initialized"
        );
        Ok(signature)
    }

    async fn token_program_of(&self, mint: &Pubkey) -> RegistryResult<Pubkey> {
        self.query()
            .account(mint)
            .await?
            .map(|a| a.owner)
            .ok_or(RegistryError::NotFound {
                what: "mint",
                address: *mint,
            })
    }

    async fn hook_program_of(&self, mint: &Pubkey) -> RegistryResult<Option<Pubkey>> {
        let view = self.query().mint(mint).await?.ok_or(RegistryError::NotFound {
            what: "mint",
            address: *mint,
        })?;
        Ok(view.transfer_hook.and_then(|h| h.program_id))
    }

    /// Append the accounts `hook_program` needs to observe `leg`, resolved
    /// from the mint's on-chain extra-account-metas list.
    async fn append_hook_accounts(
        &self,
        ix: &mut Instruction,
        hook_program: &Pubkey,
        leg: &TransferLeg,
    ) -> RegistryResult<()> {
        let rpc = &self.rpc;
        let fetch = move |address: Pubkey| async move {
            rpc.get_account(&address)
                .await
                .map(|account| account.map(|a| a.data))
                .map_err(|e| Box::new(e) as AccountFetchError)
        };
        let before = ix.accounts.len();
        add_extra_account_metas_for_execute(
            ix,
            hook_program,
            &leg.source,
            &leg.mint,
            &leg.destination,
            &leg.authority,
            leg.amount,
            fetch,
        )
        .await
        .map_err(|e| match e.downcast::<RpcError>() {
            Ok(e) => RegistryError::Rpc(*e),
            Err(e) => RegistryError::HookAccounts {
                mint: leg.mint,
                reason: e.to_string(),
            },
        })?;
        debug!(
            mint = %leg.mint,
            hook_program = %hook_program,
            authority = %leg.authority,
            appended = ix.accounts.len() - before,
            "hook accounts resolved"
        );
        Ok(())
    }

    /// Open a whirlpool for two badged mints. Vault keypairs are fresh and co-sign.
    pub async fn create_pool(
        &self,
        signer: &dyn TransactionSigner,
        params: &PoolParams,
        vault_a: &Keypair,
        vault_b: &Keypair,
    ) -> RegistryResult<PoolCreated> {
        let funder = signer.pubkey()?;
        let programs = self.config.programs;
        let spec = PoolSpec {
            whirlpool_program: programs.whirlpool,
            whirlpools_config: self.config.whirlpools_config,
            mint_a: params.mint_a,
            mint_b: params.mint_b,
            token_program_a: self.token_program_of(&params.mint_a).await?,
            token_program_b: self.token_program_of(&params.mint_b).await?,
            funder,
            vault_a: vault_a.pubkey(),
            vault_b: vault_b.pubkey(),
            fee_tier: params.fee_tier,
            initial_price: params.initial_price,
            initial_liquidity_a: params.initial_liquidity_a,
            initial_liquidity_b: params.initial_liquidity_b,
        };
        let ix = pool::create_liquidity_pool(&spec)?;
        let (whirlpool, _) =
            pda::derive_whirlpool(&programs.whirlpool, &params.mint_a, &params.mint_b, params.fee_tier)?;

        let signature = self.submit(signer, vec![ix], &[vault_a, vault_b]).await?;
        info!(whirlpool = %whirlpool, fee_tier = params.fee_tier, "pool created");
        Ok(PoolCreated {
            signature,
            whirlpool,
        })
    }

    /// Swap through a pool, passing each hooked mint's extra accounts.
    pub async fn swap(
        &self,
        signer: &dyn TransactionSigner,
        params: &SwapParams,
    ) -> RegistryResult<Signature> {
        let owner = signer.pubkey()?;
        let token_program_a = self.token_program_of(&params.mint_a).await?;
        let token_program_b = self.token_program_of(&params.mint_b).await?;
        let owner_ata_a =
            get_associated_token_address_with_program_id(&owner, &params.mint_a, &token_program_a);
        let owner_ata_b =
            get_associated_token_address_with_program_id(&owner, &params.mint_b, &token_program_b);

        let spec = SwapSpec {
            whirlpool_program: self.config.programs.whirlpool,
            whirlpool: params.whirlpool,
            authority: owner,
            mint_a: params.mint_a,
            mint_b: params.mint_b,
            token_program_a,
            token_program_b,
            owner_ata_a,
            owner_ata_b,
            vault_a: params.vault_a,
            vault_b: params.vault_b,
            amount: params.amount,
            other_amount_threshold: params.other_amount_threshold,
            a_to_b: params.a_to_b,
        };
        let mut ix = pool::execute_extension_aware_swap(&spec);
        for leg in spec.transfer_legs() {
            if let Some(hook_program) = self.hook_program_of(&leg.mint).await? {
                self.append_hook_accounts(&mut ix, &hook_program, &leg).await?;
            }
        }
        let signature = self.submit(signer, vec![ix], &[]).await?;
        info!(whirlpool = %params.whirlpool, amount = params.amount, a_to_b = params.a_to_b, "swap executed");
        Ok(signature)
    }
}
