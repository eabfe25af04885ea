//! Ledger query façade.
//!
//! Read-only fetch and fixed-offset decode of on-chain state. An absent
//! account is `Ok(None)`, never an error, so callers can tell "does not exist
//! yet" from "fetch failed". A wrong discriminator is a fatal
//! `UnexpectedAccountLayout`; nothing is defaulted or coerced. Token-2022
//! accounts are unpacked with the token program's own state types.

use hookreg_core::codec::{CodecError, CodecResult, Reader};
use hookreg_core::model::{
    AccountState, GovernanceVote, HookSubmission, RegistryConfig, RiskAssessment, TokenBadge,
};
use hookreg_core::risk::RiskBand;
use hookreg_core::rules::Tally;
use serde::Serialize;
use solana_sdk::program_error::ProgramError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::sysvar;
use spl_token_2022::extension::transfer_hook::TransferHook;
use spl_token_2022::extension::{BaseStateWithExtensions, StateWithExtensions};
use spl_token_2022::state::Mint;
use tracing::debug;

use crate::config::ProgramIds;
use crate::constants::BPF_UPGRADEABLE_LOADER_ID;
use crate::error::{RegistryError, RegistryResult};
use crate::pda;
use crate::rpc::{AccountSnapshot, LedgerRpc};

const CLOCK_UNIX_TIMESTAMP_OFFSET: usize = 32;

pub struct LedgerQuery<'a, R: ?Sized> {
    rpc: &'a R,
    programs: ProgramIds,
}

impl<'a, R: LedgerRpc + ?Sized> LedgerQuery<'a, R> {
    pub fn new(rpc: &'a R, programs: ProgramIds) -> Self {
        Self { rpc, programs }
    }

    pub async fn account(&self, address: &Pubkey) -> RegistryResult<Option<AccountSnapshot>> {
        Ok(self.rpc.get_account(address).await?)
    }

    pub async fn exists(&self, address: &Pubkey) -> RegistryResult<bool> {
        Ok(self.account(address).await?.is_some())
    }

    /// Fetch and decode a registry-layout account.
    pub async fn fetch<T: AccountState>(&self, address: &Pubkey) -> RegistryResult<Option<T>> {
        let Some(account) = self.account(address).await? else {
            debug!(account = %address, kind = T::TYPE_NAME, "account not found");
            return Ok(None);
        };
        T::decode(&account.data)
            .map(Some)
            .map_err(|e| RegistryError::from_account_decode(*address, e))
    }

    pub async fn registry_config(&self) -> RegistryResult<Option<RegistryConfig>> {
        let (address, _) = pda::derive_registry_config(&self.programs.registry)?;
        self.fetch(&address).await
    }

    pub async fn submission(&self, hook_program: &Pubkey) -> RegistryResult<Option<HookSubmission>> {
        let (address, _) = pda::derive_submission(&self.programs.registry, hook_program)?;
        self.fetch(&address).await
    }

    pub async fn risk_assessment(
        &self,
        hook_program: &Pubkey,
    ) -> RegistryResult<Option<RiskAssessment>> {
        let (submission, _) = pda::derive_submission(&self.programs.registry, hook_program)?;
        let (address, _) = pda::derive_risk_assessment(&self.programs.registry, &submission)?;
        self.fetch(&address).await
    }

    pub async fn vote(
        &self,
        hook_program: &Pubkey,
        voter: &Pubkey,
    ) -> RegistryResult<Option<GovernanceVote>> {
        let (submission, _) = pda::derive_submission(&self.programs.registry, hook_program)?;
        let (address, _) = pda::derive_vote(&self.programs.registry, &submission, voter)?;
        self.fetch(&address).await
    }

    pub async fn token_badge(
        &self,
        whirlpools_config: &Pubkey,
        mint: &Pubkey,
    ) -> RegistryResult<Option<TokenBadge>> {
        let (address, _) =
            pda::derive_token_badge(&self.programs.whirlpool, whirlpools_config, mint)?;
        self.fetch(&address).await
    }

    pub async fn extra_account_metas_exists(
        &self,
        hook_program: &Pubkey,
        mint: &Pubkey,
    ) -> RegistryResult<bool> {
        let (address, _) = pda::derive_extra_account_metas(hook_program, mint)?;
        self.exists(&address).await
    }

    pub async fn mint(&self, mint: &Pubkey) -> RegistryResult<Option<MintView>> {
        let Some(account) = self.account(mint).await? else {
            return Ok(None);
        };
        MintView::unpack(&account.data)
            .map(Some)
            .map_err(|source| RegistryError::TokenLayout {
                account: *mint,
                source,
            })
    }

    /// Cluster time from the Clock sysvar. Review deadlines are compared
    /// against this, never against the local clock.
    pub async fn ledger_time(&self) -> RegistryResult<i64> {
        let clock = sysvar::clock::id();
        let account = self
            .account(&clock)
            .await?
            .ok_or(RegistryError::NotFound {
                what: "clock sysvar",
                address: clock,
            })?;
        Reader::at(&account.data, CLOCK_UNIX_TIMESTAMP_OFFSET, "unix_timestamp")
            .and_then(|mut r| r.i64("unix_timestamp"))
            .map_err(|e| RegistryError::from_account_decode(clock, e))
    }

    /// Read a hook program account and, for upgradeable programs, its
    /// upgrade authority.
    pub async fn inspect_program(&self, program_id: &Pubkey) -> RegistryResult<Option<ProgramInfo>> {
        let Some(account) = self.account(program_id).await? else {
            return Ok(None);
        };
        let mut info = ProgramInfo {
            program_id: *program_id,
            owner: account.owner,
            executable: account.executable,
            upgradeable: false,
            upgrade_authority: None,
        };
        if account.owner != BPF_UPGRADEABLE_LOADER_ID {
            return Ok(Some(info));
        }

        info.upgradeable = true;
        let programdata = read_program_state(&account.data)
            .map_err(|e| RegistryError::from_account_decode(*program_id, e))?;
        if let Some(programdata) = programdata {
            if let Some(data) = self.account(&programdata).await? {
                info.upgrade_authority = read_upgrade_authority(&data.data)
                    .map_err(|e| RegistryError::from_account_decode(programdata, e))?;
            }
        }
        Ok(Some(info))
    }

    /// The dependent-system badge view for `mint`: approved when the
    /// whirlpool badge exists; hook program taken from the mint extension.
    pub async fn badge_status(
        &self,
        whirlpools_config: &Pubkey,
        mint: &Pubkey,
    ) -> RegistryResult<BadgeStatus> {
        let badge = self.token_badge(whirlpools_config, mint).await?;
        let hook_program = self
            .mint(mint)
            .await?
            .and_then(|m| m.transfer_hook)
            .and_then(|h| h.program_id);
        Ok(BadgeStatus {
            mint: *mint,
            whirlpools_config: *whirlpools_config,
            approved: badge.is_some(),
            hook_program,
        })
    }

    /// Submission plus assessment, with derived display values.
    pub async fn hook_overview(&self, hook_program: &Pubkey) -> RegistryResult<Option<HookOverview>> {
        let (address, _) = pda::derive_submission(&self.programs.registry, hook_program)?;
        let Some(submission) = self.fetch::<HookSubmission>(&address).await? else {
            return Ok(None);
        };
        let assessment = self.risk_assessment(hook_program).await?;
        let tally = Tally::of(&submission);
        Ok(Some(HookOverview {
            address,
            risk_band: RiskBand::from_score(submission.risk_score),
            approval_bps: tally.approval_bps(),
            submission,
            assessment,
        }))
    }
}

/// Decoded Token-2022 mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintView {
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<Pubkey>,
    pub transfer_hook: Option<TransferHookView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferHookView {
    pub authority: Option<Pubkey>,
    pub program_id: Option<Pubkey>,
}

impl MintView {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let state = StateWithExtensions::<Mint>::unpack(data)?;
        let transfer_hook = state
            .get_extension::<TransferHook>()
            .ok()
            .map(|hook| TransferHookView {
                authority: Option::<Pubkey>::from(hook.authority),
                program_id: Option::<Pubkey>::from(hook.program_id),
            });
        let base = state.base;
        Ok(Self {
            mint_authority: base.mint_authority.into(),
            supply: base.supply,
            decimals: base.decimals,
            is_initialized: base.is_initialized,
            freeze_authority: base.freeze_authority.into(),
            transfer_hook,
        })
    }
}

/// Upgradeable program account: `Program { programdata_address }` (tag 2).
fn read_program_state(data: &[u8]) -> CodecResult<Option<Pubkey>> {
    let mut r = Reader::new(data);
    match r.u32("loader_state")? {
        2 => Ok(Some(r.pubkey("programdata_address")?)),
        _ => Ok(None),
    }
}

/// ProgramData account: tag 3, slot, optional upgrade authority.
fn read_upgrade_authority(data: &[u8]) -> CodecResult<Option<Pubkey>> {
    let mut r = Reader::new(data);
    let offset = r.offset();
    let tag = r.u32("loader_state")?;
    if tag != 3 {
        return Err(CodecError::InvalidTag {
            field: "loader_state",
            offset,
            tag: tag.min(u32::from(u8::MAX)) as u8,
        });
    }
    r.u64("slot")?;
    r.option("upgrade_authority", |r| r.pubkey("upgrade_authority"))
}

/// What the ledger says about a hook program account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
    pub program_id: Pubkey,
    pub owner: Pubkey,
    pub executable: bool,
    pub upgradeable: bool,
    pub upgrade_authority: Option<Pubkey>,
}

impl ProgramInfo {
    /// Non-upgradeable programs have no authority by construction.
    pub fn has_upgrade_authority(&self) -> bool {
        self.upgradeable && self.upgrade_authority.is_some()
    }
}

/// Dependent-system badge view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeStatus {
    pub mint: Pubkey,
    pub whirlpools_config: Pubkey,
    pub approved: bool,
    pub hook_program: Option<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookOverview {
    pub address: Pubkey,
    pub submission: HookSubmission,
    pub assessment: Option<RiskAssessment>,
    pub risk_band: RiskBand,
    pub approval_bps: Option<u64>,
}
