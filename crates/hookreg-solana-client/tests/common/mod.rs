//! In-process ledger for integration tests.
//!
//! Implements `LedgerRpc` over a map of accounts and executes the programs
//! the client talks to: system create-account and transfer, the registry
//! program (using the core layouts and rules), Token-2022 mint + transfer-hook
//! init, the associated-token program, the transfer-hook interface init and
//! the pool program's badge/pool side. Token state is written with the SPL
//! crates' own layouts. Signatures and anchors are verified, every
//! transaction commits atomically, and commits are serialized by one lock so
//! exactly one of two racing creates wins.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use hookreg_core::codec::Writer;
use hookreg_core::config::RegistrySettings;
use hookreg_core::model::{
    AccountState, GovernanceVote, HookSubmission, PoolInstruction, RegistryConfig,
    RegistryInstruction, RiskAssessment, TokenBadge,
};
use hookreg_core::rules::{self, TransitionError};
use hookreg_solana_client::config::{ClientConfig, ConfirmSettings, ProgramIds};
use hookreg_solana_client::constants::BPF_UPGRADEABLE_LOADER_ID;
use hookreg_solana_client::pda;
use hookreg_solana_client::query::MintView;
use hookreg_solana_client::rpc::{AccountSnapshot, Anchor, CommitFailure, CommitStatus, RpcError};
use hookreg_solana_client::{KeypairSigner, LedgerRpc, RegistryClient};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{CompiledInstruction, InstructionError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::transaction::{Transaction, TransactionError};
use solana_sdk::{bpf_loader, system_program, sysvar};
use spl_tlv_account_resolution::state::ExtraAccountMetaList;
use spl_token_2022::extension::transfer_hook::TransferHook;
use spl_token_2022::extension::{BaseStateWithExtensionsMut, StateWithExtensionsMut};
use spl_token_2022::instruction::TokenInstruction;
use spl_token_2022::solana_program::program_option::COption;
use spl_token_2022::state::Mint;
use spl_transfer_hook_interface::instruction::{ExecuteInstruction, TransferHookInstruction};

pub const START_TIME: i64 = 1_700_000_000;
pub const REVIEW_PERIOD: u64 = 3_600;

const ERR_NOT_INITIALIZED: u32 = 6000;
const ERR_UNAUTHORIZED: u32 = 6001;
const ERR_REVIEW_NOT_ENDED: u32 = 6004;
const ERR_REVIEW_ENDED: u32 = 6005;
const ERR_CANNOT_FINALIZE: u32 = 6006;
const ERR_INVALID_TRANSITION: u32 = 6008;
const ERR_HOOK_NOT_APPROVED: u32 = 6012;
const ERR_NOT_EXECUTABLE: u32 = 6016;
const ERR_INCOMPATIBLE_HOOK: u32 = 6018;
const ERR_NO_TRANSFER_HOOK: u32 = 6019;
const ERR_BADGE_MISSING: u32 = 7000;

type Accounts = HashMap<Pubkey, AccountSnapshot>;

struct State {
    accounts: Accounts,
    now: i64,
    anchors: HashSet<Hash>,
    statuses: HashMap<Signature, CommitStatus>,
    committed: Vec<Transaction>,
    /// When set, confirmations stay pending even for committed transactions.
    hide_confirmations: bool,
}

pub struct SimLedger {
    programs: ProgramIds,
    state: Mutex<State>,
}

impl SimLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            programs: ProgramIds::default(),
            state: Mutex::new(State {
                accounts: HashMap::new(),
                now: START_TIME,
                anchors: HashSet::new(),
                statuses: HashMap::new(),
                committed: Vec::new(),
                hide_confirmations: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn now(&self) -> i64 {
        self.lock().now
    }

    pub fn advance(&self, secs: i64) {
        self.lock().now += secs;
    }

    /// Invalidate every anchor handed out so far.
    pub fn expire_anchors(&self) {
        self.lock().anchors.clear();
    }

    pub fn hide_confirmations(&self, hide: bool) {
        self.lock().hide_confirmations = hide;
    }

    pub fn committed(&self) -> usize {
        self.lock().committed.len()
    }

    pub fn last_transaction(&self) -> Option<Transaction> {
        self.lock().committed.last().cloned()
    }

    pub fn account(&self, key: &Pubkey) -> Option<AccountSnapshot> {
        self.lock().accounts.get(key).cloned()
    }

    pub fn put(&self, key: Pubkey, account: AccountSnapshot) {
        self.lock().accounts.insert(key, account);
    }

    /// Deploy an immutable program at `id`.
    pub fn deploy_program(&self, id: Pubkey) {
        self.put(
            id,
            AccountSnapshot {
                data: vec![0; 36],
                owner: bpf_loader::id(),
                executable: true,
                lamports: 1,
            },
        );
    }

    /// Deploy a program through the upgradeable loader.
    pub fn deploy_upgradeable(&self, id: Pubkey, authority: Option<Pubkey>) {
        let programdata = Pubkey::find_program_address(&[id.as_ref()], &BPF_UPGRADEABLE_LOADER_ID).0;
        let mut w = Writer::new();
        w.u32(2).pubkey(&programdata);
        self.put(
            id,
            AccountSnapshot {
                data: w.into_inner(),
                owner: BPF_UPGRADEABLE_LOADER_ID,
                executable: true,
                lamports: 1,
            },
        );
        let mut w = Writer::new();
        w.u32(3).u64(1).option(authority.as_ref(), |w, k| {
            w.pubkey(k);
        });
        self.put(
            programdata,
            AccountSnapshot {
                data: w.into_inner(),
                owner: BPF_UPGRADEABLE_LOADER_ID,
                executable: false,
                lamports: 1,
            },
        );
    }

    /// Decoded submission for `hook_program`, if any.
    pub fn submission(&self, hook_program: &Pubkey) -> Option<HookSubmission> {
        let (address, _) = Pubkey::find_program_address(
            &[b"submission", hook_program.as_ref()],
            &self.programs.registry,
        );
        self.account(&address)
            .map(|a| HookSubmission::decode(&a.data).unwrap())
    }

    fn clock_account(now: i64) -> AccountSnapshot {
        let mut w = Writer::new();
        w.u64(1).i64(START_TIME).u64(0).u64(1).i64(now);
        AccountSnapshot {
            data: w.into_inner(),
            owner: sysvar::id(),
            executable: false,
            lamports: 1,
        }
    }

    fn execute(&self, st: &State, tx: &Transaction) -> Result<Accounts, TransactionError> {
        let mut accounts = st.accounts.clone();
        for (index, ix) in tx.message.instructions.iter().enumerate() {
            let cx = Ctx { tx, ix };
            self.dispatch(&mut accounts, &cx, st.now)
                .map_err(|e| TransactionError::InstructionError(index as u8, e))?;
        }
        Ok(accounts)
    }

    fn dispatch(&self, accounts: &mut Accounts, cx: &Ctx<'_>, now: i64) -> Result<(), InstructionError> {
        let program = cx.program();
        let p = &self.programs;
        if program == system_program::id() {
            system(accounts, cx)
        } else if program == p.registry {
            self.registry(accounts, cx, now)
        } else if program == p.token_2022 {
            token_2022(accounts, cx)
        } else if spl_associated_token_account::check_id(&program) {
            associated_token(accounts, cx)
        } else if program == p.whirlpool {
            self.whirlpool(accounts, cx)
        } else {
            match accounts.get(&program) {
                Some(a) if a.executable => transfer_hook(accounts, cx),
                _ => Err(InstructionError::IncorrectProgramId),
            }
        }
    }

    fn registry(&self, accounts: &mut Accounts, cx: &Ctx<'_>, now: i64) -> Result<(), InstructionError> {
        let registry = self.programs.registry;
        let ix = RegistryInstruction::decode(&cx.ix.data)
            .map_err(|_| InstructionError::InvalidInstructionData)?;
        match ix {
            RegistryInstruction::InitializeRegistry {
                authority,
                governance_threshold_bps,
                review_period_seconds,
                max_risk_score,
            } => {
                let config = RegistryConfig {
                    authority,
                    governance_threshold_bps,
                    review_period_seconds,
                    max_risk_score,
                    total_submissions: 0,
                    total_approved: 0,
                    bump: bump(&[b"registry"], &registry),
                };
                create(accounts, cx.key(0)?, registry, config.encode())
            }
            RegistryInstruction::SubmitHookForApproval {
                program_id,
                metadata_uri,
                governance_proposal_id,
            } => {
                let config_key = cx.key(0)?;
                let mut config: RegistryConfig =
                    load(accounts, &config_key).ok_or(InstructionError::Custom(ERR_NOT_INITIALIZED))?;
                let hook = cx.key(4)?;
                match accounts.get(&hook) {
                    Some(a) if hook == program_id && a.executable => {}
                    _ => return Err(InstructionError::Custom(ERR_NOT_EXECUTABLE)),
                }
                let submission = HookSubmission {
                    program_id,
                    submitter: cx.key(2)?,
                    status: hookreg_core::model::ApprovalStatus::Pending,
                    submitted_at: now,
                    review_ends_at: now + config.review_period_seconds as i64,
                    last_updated_at: now,
                    metadata_uri,
                    governance_proposal_id,
                    votes_for: 0,
                    votes_against: 0,
                    risk_score: 0,
                    automated_checks_passed: false,
                    bump: bump(&[b"submission", program_id.as_ref()], &registry),
                };
                create(accounts, cx.key(1)?, registry, submission.encode())?;
                config.total_submissions += 1;
                store(accounts, &config_key, &config);
                Ok(())
            }
            RegistryInstruction::AssessHookRisk {
                risk_score,
                risk_flags,
                automated_checks_passed,
                requires_manual_review,
                notes,
            } => {
                let sub_key = cx.key(0)?;
                let mut submission: HookSubmission =
                    load(accounts, &sub_key).ok_or(InstructionError::UninitializedAccount)?;
                rules::check_assessment(&submission).map_err(program_error)?;
                let record = RiskAssessment {
                    submission: sub_key,
                    overall_score: risk_score,
                    risk_flags,
                    assessed_at: now,
                    assessor: cx.key(3)?,
                    notes,
                    requires_manual_review,
                    bump: bump(&[b"risk_assessment", sub_key.as_ref()], &registry),
                };
                create(accounts, cx.key(1)?, registry, record.encode())?;
                submission.risk_score = risk_score;
                submission.automated_checks_passed = automated_checks_passed;
                submission.last_updated_at = now;
                store(accounts, &sub_key, &submission);
                Ok(())
            }
            RegistryInstruction::CastGovernanceVote { vote, rationale } => {
                let sub_key = cx.key(0)?;
                let voter = cx.key(2)?;
                let mut submission: HookSubmission =
                    load(accounts, &sub_key).ok_or(InstructionError::UninitializedAccount)?;
                let record = GovernanceVote {
                    submission: sub_key,
                    voter,
                    vote,
                    weight: 1,
                    voted_at: now,
                    rationale,
                    bump: bump(&[b"vote", sub_key.as_ref(), voter.as_ref()], &registry),
                };
                create(accounts, cx.key(1)?, registry, record.encode())?;
                rules::check_vote(&submission, now).map_err(program_error)?;
                rules::apply_vote(&mut submission, vote);
                submission.last_updated_at = now;
                store(accounts, &sub_key, &submission);
                Ok(())
            }
            RegistryInstruction::FinalizeHookApproval => {
                let config: RegistryConfig = load(accounts, &cx.key(0)?)
                    .ok_or(InstructionError::Custom(ERR_NOT_INITIALIZED))?;
                let sub_key = cx.key(1)?;
                let mut submission: HookSubmission =
                    load(accounts, &sub_key).ok_or(InstructionError::UninitializedAccount)?;
                rules::check_finalize(&submission, now).map_err(|e| match e {
                    TransitionError::ReviewNotEnded { .. } => {
                        InstructionError::Custom(ERR_REVIEW_NOT_ENDED)
                    }
                    _ => InstructionError::Custom(ERR_CANNOT_FINALIZE),
                })?;
                submission.status = rules::decide_outcome(&submission, &config.settings());
                submission.last_updated_at = now;
                store(accounts, &sub_key, &submission);
                Ok(())
            }
            RegistryInstruction::UpdateHookStatus { new_status, .. } => {
                let config: RegistryConfig = load(accounts, &cx.key(0)?)
                    .ok_or(InstructionError::Custom(ERR_NOT_INITIALIZED))?;
                if cx.key(2)? != config.authority {
                    return Err(InstructionError::Custom(ERR_UNAUTHORIZED));
                }
                let sub_key = cx.key(1)?;
                let mut submission: HookSubmission =
                    load(accounts, &sub_key).ok_or(InstructionError::UninitializedAccount)?;
                rules::check_status_update(submission.status, new_status)
                    .map_err(program_error)?;
                submission.status = new_status;
                submission.last_updated_at = now;
                store(accounts, &sub_key, &submission);
                Ok(())
            }
            RegistryInstruction::AutoApproveTokenBadge {
                whirlpools_config,
                token_mint,
            } => {
                let submission: HookSubmission = load(accounts, &cx.key(0)?)
                    .ok_or(InstructionError::UninitializedAccount)?;
                rules::check_badge(&submission)
                    .map_err(|_| InstructionError::Custom(ERR_HOOK_NOT_APPROVED))?;
                let mint = accounts
                    .get(&cx.key(1)?)
                    .and_then(|a| MintView::unpack(&a.data).ok())
                    .ok_or(InstructionError::InvalidAccountData)?;
                match mint.transfer_hook.and_then(|h| h.program_id) {
                    None => return Err(InstructionError::Custom(ERR_NO_TRANSFER_HOOK)),
                    Some(p) if p != submission.program_id => {
                        return Err(InstructionError::Custom(ERR_INCOMPATIBLE_HOOK))
                    }
                    Some(_) => {}
                }
                let badge = TokenBadge {
                    whirlpools_config,
                    token_mint,
                };
                create(accounts, cx.key(3)?, self.programs.whirlpool, badge.encode())
            }
        }
    }

    fn whirlpool(&self, accounts: &mut Accounts, cx: &Ctx<'_>) -> Result<(), InstructionError> {
        let ix = PoolInstruction::decode(&cx.ix.data)
            .map_err(|_| InstructionError::InvalidInstructionData)?;
        match ix {
            PoolInstruction::CreatePool { fee_tier, .. } => {
                for (mint, badge) in [(1, 3), (2, 4)] {
                    let hooked = accounts
                        .get(&cx.key(mint)?)
                        .and_then(|a| MintView::unpack(&a.data).ok())
                        .and_then(|m| m.transfer_hook)
                        .is_some();
                    if hooked && !accounts.contains_key(&cx.key(badge)?) {
                        return Err(InstructionError::Custom(ERR_BADGE_MISSING));
                    }
                }
                let mut w = Writer::new();
                w.pubkey(&cx.key(1)?).pubkey(&cx.key(2)?).u16(fee_tier);
                create(accounts, cx.key(6)?, self.programs.whirlpool, w.into_inner())?;
                create(accounts, cx.key(7)?, cx.key(9)?, vec![0; 165])?;
                create(accounts, cx.key(8)?, cx.key(10)?, vec![0; 165])
            }
            PoolInstruction::Swap { .. } => {
                if !accounts.contains_key(&cx.key(3)?) {
                    return Err(InstructionError::UninitializedAccount);
                }
                // Each hooked mint must bring its hook program and meta list along.
                for mint in [4, 5] {
                    let mint = cx.key(mint)?;
                    let hook = accounts
                        .get(&mint)
                        .and_then(|a| MintView::unpack(&a.data).ok())
                        .and_then(|m| m.transfer_hook)
                        .and_then(|h| h.program_id);
                    if let Some(hook) = hook {
                        let (list, _) = pda::derive_extra_account_metas(&hook, &mint)
                            .map_err(|_| InstructionError::InvalidSeeds)?;
                        for needed in [hook, list] {
                            if !cx.keys().skip(10).any(|k| k == needed) {
                                return Err(InstructionError::MissingAccount);
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

struct Ctx<'a> {
    tx: &'a Transaction,
    ix: &'a CompiledInstruction,
}

impl Ctx<'_> {
    fn program(&self) -> Pubkey {
        self.tx.message.account_keys[usize::from(self.ix.program_id_index)]
    }

    fn key(&self, i: usize) -> Result<Pubkey, InstructionError> {
        self.ix
            .accounts
            .get(i)
            .map(|&k| self.tx.message.account_keys[usize::from(k)])
            .ok_or(InstructionError::NotEnoughAccountKeys)
    }

    fn keys(&self) -> impl Iterator<Item = Pubkey> + '_ {
        self.ix
            .accounts
            .iter()
            .map(|&k| self.tx.message.account_keys[usize::from(k)])
    }

    fn is_signer(&self, i: usize) -> bool {
        self.ix
            .accounts
            .get(i)
            .is_some_and(|&k| self.tx.message.is_signer(usize::from(k)))
    }
}

fn bump(seeds: &[&[u8]], program: &Pubkey) -> u8 {
    Pubkey::find_program_address(seeds, program).1
}

fn program_error(e: TransitionError) -> InstructionError {
    match e {
        TransitionError::VoteWindowClosed { .. } => InstructionError::Custom(ERR_REVIEW_ENDED),
        TransitionError::ReviewNotEnded { .. } => InstructionError::Custom(ERR_REVIEW_NOT_ENDED),
        _ => InstructionError::Custom(ERR_INVALID_TRANSITION),
    }
}

/// System `AccountAlreadyInUse` surfaces as custom error 0.
fn create(accounts: &mut Accounts, key: Pubkey, owner: Pubkey, data: Vec<u8>) -> Result<(), InstructionError> {
    if accounts.contains_key(&key) {
        return Err(InstructionError::Custom(0));
    }
    accounts.insert(
        key,
        AccountSnapshot {
            data,
            owner,
            executable: false,
            lamports: 1,
        },
    );
    Ok(())
}

fn load<T: AccountState>(accounts: &Accounts, key: &Pubkey) -> Option<T> {
    accounts.get(key).and_then(|a| T::decode(&a.data).ok())
}

fn store<T: AccountState>(accounts: &mut Accounts, key: &Pubkey, value: &T) {
    if let Some(a) = accounts.get_mut(key) {
        a.data = value.encode();
    }
}

fn system(accounts: &mut Accounts, cx: &Ctx<'_>) -> Result<(), InstructionError> {
    let ix: SystemInstruction =
        bincode::deserialize(&cx.ix.data).map_err(|_| InstructionError::InvalidInstructionData)?;
    match ix {
        SystemInstruction::CreateAccount { space, owner, .. } => {
            if !cx.is_signer(1) {
                return Err(InstructionError::MissingRequiredSignature);
            }
            create(accounts, cx.key(1)?, owner, vec![0; space as usize])
        }
        SystemInstruction::Transfer { lamports } => {
            if !cx.is_signer(0) {
                return Err(InstructionError::MissingRequiredSignature);
            }
            accounts
                .entry(cx.key(1)?)
                .or_insert_with(|| AccountSnapshot {
                    data: Vec::new(),
                    owner: system_program::id(),
                    executable: false,
                    lamports: 0,
                })
                .lamports += lamports;
            Ok(())
        }
        _ => Ok(()),
    }
}

fn non_zero(key: Pubkey) -> Option<Pubkey> {
    (key != Pubkey::default()).then_some(key)
}

fn token_2022(accounts: &mut Accounts, cx: &Ctx<'_>) -> Result<(), InstructionError> {
    let ix = TokenInstruction::unpack(&cx.ix.data)
        .map_err(|_| InstructionError::InvalidInstructionData)?;
    let account = accounts
        .get_mut(&cx.key(0)?)
        .ok_or(InstructionError::UninitializedAccount)?;
    let bad_data = |_| InstructionError::InvalidAccountData;
    match ix {
        // [36, 0, authority, program]
        TokenInstruction::TransferHookExtension => {
            let data = &cx.ix.data;
            if data.get(1) != Some(&0) || data.len() != 66 {
                return Err(InstructionError::InvalidInstructionData);
            }
            let key = |range: std::ops::Range<usize>| {
                Pubkey::try_from(&data[range]).map_err(|_| InstructionError::InvalidInstructionData)
            };
            let (authority, program_id) = (non_zero(key(2..34)?), non_zero(key(34..66)?));
            let mut state =
                StateWithExtensionsMut::<Mint>::unpack_uninitialized(&mut account.data).map_err(bad_data)?;
            let ext = state.init_extension::<TransferHook>(true).map_err(bad_data)?;
            ext.authority = authority.try_into().map_err(bad_data)?;
            ext.program_id = program_id.try_into().map_err(bad_data)?;
            Ok(())
        }
        TokenInstruction::InitializeMint {
            decimals,
            mint_authority,
            freeze_authority,
        } => {
            let mut state = StateWithExtensionsMut::<Mint>::unpack_uninitialized(&mut account.data)
                .map_err(|_| InstructionError::AccountAlreadyInitialized)?;
            state.base = Mint {
                mint_authority: COption::Some(mint_authority),
                supply: 0,
                decimals,
                is_initialized: true,
                freeze_authority,
            };
            state.pack_base();
            state.init_account_type().map_err(bad_data)?;
            Ok(())
        }
        TokenInstruction::MintTo { amount } => {
            let mut state =
                StateWithExtensionsMut::<Mint>::unpack(&mut account.data).map_err(bad_data)?;
            if state.base.mint_authority != COption::Some(cx.key(2)?) || !cx.is_signer(2) {
                return Err(InstructionError::Custom(4));
            }
            state.base.supply += amount;
            state.pack_base();
            Ok(())
        }
        _ => Err(InstructionError::InvalidInstructionData),
    }
}

/// CreateIdempotent: funder, ata, wallet, mint, system, token program.
fn associated_token(accounts: &mut Accounts, cx: &Ctx<'_>) -> Result<(), InstructionError> {
    let ata = cx.key(1)?;
    if !accounts.contains_key(&ata) {
        create(accounts, ata, cx.key(5)?, vec![0; 170])?;
    }
    Ok(())
}

/// InitializeExtraAccountMetaList: list, mint, authority, system.
fn transfer_hook(accounts: &mut Accounts, cx: &Ctx<'_>) -> Result<(), InstructionError> {
    let TransferHookInstruction::InitializeExtraAccountMetaList {
        extra_account_metas,
    } = TransferHookInstruction::unpack(&cx.ix.data)
        .map_err(|_| InstructionError::InvalidInstructionData)?
    else {
        return Err(InstructionError::InvalidInstructionData);
    };
    let mint = accounts
        .get(&cx.key(1)?)
        .and_then(|a| MintView::unpack(&a.data).ok())
        .ok_or(InstructionError::InvalidAccountData)?;
    if mint.mint_authority != Some(cx.key(2)?) || !cx.is_signer(2) {
        return Err(InstructionError::IllegalOwner);
    }

    let list = cx.key(0)?;
    let lamports = match accounts.get(&list) {
        None => 0,
        Some(a) if a.owner == system_program::id() && a.data.is_empty() => a.lamports,
        // The system allocation inside the hook program reports in-use as 0.
        Some(_) => return Err(InstructionError::Custom(0)),
    };
    let size = ExtraAccountMetaList::size_of(extra_account_metas.len())
        .map_err(|_| InstructionError::InvalidInstructionData)?;
    let mut data = vec![0; size];
    ExtraAccountMetaList::init::<ExecuteInstruction>(&mut data, &extra_account_metas)
        .map_err(|_| InstructionError::InvalidAccountData)?;
    accounts.insert(
        list,
        AccountSnapshot {
            data,
            owner: cx.program(),
            executable: false,
            lamports,
        },
    );
    Ok(())
}

#[async_trait]
impl LedgerRpc for SimLedger {
    async fn get_latest_anchor(&self) -> Result<Anchor, RpcError> {
        tokio::task::yield_now().await;
        let blockhash = Hash::new_unique();
        self.lock().anchors.insert(blockhash);
        Ok(Anchor {
            blockhash,
            last_valid_block_height: 150,
        })
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, RpcError> {
        tokio::task::yield_now().await;
        let st = self.lock();
        if *address == sysvar::clock::id() {
            return Ok(Some(Self::clock_account(st.now)));
        }
        Ok(st.accounts.get(address).cloned())
    }

    async fn send(&self, signed_tx: &[u8]) -> Result<Signature, RpcError> {
        tokio::task::yield_now().await;
        let tx: Transaction = bincode::deserialize(signed_tx)
            .map_err(|e| RpcError::InvalidTransaction(e.to_string()))?;
        tx.verify()
            .map_err(|e| RpcError::InvalidTransaction(e.to_string()))?;
        let signature = tx.signatures[0];

        let mut st = self.lock();
        if !st.anchors.contains(&tx.message.recent_blockhash) {
            return Err(RpcError::Refused(CommitFailure::BlockhashNotFound));
        }
        if st.statuses.contains_key(&signature) {
            return Ok(signature);
        }
        let status = match self.execute(&st, &tx) {
            Ok(accounts) => {
                st.accounts = accounts;
                st.committed.push(tx);
                CommitStatus::Confirmed
            }
            Err(e) => CommitStatus::Failed(CommitFailure::from_transaction_error(&e)),
        };
        st.statuses.insert(signature, status);
        Ok(signature)
    }

    async fn confirm(&self, signature: &Signature, _: &Anchor) -> Result<CommitStatus, RpcError> {
        tokio::task::yield_now().await;
        let st = self.lock();
        if st.hide_confirmations {
            return Ok(CommitStatus::Pending);
        }
        Ok(st
            .statuses
            .get(signature)
            .cloned()
            .unwrap_or(CommitStatus::Pending))
    }
}

/// Client over `ledger` with short confirmation polling.
pub fn client(ledger: &Arc<SimLedger>) -> RegistryClient<Arc<SimLedger>> {
    let config = ClientConfig {
        confirm: ConfirmSettings {
            timeout_ms: 100,
            poll_interval_ms: 5,
        },
        ..ClientConfig::default()
    };
    RegistryClient::new(Arc::clone(ledger), config)
}

pub fn settings() -> RegistrySettings {
    RegistrySettings {
        review_period_seconds: REVIEW_PERIOD,
        ..RegistrySettings::default()
    }
}

/// A ledger with the registry initialized; returns the authority's signer.
pub async fn bootstrap() -> (Arc<SimLedger>, RegistryClient<Arc<SimLedger>>, KeypairSigner) {
    let ledger = SimLedger::new();
    let client = client(&ledger);
    let authority = KeypairSigner::new(Keypair::new());
    client
        .initialize_registry(&authority, None, &settings())
        .await
        .unwrap();
    (ledger, client, authority)
}

pub fn signer() -> KeypairSigner {
    KeypairSigner::new(Keypair::new())
}
