//! Whirlpool-facing pool instructions for hooked mints.
//!
//! Pool creation requires both mints in canonical order and passes their
//! token badges. A swap moves tokens in two transfers, one per mint; for a
//! hooked mint the caller appends the hook's resolved accounts for that
//! transfer (see [`SwapSpec::transfer_legs`]) so the token program can invoke
//! the hook.

use hookreg_core::model::PoolInstruction;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_program::{system_program, sysvar};
use tracing::debug;

use super::{readonly, signer_readonly, signer_writable, writable};
use crate::error::{InputError, RegistryResult};
use crate::pda;

/// 2^64 as a float, the Q64.64 scale.
const Q64: f64 = 18_446_744_073_709_551_616.0;

/// Convert a price (token B per token A) to a Q64.64 square root.
pub fn price_to_sqrt_price_x64(price: f64) -> Result<u128, InputError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(InputError::Price(price));
    }
    let scaled = price.sqrt() * Q64;
    if !scaled.is_finite() || scaled < 1.0 || scaled >= u128::MAX as f64 {
        return Err(InputError::Price(price));
    }
    Ok(scaled as u128)
}

/// Inputs of a new pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSpec {
    pub whirlpool_program: Pubkey,
    pub whirlpools_config: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub token_program_a: Pubkey,
    pub token_program_b: Pubkey,
    pub funder: Pubkey,
    /// Fresh vault accounts; both co-sign.
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub fee_tier: u16,
    pub initial_price: f64,
    pub initial_liquidity_a: u64,
    pub initial_liquidity_b: u64,
}

/// Accounts: whirlpools_config, mint_a, mint_b, badge_a, badge_b, funder(s,w),
/// whirlpool(w), vault_a(s,w), vault_b(s,w), token_program_a,
/// token_program_b, system, rent.
pub fn create_liquidity_pool(spec: &PoolSpec) -> RegistryResult<Instruction> {
    if spec.mint_a >= spec.mint_b {
        return Err(InputError::UnorderedMints {
            mint_a: spec.mint_a,
            mint_b: spec.mint_b,
        }
        .into());
    }
    let initial_sqrt_price = price_to_sqrt_price_x64(spec.initial_price)?;
    let program = &spec.whirlpool_program;
    let (badge_a, _) = pda::derive_token_badge(program, &spec.whirlpools_config, &spec.mint_a)?;
    let (badge_b, _) = pda::derive_token_badge(program, &spec.whirlpools_config, &spec.mint_b)?;
    let (whirlpool, _) = pda::derive_whirlpool(program, &spec.mint_a, &spec.mint_b, spec.fee_tier)?;

    let data = PoolInstruction::CreatePool {
        fee_tier: spec.fee_tier,
        initial_sqrt_price,
        initial_liquidity_a: spec.initial_liquidity_a,
        initial_liquidity_b: spec.initial_liquidity_b,
    }
    .encode();

    debug!(whirlpool = %whirlpool, fee_tier = spec.fee_tier, "built create pool");
    Ok(Instruction {
        program_id: *program,
        accounts: vec![
            readonly(spec.whirlpools_config),
            readonly(spec.mint_a),
            readonly(spec.mint_b),
            readonly(badge_a),
            readonly(badge_b),
            signer_writable(spec.funder),
            writable(whirlpool),
            signer_writable(spec.vault_a),
            signer_writable(spec.vault_b),
            readonly(spec.token_program_a),
            readonly(spec.token_program_b),
            readonly(system_program::id()),
            readonly(sysvar::rent::id()),
        ],
        data,
    })
}

/// Inputs of an extension-aware swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSpec {
    pub whirlpool_program: Pubkey,
    pub whirlpool: Pubkey,
    pub authority: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub token_program_a: Pubkey,
    pub token_program_b: Pubkey,
    pub owner_ata_a: Pubkey,
    pub owner_ata_b: Pubkey,
    pub vault_a: Pubkey,
    pub vault_b: Pubkey,
    pub amount: u64,
    pub other_amount_threshold: u64,
    pub a_to_b: bool,
}

/// One token transfer performed by a swap, as a transfer hook sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLeg {
    pub mint: Pubkey,
    pub source: Pubkey,
    pub destination: Pubkey,
    /// Owner signing the transfer: the user into the pool, the pool out of it.
    pub authority: Pubkey,
    pub amount: u64,
}

impl SwapSpec {
    /// The transfer of mint A, then the transfer of mint B. The output leg
    /// carries the minimum amount out.
    pub fn transfer_legs(&self) -> [TransferLeg; 2] {
        let into_pool = |mint, source, destination| TransferLeg {
            mint,
            source,
            destination,
            authority: self.authority,
            amount: self.amount,
        };
        let out_of_pool = |mint, source, destination| TransferLeg {
            mint,
            source,
            destination,
            authority: self.whirlpool,
            amount: self.other_amount_threshold,
        };
        if self.a_to_b {
            [
                into_pool(self.mint_a, self.owner_ata_a, self.vault_a),
                out_of_pool(self.mint_b, self.vault_b, self.owner_ata_b),
            ]
        } else {
            [
                out_of_pool(self.mint_a, self.vault_a, self.owner_ata_a),
                into_pool(self.mint_b, self.owner_ata_b, self.vault_b),
            ]
        }
    }
}

/// Accounts: token_program_a, token_program_b, authority(s), whirlpool(w),
/// mint_a, mint_b, owner_ata_a(w), vault_a(w), owner_ata_b(w), vault_b(w).
/// Hook accounts for either leg are appended after these.
pub fn execute_extension_aware_swap(spec: &SwapSpec) -> Instruction {
    let accounts = vec![
        readonly(spec.token_program_a),
        readonly(spec.token_program_b),
        signer_readonly(spec.authority),
        writable(spec.whirlpool),
        readonly(spec.mint_a),
        readonly(spec.mint_b),
        writable(spec.owner_ata_a),
        writable(spec.vault_a),
        writable(spec.owner_ata_b),
        writable(spec.vault_b),
    ];

    let data = PoolInstruction::Swap {
        amount: spec.amount,
        other_amount_threshold: spec.other_amount_threshold,
        a_to_b: spec.a_to_b,
    }
    .encode();

    debug!(
        whirlpool = %spec.whirlpool,
        a_to_b = spec.a_to_b,
        "built extension-aware swap"
    );
    Instruction {
        program_id: spec.whirlpool_program,
        accounts,
        data,
    }
}
