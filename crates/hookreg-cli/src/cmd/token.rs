use std::path::Path;

use anyhow::Result;
use hookreg_solana_client::workflow::{MintParams, PoolParams, SwapParams};
use hookreg_solana_client::catalog::parse_extra_accounts;
use hookreg_solana_client::HookKind;
use serde::Serialize;
use solana_sdk::signature::{Keypair, Signer};

use crate::args::{Cli, MintArgs};
use crate::context;
use crate::output;

#[derive(Debug, Serialize)]
pub struct MintOut {
    pub ok: bool,
    pub mint: String,
    pub hook: String,
    pub signature: String,
    pub keypair_created: bool,
}

#[derive(Debug, Serialize)]
pub struct PoolOut {
    pub ok: bool,
    pub whirlpool: String,
    pub vault_a: String,
    pub vault_b: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct SignatureOut {
    pub ok: bool,
    pub signature: String,
}

impl MintArgs {
    pub fn hook_kind(&self) -> Result<HookKind> {
        Ok(self.hook.parse::<HookKind>()?)
    }
}

pub async fn create_mint(
    cli: &Cli,
    args: &MintArgs,
    mint_keypair: Option<&str>,
    freeze_authority: Option<&str>,
) -> Result<()> {
    let params = MintParams {
        hook: args.hook_kind()?,
        decimals: args.decimals,
        initial_supply: args.supply,
        freeze_authority: context::opt_pubkey(freeze_authority)?,
    };
    let (mint, created) = match mint_keypair {
        Some(path) => context::load_or_create_keypair(Path::new(path))?,
        None => (Keypair::new(), true),
    };
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let pb = output::spinner("creating mint");
    let res = client.create_extension_mint(&signer, &mint, &params).await;
    pb.finish_and_clear();
    let sig = res?;
    output::print(&MintOut {
        ok: true,
        mint: mint.pubkey().to_string(),
        hook: params.hook.to_string(),
        signature: sig.to_string(),
        keypair_created: created,
    })
}

pub async fn init_extra_metas(
    cli: &Cli,
    hook: &str,
    mint: &str,
    extra_accounts: &[String],
) -> Result<()> {
    let hook = hook.parse::<HookKind>()?;
    let mint = context::pubkey(mint)?;
    let metas = parse_extra_accounts(extra_accounts)?;
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let sig = client
        .initialize_extra_account_metas(&signer, hook, &mint, metas.as_deref())
        .await?;
    output::print(&SignatureOut {
        ok: true,
        signature: sig.to_string(),
    })
}

pub async fn create_pool(
    cli: &Cli,
    mint_a: &str,
    mint_b: &str,
    fee_tier: u16,
    price: f64,
    liquidity_a: u64,
    liquidity_b: u64,
) -> Result<()> {
    let params = PoolParams {
        mint_a: context::pubkey(mint_a)?,
        mint_b: context::pubkey(mint_b)?,
        fee_tier,
        initial_price: price,
        initial_liquidity_a: liquidity_a,
        initial_liquidity_b: liquidity_b,
    };
    let vault_a = Keypair::new();
    let vault_b = Keypair::new();
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;

    let pb = output::spinner("creating pool");
    let res = client.create_pool(&signer, &params, &vault_a, &vault_b).await;
    pb.finish_and_clear();
    let created = res?;
    output::print(&PoolOut {
        ok: true,
        whirlpool: created.whirlpool.to_string(),
        vault_a: vault_a.pubkey().to_string(),
        vault_b: vault_b.pubkey().to_string(),
        signature: created.signature.to_string(),
    })
}

pub struct SwapArgs<'a> {
    pub whirlpool: &'a str,
    pub mint_a: &'a str,
    pub mint_b: &'a str,
    pub vault_a: &'a str,
    pub vault_b: &'a str,
    pub amount: u64,
    pub threshold: u64,
    pub a_to_b: bool,
}

pub async fn swap(cli: &Cli, args: SwapArgs<'_>) -> Result<()> {
    let params = SwapParams {
        whirlpool: context::pubkey(args.whirlpool)?,
        mint_a: context::pubkey(args.mint_a)?,
        mint_b: context::pubkey(args.mint_b)?,
        vault_a: context::pubkey(args.vault_a)?,
        vault_b: context::pubkey(args.vault_b)?,
        amount: args.amount,
        other_amount_threshold: args.threshold,
        a_to_b: args.a_to_b,
    };
    let client = context::client(cli)?;
    let signer = context::signer(cli)?;
    let sig = client.swap(&signer, &params).await?;
    output::print(&SignatureOut {
        ok: true,
        signature: sig.to_string(),
    })
}
