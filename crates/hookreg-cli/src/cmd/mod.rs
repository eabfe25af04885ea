use anyhow::Result;

use crate::args::{Cli, Command};

mod launch;
mod query;
mod registry;
mod token;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::InitRegistry {
            authority,
            threshold_bps,
            review_period,
            max_risk_score,
        } => {
            registry::init(&cli, authority.as_deref(), *threshold_bps, *review_period, *max_risk_score)
                .await
        }
        Command::Submit { hook, uri, proposal } => {
            registry::submit(&cli, hook, uri, proposal.as_deref()).await
        }
        Command::Assess {
            hook,
            assessment,
            flags,
        } => registry::assess(&cli, hook, assessment, flags).await,
        Command::BeginReview { hook, reason } => registry::begin_review(&cli, hook, reason).await,
        Command::Reject { hook, reason } => registry::reject(&cli, hook, reason).await,
        Command::Suspend { hook, reason } => registry::suspend(&cli, hook, reason).await,
        Command::Vote {
            hook,
            choice,
            rationale,
        } => registry::vote(&cli, hook, *choice, rationale).await,
        Command::Finalize { hook } => registry::finalize(&cli, hook).await,
        Command::Badge {
            hook,
            mint,
            whirlpools_config,
        } => registry::badge(&cli, hook, mint, whirlpools_config.as_deref()).await,
        Command::CreateMint {
            mint,
            mint_keypair,
            freeze_authority,
        } => {
            token::create_mint(&cli, mint, mint_keypair.as_deref(), freeze_authority.as_deref())
                .await
        }
        Command::InitExtraMetas { hook, mint, extra } => {
            token::init_extra_metas(&cli, hook, mint, &extra.extra_accounts).await
        }
        Command::Launch {
            record,
            mint_keypair,
            mint,
            uri,
            assessment,
            extra,
        } => {
            launch::run(
                &cli,
                record,
                mint_keypair,
                mint,
                uri.as_deref(),
                assessment,
                &extra.extra_accounts,
            )
            .await
        }
        Command::CreatePool {
            mint_a,
            mint_b,
            fee_tier,
            price,
            liquidity_a,
            liquidity_b,
        } => {
            token::create_pool(&cli, mint_a, mint_b, *fee_tier, *price, *liquidity_a, *liquidity_b)
                .await
        }
        Command::Swap {
            whirlpool,
            mint_a,
            mint_b,
            vault_a,
            vault_b,
            amount,
            threshold,
            b_to_a,
        } => {
            token::swap(
                &cli,
                token::SwapArgs {
                    whirlpool,
                    mint_a,
                    mint_b,
                    vault_a,
                    vault_b,
                    amount: *amount,
                    threshold: *threshold,
                    a_to_b: !*b_to_a,
                },
            )
            .await
        }
        Command::Status { hook } => query::status(&cli, hook).await,
        Command::Registry => query::registry(&cli).await,
        Command::Mint {
            mint,
            whirlpools_config,
        } => query::mint(&cli, mint, whirlpools_config.as_deref()).await,
        Command::Program { program } => query::program(&cli, program).await,
        Command::Derive { hook, voter, mint } => {
            query::derive(&cli, hook, voter.as_deref(), mint.as_deref())
        }
        Command::Config => query::config(&cli),
    }
}
