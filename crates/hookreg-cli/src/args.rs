use clap::{Args, Parser, Subcommand, ValueEnum};
use hookreg_solana_client::CLIENT_VERSION;

#[derive(Parser, Debug, Clone)]
#[command(name = "hookreg", version = CLIENT_VERSION, about = "Transfer-hook registry CLI")]
pub struct Cli {
    /// Emit JSON output on stdout and JSON logs on stderr.
    #[arg(long, global = true)]
    pub json: bool,

    /// RPC endpoint; overrides the config file.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Signer keypair file (default: ~/.config/solana/id.json).
    #[arg(long, global = true)]
    pub keypair: Option<String>,

    /// Client config JSON file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the registry root. The signer pays; authority defaults to the signer.
    InitRegistry {
        #[arg(long)]
        authority: Option<String>,
        #[arg(long)]
        threshold_bps: Option<u64>,
        #[arg(long)]
        review_period: Option<u64>,
        #[arg(long)]
        max_risk_score: Option<u8>,
    },

    /// Submit a hook program for approval.
    Submit {
        /// Hook program id, `royalty` or `custom:<id>`.
        hook: String,
        #[arg(long)]
        uri: String,
        #[arg(long)]
        proposal: Option<String>,
    },

    /// Record a risk assessment, either scored directly or from risk flags.
    Assess {
        hook: String,
        #[command(flatten)]
        assessment: AssessmentArgs,
        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Move a pending submission under review (authority only).
    BeginReview {
        hook: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Reject a pending submission (authority only).
    Reject {
        hook: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Suspend an approved hook (authority only).
    Suspend {
        hook: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Cast a governance vote.
    Vote {
        hook: String,
        #[arg(value_enum)]
        choice: VoteChoice,
        #[arg(long, default_value = "")]
        rationale: String,
    },

    /// Close the review once its window has ended.
    Finalize { hook: String },

    /// Issue the whirlpool token badge for a mint with an approved hook.
    Badge {
        hook: String,
        mint: String,
        #[arg(long)]
        whirlpools_config: Option<String>,
    },

    /// Create a Token-2022 mint with a transfer hook.
    CreateMint {
        #[command(flatten)]
        mint: MintArgs,
        /// Mint keypair file; a fresh keypair is generated and written here if missing.
        #[arg(long)]
        mint_keypair: Option<String>,
        #[arg(long)]
        freeze_authority: Option<String>,
    },

    /// Initialize the hook's extra account metas for a mint.
    InitExtraMetas {
        #[arg(long, default_value = "royalty")]
        hook: String,
        mint: String,
        #[command(flatten)]
        extra: ExtraAccountArgs,
    },

    /// Run or resume a token launch recorded in a JSON file.
    Launch {
        /// Launch record; resumed if it exists.
        #[arg(long)]
        record: String,
        /// Mint keypair file; generated if missing.
        #[arg(long)]
        mint_keypair: String,
        #[command(flatten)]
        mint: MintArgs,
        #[arg(long)]
        uri: Option<String>,
        #[command(flatten)]
        assessment: AssessmentArgs,
        #[command(flatten)]
        extra: ExtraAccountArgs,
    },

    /// Open a whirlpool for two badged mints (mint_a < mint_b).
    CreatePool {
        mint_a: String,
        mint_b: String,
        #[arg(long, default_value_t = 64)]
        fee_tier: u16,
        #[arg(long, default_value_t = 1.0)]
        price: f64,
        #[arg(long, default_value_t = 0)]
        liquidity_a: u64,
        #[arg(long, default_value_t = 0)]
        liquidity_b: u64,
    },

    /// Swap through a whirlpool.
    Swap {
        #[arg(long)]
        whirlpool: String,
        mint_a: String,
        mint_b: String,
        #[arg(long)]
        vault_a: String,
        #[arg(long)]
        vault_b: String,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value_t = 0)]
        threshold: u64,
        /// Swap token B for token A instead of A for B.
        #[arg(long)]
        b_to_a: bool,
    },

    /// Show a hook's submission, assessment and tally.
    Status { hook: String },

    /// Show the registry root config.
    Registry,

    /// Show a mint's transfer hook and badge status.
    Mint {
        mint: String,
        #[arg(long)]
        whirlpools_config: Option<String>,
    },

    /// Inspect a program account and its upgrade authority.
    Program { program: String },

    /// Print derived addresses for a hook (offline).
    Derive {
        hook: String,
        #[arg(long)]
        voter: Option<String>,
        #[arg(long)]
        mint: Option<String>,
    },

    /// Print the effective client config.
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct MintArgs {
    /// `royalty` or `custom:<program id>`.
    #[arg(long, default_value = "royalty")]
    pub hook: String,
    #[arg(long, default_value_t = 9)]
    pub decimals: u8,
    #[arg(long, default_value_t = 0)]
    pub supply: u64,
}

/// Extra accounts a custom hook reads on every transfer.
#[derive(Args, Debug, Clone, Default)]
pub struct ExtraAccountArgs {
    /// `fixed:<address>` or `pda:<seed>,...` with `@N` for transfer account N;
    /// append `:w` for writable. Repeatable; replaces the catalogued list.
    #[arg(long = "extra-account")]
    pub extra_accounts: Vec<String>,
}

/// A directly scored assessment. Used when `--score` is given.
#[derive(Args, Debug, Clone)]
pub struct AssessmentArgs {
    #[arg(long)]
    pub score: Option<u8>,
    #[arg(long)]
    pub checks_passed: bool,
    #[arg(long)]
    pub manual_review: bool,
    #[arg(long, default_value = "")]
    pub notes: String,
}

/// Risk flags scored client-side when no `--score` is given. The upgrade
/// authority flag is read from the ledger.
#[derive(Args, Debug, Clone)]
pub struct FlagArgs {
    #[arg(long)]
    pub verified_build: bool,
    #[arg(long)]
    pub token_transfers: bool,
    #[arg(long)]
    pub many_accounts: bool,
    #[arg(long)]
    pub can_block: bool,
    #[arg(long)]
    pub audited: bool,
    #[arg(long)]
    pub source_available: bool,
    #[arg(long)]
    pub best_practices: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    For,
    Against,
}
