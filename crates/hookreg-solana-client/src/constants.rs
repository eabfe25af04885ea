//! Constants shared between the on-chain programs and clients.
//!
//! Keep these stable because they affect PDA derivation.

use solana_program::pubkey;
use solana_program::pubkey::Pubkey;

/// PDA seed for the registry root config.
pub const SEED_REGISTRY: &[u8] = b"registry";

/// PDA seed for hook submissions (+ hook program id).
pub const SEED_SUBMISSION: &[u8] = b"submission";

/// PDA seed for risk assessments (+ submission address).
pub const SEED_RISK_ASSESSMENT: &[u8] = b"risk_assessment";

/// PDA seed for governance votes (+ submission + voter).
pub const SEED_VOTE: &[u8] = b"vote";

/// PDA seed for the transfer-hook extra account metas list (+ mint), under the hook program.
pub const SEED_EXTRA_ACCOUNT_METAS: &[u8] = b"extra-account-metas";

/// PDA seed for whirlpool token badges (+ config + mint).
pub const SEED_TOKEN_BADGE: &[u8] = b"token_badge";

/// PDA seed for whirlpools (+ mint_a + mint_b + fee tier LE).
pub const SEED_WHIRLPOOL: &[u8] = b"whirlpool";

/// PDA seed for the whirlpools config extension (+ config).
pub const SEED_CONFIG_EXTENSION: &[u8] = b"config_extension";

/// Literal seed of the royalty hook's vault account.
pub const SEED_ROYALTY_VAULT: &[u8] = b"royalty_vault";

/// Deployed registry program.
pub const REGISTRY_PROGRAM_ID: Pubkey = pubkey!("A8UEmdwPDW5pqsU7iMEvwDn2C7fC6bsZGoRceukLzadE");

/// Deployed royalty transfer-hook program.
pub const ROYALTY_HOOK_PROGRAM_ID: Pubkey = pubkey!("7NsQqWLbikjv3kWqujtb2YQGToY4LSdn35egQs4AJEHC");

pub const WHIRLPOOL_PROGRAM_ID: Pubkey = pubkey!("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc");

pub const DEFAULT_WHIRLPOOLS_CONFIG: Pubkey = pubkey!("2LecshUwdy9xi7meFgHtFJQNSKk4KdTrcpvaB56dP2NQ");

pub const TOKEN_2022_PROGRAM_ID: Pubkey = spl_token_2022::ID;

/// Upgradeable BPF loader; owner of upgradeable program accounts.
pub const BPF_UPGRADEABLE_LOADER_ID: Pubkey =
    pubkey!("BPFLoaderUpgradeab1e11111111111111111111111");

/// Default devnet endpoint.
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Version string embedded into client metadata.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
