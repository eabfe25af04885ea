//! Supported transfer-hook kinds.
//!
//! The set of hooks is closed: a kind is either the deployed royalty hook or
//! an explicitly addressed custom program. Identifiers are stable strings
//! (`"royalty"`, `"custom:<base58>"`) and anything else is an input error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
pub use spl_tlv_account_resolution::account::ExtraAccountMeta;
pub use spl_tlv_account_resolution::seeds::Seed;

use crate::constants::{ROYALTY_HOOK_PROGRAM_ID, SEED_ROYALTY_VAULT};
use crate::error::{InputError, RegistryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HookKind {
    Royalty,
    Custom(Pubkey),
}

impl HookKind {
    /// Kind of a hook found on a mint: the royalty program is recognized,
    /// anything else is custom.
    pub fn from_program_id(id: Pubkey) -> Self {
        if id == ROYALTY_HOOK_PROGRAM_ID {
            Self::Royalty
        } else {
            Self::Custom(id)
        }
    }

    pub fn program_id(&self) -> Pubkey {
        match self {
            Self::Royalty => ROYALTY_HOOK_PROGRAM_ID,
            Self::Custom(id) => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Royalty => "Royalty",
            Self::Custom(_) => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Royalty => "Routes a share of every transfer to the royalty vault",
            Self::Custom(_) => "Caller-supplied transfer-hook program",
        }
    }

    /// Extra accounts the hook is known to need on every transfer. Custom
    /// hooks have no catalogued list; callers registering one pass their own.
    pub fn extra_account_metas(&self) -> RegistryResult<Vec<ExtraAccountMeta>> {
        Ok(match self {
            Self::Royalty => vec![ExtraAccountMeta::new_with_seeds(
                &[Seed::Literal {
                    bytes: SEED_ROYALTY_VAULT.to_vec(),
                }],
                false,
                true,
            )?],
            Self::Custom(_) => Vec::new(),
        })
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Royalty => f.write_str("royalty"),
            Self::Custom(id) => write!(f, "custom:{id}"),
        }
    }
}

impl FromStr for HookKind {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "royalty" {
            return Ok(Self::Royalty);
        }
        if let Some(addr) = s.strip_prefix("custom:") {
            return parse_pubkey(addr).map(Self::Custom);
        }
        Err(InputError::UnknownHookKind(s.to_string()))
    }
}

impl TryFrom<String> for HookKind {
    type Error = InputError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HookKind> for String {
    fn from(k: HookKind) -> Self {
        k.to_string()
    }
}

/// Parse one extra account in its text form:
///
/// - `fixed:<address>` for a fixed account,
/// - `pda:<seed>,<seed>,...` for an address derived under the hook program,
///   where `@N` is the key of transfer account N (source 0, mint 1,
///   destination 2, owner 3) and anything else is literal bytes.
///
/// A trailing `:w` marks the account writable.
pub fn parse_extra_account(s: &str) -> Result<ExtraAccountMeta, InputError> {
    let s = s.trim();
    let invalid = |reason: &str| InputError::Other(format!("extra account {s:?}: {reason}"));
    let (body, is_writable) = match s.strip_suffix(":w") {
        Some(body) => (body, true),
        None => (s, false),
    };
    if let Some(address) = body.strip_prefix("fixed:") {
        return Ok(ExtraAccountMeta::new_with_pubkey(
            &parse_pubkey(address)?,
            false,
            is_writable,
        )?);
    }
    let Some(seeds) = body.strip_prefix("pda:") else {
        return Err(invalid("expected fixed:<address> or pda:<seeds>"));
    };
    let seeds = seeds
        .split(',')
        .map(|seed| match seed.strip_prefix('@') {
            Some(index) => index
                .parse::<u8>()
                .map(|index| Seed::AccountKey { index })
                .map_err(|_| invalid("account index must be 0-255")),
            None if seed.is_empty() => Err(invalid("empty seed")),
            None => Ok(Seed::Literal {
                bytes: seed.as_bytes().to_vec(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExtraAccountMeta::new_with_seeds(&seeds, false, is_writable)?)
}

/// Parse a list of text-form extra accounts. An empty list means "use the
/// catalogued metas".
pub fn parse_extra_accounts(specs: &[String]) -> Result<Option<Vec<ExtraAccountMeta>>, InputError> {
    if specs.is_empty() {
        return Ok(None);
    }
    specs
        .iter()
        .map(|s| parse_extra_account(s))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse a base58 address, reporting the offending text on failure.
pub fn parse_pubkey(s: &str) -> Result<Pubkey, InputError> {
    let bytes = bs58::decode(s.trim())
        .into_vec()
        .map_err(|e| InputError::Address {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
    let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| InputError::Address {
        value: s.to_string(),
        reason: format!("expected 32 bytes, got {}", b.len()),
    })?;
    Ok(Pubkey::new_from_array(arr))
}
