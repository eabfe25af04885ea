//! Instruction builders.
//!
//! Every builder is pure: it derives the addresses it needs, lays out the
//! account list in the order the target program expects and encodes the
//! payload. Nothing here touches the network. Account order is part of the
//! wire contract and is documented on each builder.

pub mod pool;
pub mod registry;
pub mod token;

use solana_program::instruction::AccountMeta;
use solana_program::pubkey::Pubkey;

pub(crate) fn writable(key: Pubkey) -> AccountMeta {
    AccountMeta::new(key, false)
}

pub(crate) fn readonly(key: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(key, false)
}

pub(crate) fn signer_writable(key: Pubkey) -> AccountMeta {
    AccountMeta::new(key, true)
}

pub(crate) fn signer_readonly(key: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(key, true)
}
