//! PDA derivation helpers for the registry and its neighbouring programs.
//!
//! Derivation hashes `seeds || [bump] || program_id || "ProgramDerivedAddress"`
//! for bump 255 down to 0 and keeps the first digest that is not a valid
//! ed25519 point, so no keypair can ever sign for the result. The output is a
//! pure function of its inputs; re-deriving is how the client finds
//! submissions, votes and registrations without any stored mapping.

use hookreg_core::hash::sha256;
use solana_program::pubkey::Pubkey;

use crate::constants::{
    SEED_CONFIG_EXTENSION, SEED_EXTRA_ACCOUNT_METAS, SEED_REGISTRY,
    SEED_RISK_ASSESSMENT, SEED_ROYALTY_VAULT, SEED_SUBMISSION, SEED_TOKEN_BADGE, SEED_VOTE,
    SEED_WHIRLPOOL,
};
use crate::error::{InputError, RegistryError, RegistryResult};

/// Domain marker appended to every derivation hash.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Seeds per derivation, including the bump.
pub const MAX_SEEDS: usize = 16;

pub const MAX_SEED_LEN: usize = 32;

/// Derive a program-owned address and its bump.
pub fn derive(program_id: &Pubkey, seeds: &[&[u8]]) -> RegistryResult<(Pubkey, u8)> {
    if seeds.len() >= MAX_SEEDS {
        return Err(InputError::TooManySeeds(seeds.len()).into());
    }
    if let Some((index, seed)) = seeds.iter().enumerate().find(|(_, s)| s.len() > MAX_SEED_LEN) {
        return Err(InputError::SeedTooLong {
            index,
            len: seed.len(),
        }
        .into());
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 3);
        parts.extend_from_slice(seeds);
        parts.push(&bump_seed);
        parts.push(program_id.as_ref());
        parts.push(PDA_MARKER);

        let candidate = Pubkey::new_from_array(sha256(&parts));
        if !candidate.is_on_curve() {
            return Ok((candidate, bump));
        }
    }
    Err(RegistryError::NoValidDerivation {
        program_id: *program_id,
    })
}

/// Addresses a registry operation touches for one hook program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPdas {
    pub registry_config: (Pubkey, u8),
    pub submission: (Pubkey, u8),
    pub risk_assessment: (Pubkey, u8),
}

/// Derive the registry root config.
pub fn derive_registry_config(registry_program: &Pubkey) -> RegistryResult<(Pubkey, u8)> {
    derive(registry_program, &[SEED_REGISTRY])
}

/// Derive the submission record for a hook program.
pub fn derive_submission(
    registry_program: &Pubkey,
    hook_program: &Pubkey,
) -> RegistryResult<(Pubkey, u8)> {
    derive(registry_program, &[SEED_SUBMISSION, hook_program.as_ref()])
}

pub fn derive_risk_assessment(
    registry_program: &Pubkey,
    submission: &Pubkey,
) -> RegistryResult<(Pubkey, u8)> {
    derive(registry_program, &[SEED_RISK_ASSESSMENT, submission.as_ref()])
}

/// Derive the vote record of `voter` on `submission`. One address per pair is
/// what makes a second vote collide at commit time.
pub fn derive_vote(
    registry_program: &Pubkey,
    submission: &Pubkey,
    voter: &Pubkey,
) -> RegistryResult<(Pubkey, u8)> {
    derive(
        registry_program,
        &[SEED_VOTE, submission.as_ref(), voter.as_ref()],
    )
}

pub fn pdas_for_hook(
    registry_program: &Pubkey,
    hook_program: &Pubkey,
) -> RegistryResult<SubmissionPdas> {
    let submission = derive_submission(registry_program, hook_program)?;
    Ok(SubmissionPdas {
        registry_config: derive_registry_config(registry_program)?,
        risk_assessment: derive_risk_assessment(registry_program, &submission.0)?,
        submission,
    })
}

/// Derive the extra-account-metas list of `mint`, owned by the hook program.
pub fn derive_extra_account_metas(
    hook_program: &Pubkey,
    mint: &Pubkey,
) -> RegistryResult<(Pubkey, u8)> {
    derive(hook_program, &[SEED_EXTRA_ACCOUNT_METAS, mint.as_ref()])
}

pub fn derive_token_badge(
    whirlpool_program: &Pubkey,
    whirlpools_config: &Pubkey,
    mint: &Pubkey,
) -> RegistryResult<(Pubkey, u8)> {
    derive(
        whirlpool_program,
        &[SEED_TOKEN_BADGE, whirlpools_config.as_ref(), mint.as_ref()],
    )
}

pub fn derive_config_extension(
    whirlpool_program: &Pubkey,
    whirlpools_config: &Pubkey,
) -> RegistryResult<(Pubkey, u8)> {
    derive(
        whirlpool_program,
        &[SEED_CONFIG_EXTENSION, whirlpools_config.as_ref()],
    )
}

/// Derive a pool address. The fee tier is encoded little-endian.
pub fn derive_whirlpool(
    whirlpool_program: &Pubkey,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    fee_tier: u16,
) -> RegistryResult<(Pubkey, u8)> {
    let fee = fee_tier.to_le_bytes();
    derive(
        whirlpool_program,
        &[SEED_WHIRLPOOL, mint_a.as_ref(), mint_b.as_ref(), &fee],
    )
}

pub fn derive_royalty_vault(hook_program: &Pubkey) -> RegistryResult<(Pubkey, u8)> {
    derive(hook_program, &[SEED_ROYALTY_VAULT])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        DEFAULT_WHIRLPOOLS_CONFIG, REGISTRY_PROGRAM_ID, ROYALTY_HOOK_PROGRAM_ID,
        WHIRLPOOL_PROGRAM_ID,
    };
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use spl_transfer_hook_interface::get_extra_account_metas_address_and_bump_seed;

    fn reference(program_id: &Pubkey, seeds: &[&[u8]]) -> (Pubkey, u8) {
        Pubkey::find_program_address(seeds, program_id)
    }

    #[test]
    fn registry_addresses_match_runtime_derivation() {
        let hook = ROYALTY_HOOK_PROGRAM_ID;
        let voter = Pubkey::new_unique();

        let config = derive_registry_config(&REGISTRY_PROGRAM_ID).unwrap();
        assert_eq!(config, reference(&REGISTRY_PROGRAM_ID, &[b"registry"]));

        let sub = derive_submission(&REGISTRY_PROGRAM_ID, &hook).unwrap();
        assert_eq!(
            sub,
            reference(&REGISTRY_PROGRAM_ID, &[b"submission", hook.as_ref()])
        );

        let vote = derive_vote(&REGISTRY_PROGRAM_ID, &sub.0, &voter).unwrap();
        assert_eq!(
            vote,
            reference(
                &REGISTRY_PROGRAM_ID,
                &[b"vote", sub.0.as_ref(), voter.as_ref()]
            )
        );

        let pdas = pdas_for_hook(&REGISTRY_PROGRAM_ID, &hook).unwrap();
        assert_eq!(pdas.submission, sub);
        assert_eq!(
            pdas.risk_assessment,
            reference(&REGISTRY_PROGRAM_ID, &[b"risk_assessment", sub.0.as_ref()])
        );
    }

    #[test]
    fn neighbour_program_addresses_match_runtime_derivation() {
        let mint = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        assert_eq!(
            derive_extra_account_metas(&ROYALTY_HOOK_PROGRAM_ID, &mint).unwrap(),
            reference(
                &ROYALTY_HOOK_PROGRAM_ID,
                &[b"extra-account-metas", mint.as_ref()]
            )
        );
        assert_eq!(
            derive_token_badge(&WHIRLPOOL_PROGRAM_ID, &DEFAULT_WHIRLPOOLS_CONFIG, &mint).unwrap(),
            reference(
                &WHIRLPOOL_PROGRAM_ID,
                &[b"token_badge", DEFAULT_WHIRLPOOLS_CONFIG.as_ref(), mint.as_ref()]
            )
        );
        assert_eq!(
            derive_whirlpool(&WHIRLPOOL_PROGRAM_ID, &mint, &other, 64).unwrap(),
            reference(
                &WHIRLPOOL_PROGRAM_ID,
                &[b"whirlpool", mint.as_ref(), other.as_ref(), &[64, 0]]
            )
        );
    }

    #[test]
    fn registration_address_matches_the_hook_interface() {
        let mint = Pubkey::new_unique();
        let hook = Pubkey::new_unique();
        let (ours, bump) = derive_extra_account_metas(&hook, &mint).unwrap();
        assert_eq!(
            (ours, bump),
            get_extra_account_metas_address_and_bump_seed(&mint, &hook)
        );
        assert_eq!(
            derive_royalty_vault(&ROYALTY_HOOK_PROGRAM_ID).unwrap(),
            reference(&ROYALTY_HOOK_PROGRAM_ID, &[b"royalty_vault"])
        );
    }

    #[test]
    fn derived_addresses_are_off_curve() {
        let (addr, _) = derive_registry_config(&REGISTRY_PROGRAM_ID).unwrap();
        assert!(!addr.is_on_curve());
    }

    #[test]
    fn seed_limits() {
        let seed = [0u8; 33];
        assert_matches!(
            derive(&REGISTRY_PROGRAM_ID, &[b"ok", &seed]),
            Err(RegistryError::Input(InputError::SeedTooLong { index: 1, len: 33 }))
        );
        let many: Vec<&[u8]> = vec![&b"s"[..]; MAX_SEEDS];
        assert_matches!(
            derive(&REGISTRY_PROGRAM_ID, &many),
            Err(RegistryError::Input(InputError::TooManySeeds(16)))
        );
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(
            program in any::<[u8; 32]>(),
            seeds in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..=32), 0..4),
        ) {
            let program = Pubkey::new_from_array(program);
            let refs: Vec<&[u8]> = seeds.iter().map(|s| s.as_slice()).collect();
            let first = derive(&program, &refs).unwrap();
            let second = derive(&program, &refs).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, reference(&program, &refs));
        }
    }
}
