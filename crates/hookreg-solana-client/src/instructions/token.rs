//! Token-2022 mint creation and transfer-hook registration.
//!
//! Thin wrappers over the SPL instruction builders so the rest of the client
//! speaks in terms of a [`MintSpec`] and a hook program.

use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_program::rent::Rent;
use solana_program::system_instruction;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_tlv_account_resolution::state::ExtraAccountMetaList;
use spl_token_2022::extension::{transfer_hook, ExtensionType};
use spl_token_2022::instruction as token_instruction;
use spl_token_2022::state::Mint;
use spl_transfer_hook_interface::instruction::initialize_extra_account_meta_list;
use tracing::debug;

use crate::catalog::ExtraAccountMeta;
use crate::config::ProgramIds;
use crate::error::RegistryResult;
use crate::pda;

/// Parameters of a new hooked mint (the extension descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintSpec {
    pub mint: Pubkey,
    pub payer: Pubkey,
    pub mint_authority: Pubkey,
    pub freeze_authority: Option<Pubkey>,
    pub hook_program: Pubkey,
    pub decimals: u8,
    /// Minted to the mint authority's associated account when non-zero.
    pub initial_supply: u64,
}

/// Size of a mint account carrying only the TransferHook extension.
pub fn hooked_mint_len() -> RegistryResult<usize> {
    Ok(ExtensionType::try_calculate_account_len::<Mint>(&[
        ExtensionType::TransferHook,
    ])?)
}

/// Instructions creating and initializing a Token-2022 mint with a transfer hook.
///
/// Order: system create_account, InitializeTransferHook, InitializeMint and,
/// for a non-zero supply, CreateIdempotent + MintTo. The mint address must
/// co-sign.
pub fn create_extension_mint(
    programs: &ProgramIds,
    spec: &MintSpec,
) -> RegistryResult<Vec<Instruction>> {
    let token_program = programs.token_2022;
    let space = hooked_mint_len()?;
    let lamports = Rent::default().minimum_balance(space);

    let mut ixs = vec![
        system_instruction::create_account(
            &spec.payer,
            &spec.mint,
            lamports,
            space as u64,
            &token_program,
        ),
        transfer_hook::instruction::initialize(
            &token_program,
            &spec.mint,
            Some(spec.mint_authority),
            Some(spec.hook_program),
        )?,
        token_instruction::initialize_mint(
            &token_program,
            &spec.mint,
            &spec.mint_authority,
            spec.freeze_authority.as_ref(),
            spec.decimals,
        )?,
    ];

    if spec.initial_supply > 0 {
        let ata = get_associated_token_address_with_program_id(
            &spec.mint_authority,
            &spec.mint,
            &token_program,
        );
        ixs.push(create_associated_token_account_idempotent(
            &spec.payer,
            &spec.mint_authority,
            &spec.mint,
            &token_program,
        ));
        ixs.push(token_instruction::mint_to(
            &token_program,
            &spec.mint,
            &ata,
            &spec.mint_authority,
            &[],
            spec.initial_supply,
        )?);
    }

    debug!(
        mint = %spec.mint,
        hook_program = %spec.hook_program,
        decimals = spec.decimals,
        space,
        instructions = ixs.len(),
        "built extension mint"
    );
    Ok(ixs)
}

/// Register the extra accounts a hook needs on every transfer of `mint`.
///
/// The hook program allocates the list account from lamports already on it,
/// so the authority first funds it with the rent for `metas`.
pub fn initialize_extra_account_metas(
    hook_program: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    metas: &[ExtraAccountMeta],
) -> RegistryResult<Vec<Instruction>> {
    let (list, _) = pda::derive_extra_account_metas(hook_program, mint)?;
    let space = ExtraAccountMetaList::size_of(metas.len())?;
    let lamports = Rent::default().minimum_balance(space);

    debug!(
        hook_program = %hook_program,
        mint = %mint,
        extra_metas = %list,
        count = metas.len(),
        space,
        "built extra account metas registration"
    );
    Ok(vec![
        system_instruction::transfer(authority, &list, lamports),
        initialize_extra_account_meta_list(hook_program, &list, mint, authority, metas),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HookKind, Seed};
    use crate::constants::{ROYALTY_HOOK_PROGRAM_ID, TOKEN_2022_PROGRAM_ID};
    use solana_program::{system_program, sysvar};
    use spl_token_2022::instruction::TokenInstruction;
    use spl_transfer_hook_interface::instruction::TransferHookInstruction;

    fn spec(supply: u64) -> MintSpec {
        MintSpec {
            mint: Pubkey::new_unique(),
            payer: Pubkey::new_unique(),
            mint_authority: Pubkey::new_unique(),
            freeze_authority: None,
            hook_program: ROYALTY_HOOK_PROGRAM_ID,
            decimals: 9,
            initial_supply: supply,
        }
    }

    #[test]
    fn hooked_mint_size() {
        assert_eq!(hooked_mint_len().unwrap(), 234);
    }

    #[test]
    fn mint_without_supply_is_three_instructions() {
        let s = spec(0);
        let ixs = create_extension_mint(&ProgramIds::default(), &s).unwrap();
        assert_eq!(ixs.len(), 3);
        assert_eq!(ixs[0].program_id, system_program::id());
        assert_eq!(ixs[1].program_id, TOKEN_2022_PROGRAM_ID);
        assert_eq!(&ixs[1].data[..2], &[36, 0]);
        assert_eq!(&ixs[1].data[2..34], s.mint_authority.as_ref());
        assert_eq!(&ixs[1].data[34..66], ROYALTY_HOOK_PROGRAM_ID.as_ref());
        assert!(matches!(
            TokenInstruction::unpack(&ixs[2].data).unwrap(),
            TokenInstruction::InitializeMint { decimals: 9, .. }
        ));
        assert_eq!(ixs[2].accounts[1].pubkey, sysvar::rent::id());
    }

    #[test]
    fn supply_adds_ata_and_mint_to() {
        let s = spec(1_000);
        let ixs = create_extension_mint(&ProgramIds::default(), &s).unwrap();
        assert_eq!(ixs.len(), 5);
        assert_eq!(ixs[3].program_id, spl_associated_token_account::id());
        assert_eq!(ixs[3].data, vec![1]);
        assert!(matches!(
            TokenInstruction::unpack(&ixs[4].data).unwrap(),
            TokenInstruction::MintTo { amount: 1_000 }
        ));
        let ata = get_associated_token_address_with_program_id(
            &s.mint_authority,
            &s.mint,
            &TOKEN_2022_PROGRAM_ID,
        );
        assert_eq!(ixs[3].accounts[1].pubkey, ata);
        assert_eq!(ixs[4].accounts[1].pubkey, ata);
        assert_eq!(ixs[3].accounts[5].pubkey, TOKEN_2022_PROGRAM_ID);
    }

    #[test]
    fn freeze_authority_is_carried() {
        let freeze = Pubkey::new_unique();
        let s = MintSpec {
            freeze_authority: Some(freeze),
            ..spec(0)
        };
        let ixs = create_extension_mint(&ProgramIds::default(), &s).unwrap();
        match TokenInstruction::unpack(&ixs[2].data).unwrap() {
            TokenInstruction::InitializeMint {
                freeze_authority, ..
            } => assert_eq!(Option::<Pubkey>::from(freeze_authority), Some(freeze)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_token_program_is_refused() {
        let programs = ProgramIds {
            token_2022: Pubkey::new_unique(),
            ..ProgramIds::default()
        };
        assert!(create_extension_mint(&programs, &spec(0)).is_err());
    }

    #[test]
    fn registration_funds_then_initializes_the_list() {
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let metas = HookKind::Royalty.extra_account_metas().unwrap();
        let ixs =
            initialize_extra_account_metas(&ROYALTY_HOOK_PROGRAM_ID, &mint, &authority, &metas)
                .unwrap();
        let (list, _) = pda::derive_extra_account_metas(&ROYALTY_HOOK_PROGRAM_ID, &mint).unwrap();

        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[0].program_id, system_program::id());
        assert_eq!(ixs[0].accounts[1].pubkey, list);

        let init = &ixs[1];
        assert_eq!(init.program_id, ROYALTY_HOOK_PROGRAM_ID);
        assert_eq!(init.accounts[0].pubkey, list);
        assert_eq!(init.accounts[1].pubkey, mint);
        assert!(init.accounts[2].is_signer);
        match TransferHookInstruction::unpack(&init.data).unwrap() {
            TransferHookInstruction::InitializeExtraAccountMetaList {
                extra_account_metas,
            } => assert_eq!(extra_account_metas, metas),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn caller_metas_are_registered_as_given() {
        let hook = Pubkey::new_unique();
        let metas = vec![
            ExtraAccountMeta::new_with_seeds(
                &[
                    Seed::Literal {
                        bytes: b"counter".to_vec(),
                    },
                    Seed::AccountKey { index: 3 },
                ],
                false,
                true,
            )
            .unwrap(),
            ExtraAccountMeta::new_with_pubkey(&Pubkey::new_unique(), false, false).unwrap(),
        ];
        let ixs =
            initialize_extra_account_metas(&hook, &Pubkey::new_unique(), &Pubkey::new_unique(), &metas)
                .unwrap();
        match TransferHookInstruction::unpack(&ixs[1].data).unwrap() {
            TransferHookInstruction::InitializeExtraAccountMetaList {
                extra_account_metas,
            } => assert_eq!(extra_account_metas, metas),
            other => panic!("unexpected {other:?}"),
        }
    }
}
