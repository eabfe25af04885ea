//! Instruction payloads.
//!
//! Every payload is a one-byte operation discriminator followed by the
//! operation's fields in a fixed order. Decoding is the exact inverse and
//! rejects trailing bytes, because a payload is always the whole instruction
//! data.

use solana_program::pubkey::Pubkey;

use crate::codec::{check_len, CodecError, CodecResult, Reader, Writer};
use crate::model::{
    ApprovalStatus, MAX_METADATA_URI_LEN, MAX_NOTES_LEN, MAX_RATIONALE_LEN, MAX_REASON_LEN,
};
use crate::risk::RiskFlags;

/// Calls understood by the registry program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryInstruction {
    InitializeRegistry {
        authority: Pubkey,
        governance_threshold_bps: u64,
        review_period_seconds: u64,
        max_risk_score: u8,
    },
    SubmitHookForApproval {
        program_id: Pubkey,
        metadata_uri: String,
        governance_proposal_id: Option<Pubkey>,
    },
    AssessHookRisk {
        risk_score: u8,
        risk_flags: RiskFlags,
        automated_checks_passed: bool,
        requires_manual_review: bool,
        notes: String,
    },
    CastGovernanceVote {
        vote: bool,
        rationale: String,
    },
    FinalizeHookApproval,
    UpdateHookStatus {
        new_status: ApprovalStatus,
        reason: String,
    },
    AutoApproveTokenBadge {
        whirlpools_config: Pubkey,
        token_mint: Pubkey,
    },
}

impl RegistryInstruction {
    pub fn discriminator(&self) -> u8 {
        match self {
            Self::InitializeRegistry { .. } => 0,
            Self::SubmitHookForApproval { .. } => 1,
            Self::AssessHookRisk { .. } => 2,
            Self::CastGovernanceVote { .. } => 3,
            Self::FinalizeHookApproval => 4,
            Self::UpdateHookStatus { .. } => 5,
            Self::AutoApproveTokenBadge { .. } => 6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InitializeRegistry { .. } => "initialize_registry",
            Self::SubmitHookForApproval { .. } => "submit_hook_for_approval",
            Self::AssessHookRisk { .. } => "assess_hook_risk",
            Self::CastGovernanceVote { .. } => "cast_governance_vote",
            Self::FinalizeHookApproval => "finalize_hook_approval",
            Self::UpdateHookStatus { .. } => "update_hook_status",
            Self::AutoApproveTokenBadge { .. } => "auto_approve_token_badge",
        }
    }

    /// Enforce the program's string limits.
    pub fn validate(&self) -> CodecResult<()> {
        match self {
            Self::SubmitHookForApproval { metadata_uri, .. } => {
                check_len("metadata_uri", metadata_uri, MAX_METADATA_URI_LEN)
            }
            Self::AssessHookRisk { notes, .. } => check_len("notes", notes, MAX_NOTES_LEN),
            Self::CastGovernanceVote { rationale, .. } => {
                check_len("rationale", rationale, MAX_RATIONALE_LEN)
            }
            Self::UpdateHookStatus { reason, .. } => check_len("reason", reason, MAX_REASON_LEN),
            _ => Ok(()),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_discriminator(self.discriminator());
        match self {
            Self::InitializeRegistry {
                authority,
                governance_threshold_bps,
                review_period_seconds,
                max_risk_score,
            } => {
                w.pubkey(authority)
                    .u64(*governance_threshold_bps)
                    .u64(*review_period_seconds)
                    .u8(*max_risk_score);
            }
            Self::SubmitHookForApproval {
                program_id,
                metadata_uri,
                governance_proposal_id,
            } => {
                w.pubkey(program_id)
                    .string(metadata_uri)
                    .option(governance_proposal_id.as_ref(), |w, k| {
                        w.pubkey(k);
                    });
            }
            Self::AssessHookRisk {
                risk_score,
                risk_flags,
                automated_checks_passed,
                requires_manual_review,
                notes,
            } => {
                w.u8(*risk_score);
                risk_flags.write(&mut w);
                w.bool(*automated_checks_passed)
                    .bool(*requires_manual_review)
                    .string(notes);
            }
            Self::CastGovernanceVote { vote, rationale } => {
                w.bool(*vote).string(rationale);
            }
            Self::FinalizeHookApproval => {}
            Self::UpdateHookStatus { new_status, reason } => {
                w.u8(new_status.as_byte()).string(reason);
            }
            Self::AutoApproveTokenBadge {
                whirlpools_config,
                token_mint,
            } => {
                w.pubkey(whirlpools_config).pubkey(token_mint);
            }
        }
        w.into_inner()
    }

    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(data);
        let tag = r.u8("discriminator")?;
        let ix = match tag {
            0 => Self::InitializeRegistry {
                authority: r.pubkey("authority")?,
                governance_threshold_bps: r.u64("governance_threshold_bps")?,
                review_period_seconds: r.u64("review_period_seconds")?,
                max_risk_score: r.u8("max_risk_score")?,
            },
            1 => Self::SubmitHookForApproval {
                program_id: r.pubkey("program_id")?,
                metadata_uri: r.string("metadata_uri")?,
                governance_proposal_id: r
                    .option("governance_proposal_id", |r| r.pubkey("governance_proposal_id"))?,
            },
            2 => Self::AssessHookRisk {
                risk_score: r.u8("risk_score")?,
                risk_flags: RiskFlags::read(&mut r)?,
                automated_checks_passed: r.bool("automated_checks_passed")?,
                requires_manual_review: r.bool("requires_manual_review")?,
                notes: r.string("notes")?,
            },
            3 => Self::CastGovernanceVote {
                vote: r.bool("vote")?,
                rationale: r.string("rationale")?,
            },
            4 => Self::FinalizeHookApproval,
            5 => Self::UpdateHookStatus {
                new_status: ApprovalStatus::read(&mut r, "new_status")?,
                reason: r.string("reason")?,
            },
            6 => Self::AutoApproveTokenBadge {
                whirlpools_config: r.pubkey("whirlpools_config")?,
                token_mint: r.pubkey("token_mint")?,
            },
            found => {
                return Err(CodecError::UnknownDiscriminator {
                    what: "registry instruction",
                    found,
                })
            }
        };
        r.finish("registry instruction")?;
        Ok(ix)
    }
}

/// Calls understood by the consuming pool program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolInstruction {
    CreatePool {
        fee_tier: u16,
        /// Q64.64 square root of the initial price.
        initial_sqrt_price: u128,
        initial_liquidity_a: u64,
        initial_liquidity_b: u64,
    },
    Swap {
        amount: u64,
        other_amount_threshold: u64,
        a_to_b: bool,
    },
}

impl PoolInstruction {
    pub fn discriminator(&self) -> u8 {
        match self {
            Self::CreatePool { .. } => 0,
            Self::Swap { .. } => 1,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::with_discriminator(self.discriminator());
        match self {
            Self::CreatePool {
                fee_tier,
                initial_sqrt_price,
                initial_liquidity_a,
                initial_liquidity_b,
            } => {
                w.u16(*fee_tier)
                    .u128(*initial_sqrt_price)
                    .u64(*initial_liquidity_a)
                    .u64(*initial_liquidity_b);
            }
            Self::Swap {
                amount,
                other_amount_threshold,
                a_to_b,
            } => {
                w.u64(*amount).u64(*other_amount_threshold).bool(*a_to_b);
            }
        }
        w.into_inner()
    }

    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        let mut r = Reader::new(data);
        let ix = match r.u8("discriminator")? {
            0 => Self::CreatePool {
                fee_tier: r.u16("fee_tier")?,
                initial_sqrt_price: r.u128("initial_sqrt_price")?,
                initial_liquidity_a: r.u64("initial_liquidity_a")?,
                initial_liquidity_b: r.u64("initial_liquidity_b")?,
            },
            1 => Self::Swap {
                amount: r.u64("amount")?,
                other_amount_threshold: r.u64("other_amount_threshold")?,
                a_to_b: r.bool("a_to_b")?,
            },
            found => {
                return Err(CodecError::UnknownDiscriminator {
                    what: "pool instruction",
                    found,
                })
            }
        };
        r.finish("pool instruction")?;
        Ok(ix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    #[test]
    fn submit_layout() {
        let ix = RegistryInstruction::SubmitHookForApproval {
            program_id: key(9),
            metadata_uri: "uri".to_string(),
            governance_proposal_id: None,
        };
        let bytes = ix.encode();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..33], key(9).as_ref());
        assert_eq!(&bytes[33..37], &[3, 0, 0, 0]);
        assert_eq!(&bytes[37..40], b"uri");
        assert_eq!(bytes[40], 0);
        assert_eq!(bytes.len(), 41);
    }

    #[test]
    fn finalize_is_a_bare_discriminator() {
        assert_eq!(RegistryInstruction::FinalizeHookApproval.encode(), vec![4]);
    }

    #[test]
    fn vote_layout() {
        let ix = RegistryInstruction::CastGovernanceVote {
            vote: true,
            rationale: String::new(),
        };
        assert_eq!(ix.encode(), vec![3, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn assessment_carries_its_flags() {
        let ix = RegistryInstruction::AssessHookRisk {
            risk_score: 40,
            risk_flags: RiskFlags {
                performs_token_transfers: true,
                ..RiskFlags::default()
            },
            automated_checks_passed: false,
            requires_manual_review: true,
            notes: String::new(),
        };
        assert_eq!(
            ix.encode(),
            vec![2, 40, 1, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn unknown_discriminator() {
        assert_matches!(
            RegistryInstruction::decode(&[42]),
            Err(CodecError::UnknownDiscriminator { found: 42, .. })
        );
        assert_matches!(
            PoolInstruction::decode(&[7]),
            Err(CodecError::UnknownDiscriminator { found: 7, .. })
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        assert_matches!(
            RegistryInstruction::decode(&[4, 0]),
            Err(CodecError::TrailingBytes { remaining: 1, .. })
        );
    }

    #[test]
    fn limits_enforced() {
        let ix = RegistryInstruction::CastGovernanceVote {
            vote: false,
            rationale: "x".repeat(MAX_RATIONALE_LEN + 1),
        };
        assert_matches!(ix.validate(), Err(CodecError::TooLong { field: "rationale", .. }));
    }

    fn registry_instruction() -> impl Strategy<Value = RegistryInstruction> {
        let k = any::<[u8; 32]>().prop_map(Pubkey::new_from_array);
        prop_oneof![
            (k.clone(), 1u64..=10_000, any::<u64>(), any::<u8>()).prop_map(|(a, t, p, m)| {
                RegistryInstruction::InitializeRegistry {
                    authority: a,
                    governance_threshold_bps: t,
                    review_period_seconds: p,
                    max_risk_score: m,
                }
            }),
            (k.clone(), ".{0,40}", proptest::option::of(k.clone())).prop_map(|(p, u, g)| {
                RegistryInstruction::SubmitHookForApproval {
                    program_id: p,
                    metadata_uri: u,
                    governance_proposal_id: g,
                }
            }),
            (0u8..=100, any::<[bool; 8]>(), any::<bool>(), any::<bool>(), ".{0,40}").prop_map(
                |(s, f, a, m, n)| RegistryInstruction::AssessHookRisk {
                    risk_score: s,
                    risk_flags: RiskFlags {
                        has_upgrade_authority: f[0],
                        is_verified_build: f[1],
                        performs_token_transfers: f[2],
                        requests_many_accounts: f[3],
                        can_block_transfers: f[4],
                        is_audited: f[5],
                        source_code_available: f[6],
                        follows_best_practices: f[7],
                    },
                    automated_checks_passed: a,
                    requires_manual_review: m,
                    notes: n,
                },
            ),
            (any::<bool>(), ".{0,40}").prop_map(|(vote, rationale)| {
                RegistryInstruction::CastGovernanceVote { vote, rationale }
            }),
            Just(RegistryInstruction::FinalizeHookApproval),
            (0u8..=5, ".{0,40}").prop_map(|(s, reason)| RegistryInstruction::UpdateHookStatus {
                new_status: ApprovalStatus::from_byte(s).unwrap(),
                reason,
            }),
            (k.clone(), k).prop_map(|(c, m)| RegistryInstruction::AutoApproveTokenBadge {
                whirlpools_config: c,
                token_mint: m,
            }),
        ]
    }

    proptest! {
        #[test]
        fn registry_payloads_decode_what_was_encoded(ix in registry_instruction()) {
            prop_assert_eq!(RegistryInstruction::decode(&ix.encode()).unwrap(), ix);
        }

        #[test]
        fn pool_payloads_decode_what_was_encoded(
            fee in any::<u16>(),
            sqrt in any::<u128>(),
            a in any::<u64>(),
            b in any::<u64>(),
            flag in any::<bool>(),
        ) {
            let create = PoolInstruction::CreatePool {
                fee_tier: fee,
                initial_sqrt_price: sqrt,
                initial_liquidity_a: a,
                initial_liquidity_b: b,
            };
            prop_assert_eq!(PoolInstruction::decode(&create.encode()).unwrap(), create);
            let swap = PoolInstruction::Swap { amount: a, other_amount_threshold: b, a_to_b: flag };
            prop_assert_eq!(PoolInstruction::decode(&swap.encode()).unwrap(), swap);
        }

        #[test]
        fn truncated_payloads_never_decode(ix in registry_instruction(), cut in 0usize..8) {
            let bytes = ix.encode();
            prop_assume!(cut < bytes.len() && bytes.len() > 1);
            let short = &bytes[..bytes.len() - 1 - cut.min(bytes.len() - 2)];
            prop_assert!(RegistryInstruction::decode(short).is_err());
        }
    }
}
