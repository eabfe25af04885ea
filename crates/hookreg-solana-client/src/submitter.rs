//! Transaction submitter.
//!
//! One call = one transaction: fetch an anchor, assemble, sign with any known
//! co-signers, hand the bytes to the external signer, dispatch and poll for
//! confirmation. Outcomes are reported exactly once and never retried here:
//! an expired anchor is `StaleAnchor`, a timeout is `Unconfirmed` (the
//! transaction may still land; re-query before resubmitting).

use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::ConfirmSettings;
use crate::error::{InputError, RegistryError, RegistryResult};
use crate::rpc::{Anchor, CommitFailure, CommitStatus, LedgerRpc, RpcError};
use crate::signer::{SignerError, TransactionSigner};

/// Instructions sharing one fee payer and one anchor.
pub struct SubmitRequest<'a> {
    pub calls: Vec<Instruction>,
    pub fee_payer: Pubkey,
    /// Keys generated for this transaction (new mints, vaults); signed here.
    pub co_signers: &'a [&'a Keypair],
}

impl<'a> SubmitRequest<'a> {
    pub fn new(calls: Vec<Instruction>, fee_payer: Pubkey) -> Self {
        Self {
            calls,
            fee_payer,
            co_signers: &[],
        }
    }

    pub fn with_co_signers(mut self, co_signers: &'a [&'a Keypair]) -> Self {
        self.co_signers = co_signers;
        self
    }
}

pub struct Submitter<'a, R: ?Sized> {
    rpc: &'a R,
    confirm: ConfirmSettings,
}

impl<'a, R: LedgerRpc + ?Sized> Submitter<'a, R> {
    pub fn new(rpc: &'a R, confirm: ConfirmSettings) -> Self {
        Self { rpc, confirm }
    }

    pub async fn submit(
        &self,
        req: SubmitRequest<'_>,
        signer: &dyn TransactionSigner,
    ) -> RegistryResult<Signature> {
        if req.calls.is_empty() {
            return Err(InputError::EmptyTransaction.into());
        }

        let anchor = self.rpc.get_latest_anchor().await?;
        let mut tx = Transaction::new_with_payer(&req.calls, Some(&req.fee_payer));
        tx.message.recent_blockhash = anchor.blockhash;
        if !req.co_signers.is_empty() {
            tx.try_partial_sign(req.co_signers, anchor.blockhash)
                .map_err(|e| SignerError::Failed(format!("co-signer: {e}")))?;
        }

        let unsigned = bincode::serialize(&tx)
            .map_err(|e| InputError::Other(format!("transaction encoding: {e}")))?;
        let signed = signer.sign(unsigned).await?;
        let signed_tx: Transaction = bincode::deserialize(&signed)
            .map_err(|e| SignerError::Failed(format!("signer returned malformed bytes: {e}")))?;
        if !signed_tx.is_signed() {
            return Err(SignerError::Failed("transaction is missing signatures".to_string()).into());
        }
        let expected = signed_tx.signatures.first().copied().unwrap_or_default();

        debug!(
            instructions = req.calls.len(),
            fee_payer = %req.fee_payer,
            blockhash = %anchor.blockhash,
            "dispatching transaction"
        );
        let signature = match self.rpc.send(&signed).await {
            Ok(sig) => sig,
            Err(RpcError::Refused(CommitFailure::BlockhashNotFound)) => {
                warn!(signature = %expected, "anchor expired before dispatch");
                return Err(RegistryError::StaleAnchor {
                    signature: expected,
                });
            }
            Err(RpcError::Refused(failure)) => {
                let failure = failure.attribute(&signed_tx.message);
                warn!(signature = %expected, %failure, "transaction refused");
                return Err(RegistryError::Rejected {
                    signature: expected,
                    failure,
                });
            }
            Err(e) => return Err(e.into()),
        };
        info!(signature = %signature, "transaction dispatched");

        self.await_confirmation(&signature, &anchor, &signed_tx.message)
            .await
    }

    async fn await_confirmation(
        &self,
        signature: &Signature,
        anchor: &Anchor,
        message: &Message,
    ) -> RegistryResult<Signature> {
        let deadline = Instant::now() + self.confirm.timeout();
        loop {
            match self.rpc.confirm(signature, anchor).await {
                Ok(CommitStatus::Confirmed) => {
                    info!(signature = %signature, "transaction confirmed");
                    return Ok(*signature);
                }
                Ok(CommitStatus::Expired)
                | Ok(CommitStatus::Failed(CommitFailure::BlockhashNotFound)) => {
                    warn!(signature = %signature, "anchor expired before confirmation");
                    return Err(RegistryError::StaleAnchor {
                        signature: *signature,
                    });
                }
                Ok(CommitStatus::Failed(failure)) => {
                    let failure = failure.attribute(message);
                    warn!(signature = %signature, %failure, "transaction failed");
                    return Err(RegistryError::Rejected {
                        signature: *signature,
                        failure,
                    });
                }
                Ok(CommitStatus::Pending) => {}
                Err(e) if e.is_transport() => {
                    warn!(signature = %signature, error = %e, "confirmation probe failed");
                }
                Err(e) => return Err(e.into()),
            }

            if Instant::now() >= deadline {
                warn!(signature = %signature, "confirmation timed out");
                return Err(RegistryError::Unconfirmed {
                    signature: *signature,
                });
            }
            sleep(self.confirm.poll_interval()).await;
        }
    }
}
