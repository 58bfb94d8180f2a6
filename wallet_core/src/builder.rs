//! Two-pass, fee-converging construction of a consolidation transaction.
//!
//! The fee depends on the serialized size of the *signed* transaction, and
//! signature sizes vary, so the size is measured instead of guessed:
//!
//! 1. **Pass 1** builds, signs and decodes a transaction paying the whole batch
//!    total to the destination (zero fee). Only its size is kept.
//! 2. The fee is `size * per_byte + base`. A fee that would eat the whole
//!    total is refused here, before anything else is built.
//! 3. The caller asks the operator to approve the fee (see [`crate::session`]).
//! 4. **Pass 2** rebuilds with `total - fee`, signs, decodes, checks the output
//!    value, and broadcasts. The Pass-1 transaction is never sent.
//!
//! Every remote call is attempted once. A failure anywhere before the
//! broadcast leaves nothing behind on the network.

use dustsweep_rpc::{DecodedTransaction, RpcMethod, WalletRpc};
use dustsweep_types::{Amount, FeeEstimate, FeeModel, OutPoint};

use crate::error::SweepError;
use crate::grouper::MIN_DUST_OUTPUTS;
use crate::selection::SelectionBatch;

/// Unsigned transaction shape sent to `createrawtransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateTransaction {
    pub inputs: Vec<OutPoint>,
    pub output_address: String,
    pub output_amount: Amount,
}

/// A batch priced from its Pass-1 signed size, awaiting approval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricedTransaction {
    pub inputs: Vec<OutPoint>,
    pub destination: String,
    pub total: Amount,
    pub estimate: FeeEstimate,
    /// `total - fee`; always positive.
    pub send_amount: Amount,
}

impl PricedTransaction {
    pub fn fee(&self) -> Amount {
        self.estimate.fee
    }

    /// The Pass-2 candidate, paying the fee-corrected amount.
    pub fn final_candidate(&self) -> CandidateTransaction {
        CandidateTransaction {
            inputs: self.inputs.clone(),
            output_address: self.destination.clone(),
            output_amount: self.send_amount,
        }
    }
}

/// A consolidation transaction accepted by the daemon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Broadcast {
    pub txid: String,
    pub destination: String,
    pub inputs: usize,
    pub total: Amount,
    pub fee: Amount,
    pub send_amount: Amount,
    /// Serialized size of the broadcast transaction.
    pub size_bytes: u64,
}

struct SignedBuild {
    hex: String,
    decoded: DecodedTransaction,
}

pub struct FeeConvergingBuilder<'a, W: ?Sized> {
    wallet: &'a W,
    fee_model: FeeModel,
}

impl<'a, W: WalletRpc + ?Sized> FeeConvergingBuilder<'a, W> {
    pub fn new(wallet: &'a W, fee_model: FeeModel) -> Self {
        Self { wallet, fee_model }
    }

    /// Pass 1: measure the signed size of the zero-fee transaction and price it.
    pub async fn price(
        &self,
        batch: &SelectionBatch,
        destination: &str,
    ) -> Result<PricedTransaction, SweepError> {
        if batch.len() < MIN_DUST_OUTPUTS {
            return Err(SweepError::BatchTooSmall {
                inputs: batch.len(),
            });
        }

        let estimate_candidate = CandidateTransaction {
            inputs: batch.outpoints(),
            output_address: destination.to_string(),
            output_amount: batch.total,
        };
        let measured = self.build_signed(&estimate_candidate).await?;
        let estimate = self.fee_model.estimate(measured.decoded.size);
        tracing::info!(
            inputs = batch.len(),
            size_bytes = estimate.size_bytes,
            fee = estimate.fee.to_sat(),
            total = batch.total.to_sat(),
            "priced consolidation from signed size"
        );

        let send_amount = batch
            .total
            .checked_sub(estimate.fee)
            .filter(|amount| !amount.is_zero())
            .ok_or(SweepError::UneconomicalBatch {
                fee: estimate.fee,
                total: batch.total,
            })?;

        Ok(PricedTransaction {
            inputs: estimate_candidate.inputs,
            destination: estimate_candidate.output_address,
            total: batch.total,
            estimate,
            send_amount,
        })
    }

    /// Pass 2: rebuild with the approved fee and broadcast it.
    pub async fn finalize(&self, priced: &PricedTransaction) -> Result<Broadcast, SweepError> {
        let candidate = priced.final_candidate();
        let built = self.build_signed(&candidate).await?;

        if built.decoded.size != priced.estimate.size_bytes {
            tracing::warn!(
                pass1_size = priced.estimate.size_bytes,
                pass2_size = built.decoded.size,
                "final transaction size differs from the priced size; fee left as approved"
            );
        }
        match built.decoded.output_total() {
            Some(actual) if actual == candidate.output_amount => {}
            Some(actual) => {
                return Err(SweepError::OutputMismatch {
                    expected: candidate.output_amount,
                    actual,
                })
            }
            None => {
                tracing::warn!(
                    expected = candidate.output_amount.to_sat(),
                    "decoded transaction has no readable output values; not broadcasting"
                );
                return Err(SweepError::UnverifiedOutput {
                    expected: candidate.output_amount,
                });
            }
        }

        let expected_txid = built.decoded.txid.clone();
        let txid = match self.wallet.send_raw_transaction(&built.hex).await {
            Ok(txid) => txid,
            Err(source) if source.may_have_executed() => {
                tracing::error!(
                    %expected_txid,
                    error = %source,
                    "broadcast outcome unknown: the transaction may be on the network"
                );
                return Err(SweepError::DanglingBroadcast {
                    expected_txid,
                    signed_hex: built.hex,
                    source,
                });
            }
            Err(source) => return Err(SweepError::remote(RpcMethod::SendRawTransaction)(source)),
        };
        if txid != expected_txid {
            tracing::warn!(%txid, %expected_txid, "daemon reported a different txid than decoded");
        }
        tracing::info!(%txid, fee = priced.fee().to_sat(), "consolidation broadcast");

        Ok(Broadcast {
            txid,
            destination: priced.destination.clone(),
            inputs: priced.inputs.len(),
            total: priced.total,
            fee: priced.fee(),
            send_amount: priced.send_amount,
            size_bytes: built.decoded.size,
        })
    }

    /// create → sign → decode, each attempted once.
    async fn build_signed(
        &self,
        candidate: &CandidateTransaction,
    ) -> Result<SignedBuild, SweepError> {
        let raw = self
            .wallet
            .create_raw_transaction(
                &candidate.inputs,
                &candidate.output_address,
                candidate.output_amount,
            )
            .await
            .map_err(SweepError::remote(RpcMethod::CreateRawTransaction))?;

        let signed = self
            .wallet
            .sign_raw_transaction(&raw)
            .await
            .map_err(SweepError::remote(RpcMethod::SignRawTransaction))?;
        if !signed.complete {
            return Err(SweepError::SigningIncomplete {
                detail: signed.error_summary(),
            });
        }

        let decoded = self
            .wallet
            .decode_raw_transaction(&signed.hex)
            .await
            .map_err(SweepError::remote(RpcMethod::DecodeRawTransaction))?;
        tracing::debug!(
            size_bytes = decoded.size,
            amount = candidate.output_amount.to_sat(),
            "built and signed candidate"
        );

        Ok(SignedBuild {
            hex: signed.hex,
            decoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::select;
    use dustsweep_nullables::NullWallet;
    use dustsweep_rpc::RpcError;
    use dustsweep_types::Utxo;

    fn dust(amounts: &[u64]) -> Vec<Utxo> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &sat)| {
                Utxo::new("BAddr", format!("{:02x}", i + 1).repeat(32), 0, Amount::from_sat(sat))
            })
            .collect()
    }

    fn standard_fee() -> FeeModel {
        FeeModel::new(10, 104)
    }

    #[tokio::test]
    async fn fee_comes_from_the_signed_size() {
        let wallet = NullWallet::new().with_sizes([226, 226]);
        let batch = select(&dust(&[100_000_000, 200_000_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let priced = builder.price(&batch, "BAddr").await.unwrap();
        assert_eq!(priced.fee(), Amount::from_sat(2_364));
        assert_eq!(priced.total, Amount::from_sat(300_000_000));
        assert_eq!(priced.send_amount, Amount::from_sat(299_997_636));

        // Pass 1 pays the full total.
        let created = wallet.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].amount, Amount::from_sat(300_000_000));
        assert_eq!(wallet.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn final_pass_pays_total_minus_fee_and_broadcasts_once() {
        let wallet = NullWallet::new().with_sizes([226, 226]);
        let batch = select(&dust(&[100_000_000, 200_000_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let priced = builder.price(&batch, "BAddr").await.unwrap();
        let broadcast = builder.finalize(&priced).await.unwrap();

        let created = wallet.created();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].amount, Amount::from_sat(299_997_636));
        assert_eq!(created[1].inputs, created[0].inputs);
        assert_eq!(wallet.broadcast_count(), 1);
        assert_eq!(wallet.broadcasts()[0], wallet.signed_hex_for(1));
        assert_eq!(broadcast.send_amount, Amount::from_sat(299_997_636));
        assert_eq!(broadcast.inputs, 2);
    }

    #[tokio::test]
    async fn fee_equal_to_total_is_uneconomical() {
        // 1_000 + 1_364 = 2_364 = 10 * 226 + 104
        let wallet = NullWallet::new().with_sizes([226]);
        let batch = select(&dust(&[1_000, 1_364]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let err = builder.price(&batch, "BAddr").await.unwrap_err();
        assert_eq!(
            err,
            SweepError::UneconomicalBatch {
                fee: Amount::from_sat(2_364),
                total: Amount::from_sat(2_364),
            }
        );
        assert_eq!(wallet.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn single_input_batch_is_refused_without_remote_calls() {
        let wallet = NullWallet::new();
        let batch = select(&dust(&[1_000, 2_000]), 1);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let err = builder.price(&batch, "BAddr").await.unwrap_err();
        assert_eq!(err, SweepError::BatchTooSmall { inputs: 1 });
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn signing_failure_names_the_operation() {
        let wallet = NullWallet::new().fail_on(
            RpcMethod::SignRawTransaction,
            RpcError::Daemon {
                code: -5,
                message: "Private key not available".into(),
            },
        );
        let batch = select(&dust(&[1_000, 2_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let err = builder.price(&batch, "BAddr").await.unwrap_err();
        assert_eq!(err.operation(), Some(RpcMethod::SignRawTransaction));
        assert_eq!(
            wallet.calls(),
            vec![RpcMethod::CreateRawTransaction, RpcMethod::SignRawTransaction]
        );
    }

    #[tokio::test]
    async fn incomplete_signature_aborts_before_decode() {
        let wallet = NullWallet::new().with_incomplete_signatures();
        let batch = select(&dust(&[1_000, 2_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let err = builder.price(&batch, "BAddr").await.unwrap_err();
        assert!(matches!(err, SweepError::SigningIncomplete { .. }));
        assert!(!wallet.calls().contains(&RpcMethod::DecodeRawTransaction));
    }

    #[tokio::test]
    async fn rejected_broadcast_is_a_plain_remote_failure() {
        let wallet = NullWallet::new().with_sizes([226, 226]).fail_on(
            RpcMethod::SendRawTransaction,
            RpcError::Daemon {
                code: -26,
                message: "min relay fee not met".into(),
            },
        );
        let batch = select(&dust(&[100_000, 200_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let priced = builder.price(&batch, "BAddr").await.unwrap();
        let err = builder.finalize(&priced).await.unwrap_err();
        assert_eq!(err.operation(), Some(RpcMethod::SendRawTransaction));
        assert!(!err.is_dangling());
    }

    #[tokio::test]
    async fn lost_broadcast_response_is_dangling() {
        let wallet = NullWallet::new().with_sizes([226, 226]).fail_on(
            RpcMethod::SendRawTransaction,
            RpcError::ResponseLost("connection reset".into()),
        );
        let batch = select(&dust(&[100_000, 200_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let priced = builder.price(&batch, "BAddr").await.unwrap();
        let err = builder.finalize(&priced).await.unwrap_err();
        match err {
            SweepError::DanglingBroadcast {
                expected_txid,
                signed_hex,
                ..
            } => {
                assert_eq!(expected_txid, wallet.txid_for(1));
                assert_eq!(signed_hex, wallet.signed_hex_for(1));
            }
            other => panic!("expected dangling broadcast, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_final_output_is_never_broadcast() {
        let wallet = NullWallet::new()
            .with_sizes([226, 226])
            .with_output_skew(Amount::from_sat(1));
        let batch = select(&dust(&[100_000, 200_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let priced = builder.price(&batch, "BAddr").await.unwrap();
        let err = builder.finalize(&priced).await.unwrap_err();
        assert!(matches!(err, SweepError::OutputMismatch { .. }));
        assert_eq!(wallet.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn unreadable_final_outputs_are_never_broadcast() {
        let wallet = NullWallet::new()
            .with_sizes([226, 226])
            .with_unreadable_outputs();
        let batch = select(&dust(&[100_000, 200_000]), 300);
        let builder = FeeConvergingBuilder::new(&wallet, standard_fee());

        let priced = builder.price(&batch, "BAddr").await.unwrap();
        let err = builder.finalize(&priced).await.unwrap_err();
        assert_eq!(
            err,
            SweepError::UnverifiedOutput {
                expected: Amount::from_sat(297_636)
            }
        );
        assert_eq!(wallet.broadcast_count(), 0);
        assert!(!wallet.calls().contains(&RpcMethod::SendRawTransaction));
    }
}
