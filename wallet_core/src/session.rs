//! The interactive consolidation session.
//!
//! ```text
//! AwaitThreshold → AwaitAddressChoice → AwaitAddressConfirm → BuildingFee
//!     → AwaitSendConfirm → Broadcasting → Done | Aborted
//! ```
//!
//! Every decision point is delegated to an [`Operator`]. The session never
//! exits the process; it returns an [`Outcome`] and the caller decides what to
//! do with it.

use dustsweep_rpc::{RpcError, RpcMethod, WalletRpc};
use dustsweep_types::{Amount, Policy, Utxo};
use std::fmt;

use crate::builder::{Broadcast, FeeConvergingBuilder, PricedTransaction};
use crate::error::SweepError;
use crate::grouper::{group, AddressGroup, Grouping};
use crate::selection::{select, SelectionBatch};

/// Summary of one address offered for consolidation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DustCandidate {
    pub address: String,
    pub dust_count: usize,
    pub dust_total: Amount,
}

impl From<&AddressGroup> for DustCandidate {
    fn from(group: &AddressGroup) -> Self {
        Self {
            address: group.address.clone(),
            dust_count: group.dust.len(),
            dust_total: group.dust_total(),
        }
    }
}

/// The confirmation gate at which the operator declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    AddressConfirm,
    SendConfirm,
}

/// Informational messages for the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    WholeCoinsAreNotDust { threshold: Amount },
    Searching { threshold: Amount },
    NoDustAddresses,
    Selecting { address: String, available: usize },
    NoDustToSpend { address: String },
    Creating { inputs: usize, address: String },
    Priced { size_bytes: u64, fee: Amount },
    AbortedByUser,
    Sent { txid: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::WholeCoinsAreNotDust { threshold } => {
                write!(f, "Whole coins are not dust. Value entered was: {threshold}")
            }
            Notice::Searching { threshold } => write!(
                f,
                "Searching for addresses with UTXOs with amount less than or equal to {} satoshis",
                threshold.to_sat()
            ),
            Notice::NoDustAddresses => f.write_str("No address with dust found."),
            Notice::Selecting { address, available } => write!(
                f,
                "Selecting from {available} outputs for address: {address}"
            ),
            Notice::NoDustToSpend { .. } => f.write_str("no dust to spend."),
            Notice::Creating { inputs, address } => {
                write!(f, "Creating txn to send {inputs} utxos to {address}")
            }
            Notice::Priced { size_bytes, fee } => write!(
                f,
                "Txn size: {size_bytes} bytes. Calculated fee: {} satoshis",
                fee.to_sat()
            ),
            Notice::AbortedByUser => f.write_str("Aborted by user."),
            Notice::Sent { txid } => write!(f, "Sent! {txid}"),
        }
    }
}

/// The human side of a session.
pub trait Operator {
    /// Dust threshold in satoshis; `default` comes from the policy profile.
    fn dust_threshold(&mut self, default: Amount) -> Result<Amount, SweepError>;

    /// Pick one address from `candidates` (never empty).
    fn choose_address(&mut self, candidates: &[DustCandidate]) -> Result<String, SweepError>;

    fn confirm_address(&mut self, candidate: &DustCandidate) -> Result<bool, SweepError>;

    /// Approve sending `priced.send_amount` with `priced.fee()`.
    fn confirm_send(&mut self, priced: &PricedTransaction) -> Result<bool, SweepError>;

    fn notify(&mut self, notice: &Notice);
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The consolidation transaction was broadcast.
    Done(Broadcast),
    /// The operator declined at a confirmation gate. Nothing was sent.
    Cancelled(Gate),
    /// There was nothing to consolidate.
    NothingToDo(SweepError),
    /// Validation or a remote call failed before anything was broadcast.
    Aborted(SweepError),
    /// The broadcast request reached the daemon but its answer was lost; the
    /// transaction may be on the network.
    BroadcastUnconfirmed {
        expected_txid: String,
        signed_hex: String,
        error: RpcError,
    },
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn txid(&self) -> Option<&str> {
        match self {
            Outcome::Done(broadcast) => Some(&broadcast.txid),
            _ => None,
        }
    }
}

impl From<SweepError> for Outcome {
    fn from(error: SweepError) -> Self {
        match error {
            SweepError::DanglingBroadcast {
                expected_txid,
                signed_hex,
                source,
            } => Outcome::BroadcastUnconfirmed {
                expected_txid,
                signed_hex,
                error: source,
            },
            e if e.is_nothing_to_do() => Outcome::NothingToDo(e),
            e => Outcome::Aborted(e),
        }
    }
}

enum State {
    AwaitThreshold,
    AwaitAddressChoice { grouping: Grouping },
    AwaitAddressConfirm { candidate: DustCandidate, dust: Vec<Utxo> },
    BuildingFee { address: String, batch: SelectionBatch },
    AwaitSendConfirm { priced: PricedTransaction },
    Broadcasting { priced: PricedTransaction },
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::AwaitThreshold => "await_threshold",
            State::AwaitAddressChoice { .. } => "await_address_choice",
            State::AwaitAddressConfirm { .. } => "await_address_confirm",
            State::BuildingFee { .. } => "building_fee",
            State::AwaitSendConfirm { .. } => "await_send_confirm",
            State::Broadcasting { .. } => "broadcasting",
        }
    }
}

enum Step {
    Next(State),
    Finish(Outcome),
}

/// Fetch the wallet's UTXOs, converting daemon amounts to satoshis.
pub async fn fetch_utxos<W: WalletRpc + ?Sized>(wallet: &W) -> Result<Vec<Utxo>, SweepError> {
    let records = wallet
        .list_unspent()
        .await
        .map_err(SweepError::remote(RpcMethod::ListUnspent))?;
    let utxos = records
        .into_iter()
        .map(|record| record.into_utxo())
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(count = utxos.len(), "fetched unspent outputs");
    Ok(utxos)
}

/// Fetch and group the wallet's UTXOs at `threshold`, without building anything.
pub async fn scan<W: WalletRpc + ?Sized>(
    wallet: &W,
    threshold: Amount,
) -> Result<Vec<DustCandidate>, SweepError> {
    check_threshold(threshold)?;
    let utxos = fetch_utxos(wallet).await?;
    let grouping = group(&utxos, threshold)?;
    Ok(grouping.candidates().map(DustCandidate::from).collect())
}

fn check_threshold(threshold: Amount) -> Result<(), SweepError> {
    if threshold > Amount::ONE_COIN {
        return Err(SweepError::ThresholdTooLarge { threshold });
    }
    Ok(())
}

/// One run of the consolidation workflow.
pub struct Session<'a, W: ?Sized, O: ?Sized> {
    wallet: &'a W,
    operator: &'a mut O,
    policy: Policy,
}

impl<'a, W, O> Session<'a, W, O>
where
    W: WalletRpc + ?Sized,
    O: Operator + ?Sized,
{
    pub fn new(wallet: &'a W, operator: &'a mut O, policy: Policy) -> Self {
        Self {
            wallet,
            operator,
            policy,
        }
    }

    /// Drive the session to a terminal outcome.
    pub async fn run(mut self) -> Outcome {
        let mut state = State::AwaitThreshold;
        loop {
            let name = state.name();
            tracing::debug!(state = name, "session step");
            match self.step(state).await {
                Ok(Step::Next(next)) => state = next,
                Ok(Step::Finish(outcome)) => {
                    tracing::info!(state = name, "session finished");
                    return outcome;
                }
                Err(error) => {
                    if error.is_dangling() {
                        tracing::error!(state = name, %error, "session ended with an unconfirmed broadcast");
                    } else if !error.is_nothing_to_do() {
                        tracing::warn!(state = name, %error, "session aborted");
                    }
                    return Outcome::from(error);
                }
            }
        }
    }

    async fn step(&mut self, state: State) -> Result<Step, SweepError> {
        match state {
            State::AwaitThreshold => {
                let threshold = self.operator.dust_threshold(self.policy.dust_threshold)?;
                if let Err(e) = check_threshold(threshold) {
                    self.operator
                        .notify(&Notice::WholeCoinsAreNotDust { threshold });
                    return Err(e);
                }

                self.operator.notify(&Notice::Searching { threshold });
                let utxos = fetch_utxos(self.wallet).await?;
                let grouping = group(&utxos, threshold)?;
                if grouping.dust_addresses.is_empty() {
                    self.operator.notify(&Notice::NoDustAddresses);
                    return Err(SweepError::EmptySelection);
                }
                Ok(Step::Next(State::AwaitAddressChoice { grouping }))
            }

            State::AwaitAddressChoice { grouping } => {
                let candidates: Vec<DustCandidate> =
                    grouping.candidates().map(DustCandidate::from).collect();
                let address = self.operator.choose_address(&candidates)?;
                let chosen = grouping
                    .get(&address)
                    .filter(|g| g.is_consolidatable())
                    .ok_or(SweepError::UnknownAddress { address })?;
                Ok(Step::Next(State::AwaitAddressConfirm {
                    candidate: DustCandidate::from(chosen),
                    dust: chosen.dust.clone(),
                }))
            }

            State::AwaitAddressConfirm { candidate, dust } => {
                if !self.operator.confirm_address(&candidate)? {
                    self.operator.notify(&Notice::AbortedByUser);
                    return Ok(Step::Finish(Outcome::Cancelled(Gate::AddressConfirm)));
                }

                self.operator.notify(&Notice::Selecting {
                    address: candidate.address.clone(),
                    available: dust.len(),
                });
                let batch = select(&dust, self.policy.max_inputs);
                tracing::info!(
                    address = %candidate.address,
                    selected = batch.len(),
                    available = dust.len(),
                    total = batch.total.to_sat(),
                    "selected dust inputs"
                );
                if batch.len() < crate::grouper::MIN_DUST_OUTPUTS {
                    self.operator.notify(&Notice::NoDustToSpend {
                        address: candidate.address,
                    });
                    return Err(SweepError::BatchTooSmall {
                        inputs: batch.len(),
                    });
                }
                Ok(Step::Next(State::BuildingFee {
                    address: candidate.address,
                    batch,
                }))
            }

            State::BuildingFee { address, batch } => {
                self.operator.notify(&Notice::Creating {
                    inputs: batch.len(),
                    address: address.clone(),
                });
                let priced = self.builder().price(&batch, &address).await?;
                self.operator.notify(&Notice::Priced {
                    size_bytes: priced.estimate.size_bytes,
                    fee: priced.fee(),
                });
                Ok(Step::Next(State::AwaitSendConfirm { priced }))
            }

            State::AwaitSendConfirm { priced } => {
                if !self.operator.confirm_send(&priced)? {
                    self.operator.notify(&Notice::AbortedByUser);
                    return Ok(Step::Finish(Outcome::Cancelled(Gate::SendConfirm)));
                }
                Ok(Step::Next(State::Broadcasting { priced }))
            }

            State::Broadcasting { priced } => {
                let broadcast = self.builder().finalize(&priced).await?;
                self.operator.notify(&Notice::Sent {
                    txid: broadcast.txid.clone(),
                });
                Ok(Step::Finish(Outcome::Done(broadcast)))
            }
        }
    }

    fn builder(&self) -> FeeConvergingBuilder<'a, W> {
        FeeConvergingBuilder::new(self.wallet, self.policy.fee_model)
    }
}
