use dustsweep_rpc::{RpcError, RpcMethod};
use dustsweep_types::{Amount, UtxoError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    #[error("dust threshold {} sat is above one whole coin", .threshold.to_sat())]
    ThresholdTooLarge { threshold: Amount },

    #[error("malformed utxo: {0}")]
    InvalidInput(#[from] UtxoError),

    #[error("no address has two or more dust outputs")]
    EmptySelection,

    /// The operator picked an address that was not offered.
    #[error("address {address} is not among the dust candidates")]
    UnknownAddress { address: String },

    /// The input cap left fewer than two inputs, so there is nothing to merge.
    #[error("batch of {inputs} input(s) has nothing to consolidate")]
    BatchTooSmall { inputs: usize },

    #[error("{operation} failed: {source}")]
    RemoteCall {
        operation: RpcMethod,
        #[source]
        source: RpcError,
    },

    /// The wallet could not sign every input (locked wallet or missing keys).
    #[error("signrawtransaction returned an incomplete signature: {detail}")]
    SigningIncomplete { detail: String },

    /// The fee would leave a zero or negative output.
    #[error("fee {} would consume the whole batch value {}", .fee.to_sat(), .total.to_sat())]
    UneconomicalBatch { fee: Amount, total: Amount },

    /// The rebuilt transaction does not pay the approved amount. Not broadcast.
    #[error("final transaction pays {} sat, expected {} sat", .actual.to_sat(), .expected.to_sat())]
    OutputMismatch { expected: Amount, actual: Amount },

    /// The rebuilt transaction's output values could not be read back, so
    /// the approved amount was not confirmed. Not broadcast.
    #[error("final transaction outputs are unreadable; expected {} sat", .expected.to_sat())]
    UnverifiedOutput { expected: Amount },

    /// The broadcast request reached the daemon but its answer was lost.
    /// Funds may have moved.
    #[error("broadcast of {expected_txid} may have succeeded but was not confirmed: {source}")]
    DanglingBroadcast {
        expected_txid: String,
        signed_hex: String,
        #[source]
        source: RpcError,
    },

    /// Reading the operator's answer failed (closed stdin, I/O error).
    #[error("operator input error: {0}")]
    Prompt(String),
}

impl SweepError {
    pub(crate) fn remote(operation: RpcMethod) -> impl FnOnce(RpcError) -> Self {
        move |source| SweepError::RemoteCall { operation, source }
    }

    /// The remote operation that failed, if any.
    pub fn operation(&self) -> Option<RpcMethod> {
        match self {
            SweepError::RemoteCall { operation, .. } => Some(*operation),
            SweepError::SigningIncomplete { .. } => Some(RpcMethod::SignRawTransaction),
            SweepError::DanglingBroadcast { .. } => Some(RpcMethod::SendRawTransaction),
            _ => None,
        }
    }

    /// Ends where there was simply nothing to consolidate.
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(
            self,
            SweepError::EmptySelection | SweepError::BatchTooSmall { .. }
        )
    }

    pub fn is_dangling(&self) -> bool {
        matches!(self, SweepError::DanglingBroadcast { .. })
    }
}
