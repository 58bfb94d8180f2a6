//! The wallet daemon capability consumed by the consolidation core.

use async_trait::async_trait;
use dustsweep_types::{Amount, OutPoint};
use std::fmt;

use crate::error::RpcError;
use crate::wire::{DecodedTransaction, SignedTransaction, UnspentRecord};

/// The five daemon methods the core calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    ListUnspent,
    CreateRawTransaction,
    SignRawTransaction,
    DecodeRawTransaction,
    SendRawTransaction,
}

impl RpcMethod {
    /// JSON-RPC method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListUnspent => "listunspent",
            Self::CreateRawTransaction => "createrawtransaction",
            Self::SignRawTransaction => "signrawtransaction",
            Self::DecodeRawTransaction => "decoderawtransaction",
            Self::SendRawTransaction => "sendrawtransaction",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote wallet operations, each a single blocking request/response.
///
/// Implementations are used serially over one connection and never retry.
#[async_trait]
pub trait WalletRpc {
    /// All unspent outputs known to the wallet, amounts in fractional coins.
    async fn list_unspent(&self) -> Result<Vec<UnspentRecord>, RpcError>;

    /// Build an unsigned transaction spending `inputs` into one output.
    async fn create_raw_transaction(
        &self,
        inputs: &[OutPoint],
        address: &str,
        amount: Amount,
    ) -> Result<String, RpcError>;

    async fn sign_raw_transaction(&self, raw_hex: &str) -> Result<SignedTransaction, RpcError>;

    async fn decode_raw_transaction(&self, raw_hex: &str)
        -> Result<DecodedTransaction, RpcError>;

    /// Broadcast a signed transaction, returning its txid.
    async fn send_raw_transaction(&self, signed_hex: &str) -> Result<String, RpcError>;
}
