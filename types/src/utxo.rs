//! Unspent transaction outputs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;
use crate::error::UtxoError;

/// Reference to a transaction output, serialized as the `{txid, vout}` input
/// object expected by `createrawtransaction`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: String,
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// An unspent output owned by the wallet, with its value already in satoshis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub txid: String,
    pub vout: u32,
    pub amount: Amount,
}

impl Utxo {
    pub fn new(
        address: impl Into<String>,
        txid: impl Into<String>,
        vout: u32,
        amount: Amount,
    ) -> Self {
        Self {
            address: address.into(),
            txid: txid.into(),
            vout,
            amount,
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid.clone(),
            vout: self.vout,
        }
    }

    /// Check that the required fields are present and well-formed.
    ///
    /// A txid must be 32 bytes of hex.
    pub fn validate(&self) -> Result<(), UtxoError> {
        match hex::decode(&self.txid) {
            Ok(bytes) if bytes.len() == 32 => {}
            _ => return Err(UtxoError::InvalidTxid(self.txid.clone())),
        }
        if self.address.trim().is_empty() {
            return Err(UtxoError::MissingAddress {
                txid: self.txid.clone(),
                vout: self.vout,
            });
        }
        Ok(())
    }
}
