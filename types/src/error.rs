//! Error types for amount conversion and UTXO validation.

use thiserror::Error;

/// A coin-denominated amount that cannot be represented in satoshis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmountError {
    #[error("amount is not a finite number: {0}")]
    NotFinite(f64),

    #[error("amount cannot be negative: {0}")]
    Negative(f64),

    #[error("amount {0} exceeds the exactly representable range")]
    TooLarge(f64),
}

/// A UTXO record that is missing or has malformed required fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UtxoError {
    #[error("utxo {txid}:{vout} has no address")]
    MissingAddress { txid: String, vout: u32 },

    #[error("invalid txid: {0:?}")]
    InvalidTxid(String),

    #[error("utxo {txid}:{vout} has an invalid amount: {source}")]
    InvalidAmount {
        txid: String,
        vout: u32,
        #[source]
        source: AmountError,
    },

    #[error("duplicate outpoint {txid}:{vout}")]
    DuplicateOutPoint { txid: String, vout: u32 },
}
