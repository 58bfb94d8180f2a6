//! Response shapes returned by the wallet daemon.

use dustsweep_types::{Amount, Utxo, UtxoError};
use serde::{Deserialize, Serialize};

// ── listunspent ──────────────────────────────────────────────────────────

/// One `listunspent` entry as the daemon reports it.
///
/// Outputs with non-standard scripts come back without an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnspentRecord {
    #[serde(default)]
    pub address: Option<String>,
    pub txid: String,
    pub vout: u32,
    /// Value in fractional coins.
    pub amount: f64,
    #[serde(default)]
    pub confirmations: u64,
}

impl UnspentRecord {
    /// Convert into a [`Utxo`], moving the amount from coins to satoshis.
    ///
    /// This is the only place a daemon-reported amount enters the core.
    pub fn into_utxo(self) -> Result<Utxo, UtxoError> {
        let amount = Amount::from_coins(self.amount).map_err(|source| UtxoError::InvalidAmount {
            txid: self.txid.clone(),
            vout: self.vout,
            source,
        })?;
        let address = self.address.ok_or_else(|| UtxoError::MissingAddress {
            txid: self.txid.clone(),
            vout: self.vout,
        })?;
        let utxo = Utxo::new(address, self.txid, self.vout, amount);
        utxo.validate()?;
        Ok(utxo)
    }
}

// ── signrawtransaction ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub hex: String,
    /// `false` when the wallet could not sign every input (e.g. missing keys).
    pub complete: bool,
    #[serde(default)]
    pub errors: Vec<SigningInputError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningInputError {
    #[serde(default)]
    pub txid: String,
    #[serde(default)]
    pub vout: u32,
    #[serde(default)]
    pub error: String,
}

impl SignedTransaction {
    /// Summary of the per-input signing failures.
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "wallet could not sign every input".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{}:{}: {}", e.txid, e.vout, e.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ── decoderawtransaction ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedTransaction {
    pub txid: String,
    /// Serialized size in bytes.
    pub size: u64,
    #[serde(default)]
    pub vin: Vec<serde_json::Value>,
    #[serde(default)]
    pub vout: Vec<serde_json::Value>,
}

impl DecodedTransaction {
    /// Sum of the output values, or `None` if outputs are missing or unreadable.
    pub fn output_total(&self) -> Option<Amount> {
        if self.vout.is_empty() {
            return None;
        }
        self.vout.iter().try_fold(Amount::ZERO, |acc, output| {
            let coins = output.get("value")?.as_f64()?;
            acc.checked_add(Amount::from_coins(coins).ok()?)
        })
    }
}
