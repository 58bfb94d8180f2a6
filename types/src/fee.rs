//! Linear size-based fee model.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// `fee = size_bytes * per_byte + base`, all in satoshis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeModel {
    pub per_byte: u64,
    pub base: u64,
}

/// Fee computed for a signed transaction of a known serialized size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeEstimate {
    pub size_bytes: u64,
    pub fee: Amount,
}

impl FeeModel {
    pub const fn new(per_byte: u64, base: u64) -> Self {
        Self { per_byte, base }
    }

    /// Price a transaction by its real serialized size.
    ///
    /// Saturates instead of wrapping; a saturated fee always exceeds any batch total.
    pub fn estimate(&self, size_bytes: u64) -> FeeEstimate {
        let fee = size_bytes
            .saturating_mul(self.per_byte)
            .saturating_add(self.base);
        FeeEstimate {
            size_bytes,
            fee: Amount::from_sat(fee),
        }
    }
}
