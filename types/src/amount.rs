//! Satoshi amounts.
//!
//! Amounts are represented as integer satoshis (u64) to avoid floating-point drift.
//! The wallet daemon reports fractional coins; [`Amount::from_coins`] is the one
//! place where that unit is converted, and [`Amount::to_coins`] the one place
//! where it is produced again for outgoing requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::error::AmountError;

/// Satoshis per whole coin.
pub const COIN: u64 = 100_000_000;

/// Largest satoshi value that survives an f64 round trip exactly (2^53).
const MAX_EXACT_SATOSHIS: u64 = 1 << 53;

/// An amount in satoshis.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const ONE_COIN: Self = Self(COIN);

    pub const fn from_sat(sat: u64) -> Self {
        Self(sat)
    }

    pub const fn to_sat(self) -> u64 {
        self.0
    }

    /// Convert a fractional coin value reported by the daemon into satoshis.
    ///
    /// The product is rounded to the nearest satoshi, which is exact for every
    /// value below 2^53 satoshis.
    pub fn from_coins(coins: f64) -> Result<Self, AmountError> {
        if !coins.is_finite() {
            return Err(AmountError::NotFinite(coins));
        }
        if coins < 0.0 {
            return Err(AmountError::Negative(coins));
        }
        let sat = (coins * COIN as f64).round();
        if sat > MAX_EXACT_SATOSHIS as f64 {
            return Err(AmountError::TooLarge(coins));
        }
        Ok(Self(sat as u64))
    }

    /// Fractional coin value for requests sent to the daemon.
    pub fn to_coins(self) -> f64 {
        self.0 as f64 / COIN as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Formats as a coin value with all eight decimal places, e.g. `0.00005500`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:08}", self.0 / COIN, self.0 % COIN)
    }
}
