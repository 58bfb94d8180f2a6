//! Deployment policy profiles.
//!
//! The dust threshold, input cap and fee model are tuning constants that differ
//! between deployments. Each [`Profile`] names one bundle of them; neither is
//! more canonical than the other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::fee::FeeModel;

/// Named policy bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Small dust (5,500 sat), 300 inputs, 10 sat/byte + 104.
    #[default]
    Standard,
    /// Large dust (0.9 coin), 677 inputs, 12 sat/byte + 120.
    Bulk,
}

/// Concrete consolidation policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Default dust threshold offered at the prompt.
    pub dust_threshold: Amount,
    /// Maximum number of inputs in one consolidation transaction.
    pub max_inputs: u32,
    pub fee_model: FeeModel,
}

impl Profile {
    pub fn policy(&self) -> Policy {
        match self {
            Self::Standard => Policy {
                dust_threshold: Amount::from_sat(5_500),
                max_inputs: 300,
                fee_model: FeeModel::new(10, 104),
            },
            Self::Bulk => Policy {
                dust_threshold: Amount::from_sat(90_000_000),
                max_inputs: 677,
                fee_model: FeeModel::new(12, 120),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Bulk => "bulk",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "bulk" => Ok(Self::Bulk),
            other => Err(format!("unknown profile {other:?} (expected \"standard\" or \"bulk\")")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_carry_their_constants() {
        let standard = Profile::Standard.policy();
        assert_eq!(standard.dust_threshold, Amount::from_sat(5_500));
        assert_eq!(standard.max_inputs, 300);
        assert_eq!(standard.fee_model, FeeModel::new(10, 104));

        let bulk = Profile::Bulk.policy();
        assert_eq!(bulk.dust_threshold, Amount::from_sat(90_000_000));
        assert_eq!(bulk.max_inputs, 677);
        assert_eq!(bulk.fee_model, FeeModel::new(12, 120));
    }

    #[test]
    fn default_thresholds_are_below_one_coin() {
        for profile in [Profile::Standard, Profile::Bulk] {
            assert!(profile.policy().dust_threshold <= Amount::ONE_COIN);
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Bulk".parse::<Profile>(), Ok(Profile::Bulk));
        assert_eq!("standard".parse::<Profile>(), Ok(Profile::Standard));
        assert!("turbo".parse::<Profile>().is_err());
    }
}
