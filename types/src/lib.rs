//! Fundamental types for dust consolidation.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! satoshi amounts and the single coin conversion point, UTXO records, the linear
//! fee model, and the deployment policy profiles.

pub mod amount;
pub mod error;
pub mod fee;
pub mod profile;
pub mod utxo;

pub use amount::{Amount, COIN};
pub use error::{AmountError, UtxoError};
pub use fee::{FeeEstimate, FeeModel};
pub use profile::{Policy, Profile};
pub use utxo::{OutPoint, Utxo};
