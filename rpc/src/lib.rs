//! JSON-RPC access to the wallet daemon.
//!
//! Provides:
//! - The [`WalletRpc`] capability consumed by the consolidation core
//! - [`DaemonClient`], its HTTP implementation over `reqwest`
//! - Wire types for `listunspent`, `signrawtransaction` and `decoderawtransaction`
//! - [`RpcError`], which records whether a failed request may have reached the daemon

pub mod client;
pub mod error;
pub mod wallet;
pub mod wire;

pub use client::{DaemonClient, RpcAuth};
pub use error::RpcError;
pub use wallet::{RpcMethod, WalletRpc};
pub use wire::{DecodedTransaction, SignedTransaction, UnspentRecord};
