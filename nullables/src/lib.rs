//! Nullable infrastructure for deterministic testing.
//!
//! The wallet daemon is abstracted behind [`dustsweep_rpc::WalletRpc`]. This
//! crate provides a test-friendly implementation that:
//! - Returns deterministic raw transactions, sizes and txids
//! - Records every call so tests can assert on what was (not) sent
//! - Can be scripted to fail any single operation
//! - Never touches the network
//!
//! Usage: swap `DaemonClient` for `NullWallet` in tests.

pub mod wallet;

pub use wallet::{CreatedTransaction, NullWallet};
