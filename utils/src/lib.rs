//! Shared utilities for dustsweep.

pub mod coins;
pub mod logging;

pub use coins::format_coins;
pub use logging::{init_logging, LogFormat};
