//! Dust consolidation core.
//!
//! Provides everything between the wallet daemon and the operator:
//! - UTXO grouping by address and dust detection ([`grouper`])
//! - Bounded, last-listed-first input selection ([`selection`])
//! - Two-pass, fee-converging transaction construction ([`builder`])
//! - The interactive session state machine ([`session`])

pub mod builder;
pub mod error;
pub mod grouper;
pub mod selection;
pub mod session;

pub use builder::{Broadcast, CandidateTransaction, FeeConvergingBuilder, PricedTransaction};
pub use error::SweepError;
pub use grouper::{group, AddressGroup, Grouping, MIN_DUST_OUTPUTS};
pub use selection::{select, SelectionBatch};
pub use session::{scan, DustCandidate, Gate, Notice, Operator, Outcome, Session};
