//! Settlement Engine
//!
//! Validates batches of proposed transactions against an authoritative pool
//! of unspent outputs and applies the accepted subset, one epoch at a time.
//!
//! # Architecture
//!
//! Each epoch goes through the same steps:
//!
//! 1. **Validation**: check a candidate against the pool as it is right now
//! 2. **Application**: retire its claimed outputs and create its new ones
//! 3. **Next candidate**: repeat, in caller order, until the batch is exhausted
//! 4. **Report**: accepted transactions, rejection reasons, implicit fees
//!
//! # Invariants
//!
//! - No outpoint is ever claimed by two accepted inputs
//! - Every pool entry was created by exactly one accepted transaction
//! - An accepted transaction never creates more value than it consumes
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{Ed25519Verifier, UtxoPool};
//! use settlement::TxHandler;
//!
//! let genesis = UtxoPool::new();
//! let mut handler = TxHandler::new(&genesis, Ed25519Verifier);
//!
//! let report = handler.settle_epoch(&[]);
//! println!("Epoch {}: {} accepted, {} rejected",
//!          report.epoch, report.accepted_count(), report.rejected_count());
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod validation;
pub mod handler;
pub mod actor;
pub mod metrics;
pub mod error;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use handler::TxHandler;
pub use validation::{check_transaction, is_valid_transaction, Rejection, ValidatedTransaction};
pub use actor::{spawn_settlement_actor, SettlementHandle};
pub use metrics::Metrics;
