//! UTXO Ledger Core
//!
//! Data model shared by the settlement engine: output identifiers,
//! transactions, the unspent-output pool and the signature oracle.
//!
//! # Invariants
//!
//! - An outpoint present in the pool is spendable and unclaimed
//! - A transaction's outputs are named `(tx_hash, index)`, index from 0
//! - Signatures never cover other signatures: each input signs its own payload

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod pool;
pub mod crypto;
pub mod error;

// Re-exports
pub use error::{Error, Result};
pub use types::{Address, Amount, Input, OutPoint, Output, Signature, Transaction, TxHash};
pub use pool::UtxoPool;
pub use crypto::{Ed25519Verifier, KeyPair, SignatureVerifier};
