//! Error types for the ledger

use crate::types::OutPoint;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Outpoint not present in the pool
    #[error("Unknown output: {0}")]
    UnknownOutput(OutPoint),

    /// Input index out of range for the transaction
    #[error("Input index out of range: {0}")]
    InputIndex(usize),

    /// Signing or key handling failed
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
