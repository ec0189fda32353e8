//! Core types for settlement engine

use chrono::{DateTime, Utc};
use ledger_core::{Amount, Transaction, TxHash, UtxoPool};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validation::Rejection;

/// Candidate that did not make it into an epoch
#[derive(Debug, Clone, Serialize)]
pub struct RejectedTransaction {
    /// Position of the candidate in the submitted batch
    pub position: usize,

    /// Hash of the candidate
    pub tx_hash: TxHash,

    /// First rule the candidate failed
    #[serde(serialize_with = "serialize_reason")]
    pub reason: Rejection,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &Rejection,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Outcome of settling one batch
#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    /// Epoch number, starting at 1 for the first batch a handler settles
    pub epoch: u64,

    /// Accepted transactions, in acceptance order
    pub accepted: Vec<Transaction>,

    /// Rejected candidates, in batch order
    pub rejected: Vec<RejectedTransaction>,

    /// Value consumed by accepted transactions and not re-created
    pub implicit_fees: Amount,

    /// Settlement completion time
    pub settled_at: DateTime<Utc>,
}

impl EpochReport {
    /// Number of accepted transactions
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    /// Number of rejected candidates
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Input document of the `settle` binary: a starting pool and the batches to settle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochFile {
    /// Pool the first epoch settles against
    pub pool: UtxoPool,

    /// Candidate batches, settled one after another
    #[serde(default)]
    pub epochs: Vec<Vec<Transaction>>,
}

impl EpochFile {
    /// Read and parse an epoch file
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
