//! Unspent transaction output pool
//!
//! The authoritative set of currently spendable outputs. Inserting an
//! outpoint models creation, removing one models spending.
//!
//! Cloning a pool is the copy-construction used by the settlement engine:
//! the engine works on its own copy and never aliases the caller's pool.

use crate::types::{Amount, OutPoint, Output};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A pool of unspent transaction outputs, indexed by outpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PoolEntry>", into = "Vec<PoolEntry>")]
pub struct UtxoPool {
    utxos: HashMap<OutPoint, Output>,
}

/// Serialized form of one pool entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Output identifier
    pub outpoint: OutPoint,
    /// Output data
    pub output: Output,
}

impl UtxoPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `outpoint` is currently spendable
    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    /// Look up an output, `None` if absent
    pub fn get(&self, outpoint: &OutPoint) -> Option<&Output> {
        self.utxos.get(outpoint)
    }

    /// Look up an output that is expected to exist
    pub fn output(&self, outpoint: &OutPoint) -> Result<&Output> {
        self.utxos
            .get(outpoint)
            .ok_or(Error::UnknownOutput(*outpoint))
    }

    /// Add an output, replacing any previous entry under the same outpoint
    pub fn insert(&mut self, outpoint: OutPoint, output: Output) -> Option<Output> {
        self.utxos.insert(outpoint, output)
    }

    /// Remove an output, returning it if it was present
    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<Output> {
        self.utxos.remove(outpoint)
    }

    /// Number of unspent outputs
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// Whether the pool holds no outputs
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Iterate over all entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &Output)> {
        self.utxos.iter()
    }

    /// All outpoints, sorted
    pub fn outpoints(&self) -> Vec<OutPoint> {
        let mut outpoints: Vec<OutPoint> = self.utxos.keys().copied().collect();
        outpoints.sort();
        outpoints
    }

    /// Sum of all unspent values, `None` on overflow
    pub fn total_value(&self) -> Option<Amount> {
        self.utxos
            .values()
            .try_fold(Decimal::ZERO, |acc, output| acc.checked_add(output.value))
    }

    /// Parse a pool from its JSON entry list
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Vec<PoolEntry>> for UtxoPool {
    fn from(entries: Vec<PoolEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.outpoint, entry.output))
            .collect()
    }
}

impl From<UtxoPool> for Vec<PoolEntry> {
    fn from(pool: UtxoPool) -> Self {
        let mut entries: Vec<PoolEntry> = pool
            .utxos
            .into_iter()
            .map(|(outpoint, output)| PoolEntry { outpoint, output })
            .collect();
        entries.sort_by_key(|entry| entry.outpoint);
        entries
    }
}

impl FromIterator<(OutPoint, Output)> for UtxoPool {
    fn from_iter<I: IntoIterator<Item = (OutPoint, Output)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}
