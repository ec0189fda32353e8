//! Epoch settlement
//!
//! Settling an epoch is a strict left-to-right fold over the candidate batch
//! with the pool as accumulator:
//!
//! ```text
//! for tx in batch (caller order, never reordered):
//!     check tx against the pool as mutated so far
//!     accepted → remove every claimed outpoint,
//!                insert (tx.hash, i) for every output i
//!     rejected → pool untouched, tx dropped for good
//! ```
//!
//! First seen wins: of two candidates claiming the same output only the
//! earlier one is accepted, and a candidate spending an output created in
//! the same batch is accepted only if its parent came first. Callers rely on
//! this ordering, so it must not change.

use crate::{
    metrics::Metrics,
    types::{EpochReport, RejectedTransaction},
    validation::{check_transaction, Rejection, ValidatedTransaction},
};
use chrono::Utc;
use ledger_core::{OutPoint, SignatureVerifier, Transaction, UtxoPool};
use rust_decimal::Decimal;

/// Validates candidate transactions and applies accepted ones to a private pool
#[derive(Debug)]
pub struct TxHandler<V> {
    /// Exclusively owned copy of the caller's pool
    pool: UtxoPool,

    /// Signature oracle
    verifier: V,

    /// Epochs settled so far
    epoch: u64,

    /// Optional metrics sink
    metrics: Option<Metrics>,
}

impl<V: SignatureVerifier> TxHandler<V> {
    /// Create a handler working on a copy of `pool`
    pub fn new(pool: &UtxoPool, verifier: V) -> Self {
        Self {
            pool: pool.clone(),
            verifier,
            epoch: 0,
            metrics: None,
        }
    }

    /// Record settlement metrics
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        metrics.pool_size.set(self.pool.len() as i64);
        self.metrics = Some(metrics);
        self
    }

    /// Current pool state
    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    /// Give up the handler and keep its pool
    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    /// Number of epochs settled so far
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Check `tx` against the current pool, reporting why it fails
    pub fn check_tx(&self, tx: &Transaction) -> Result<ValidatedTransaction, Rejection> {
        check_transaction(&self.pool, &self.verifier, tx)
    }

    /// Whether `tx` could be accepted against the current pool
    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        self.check_tx(tx).is_ok()
    }

    /// Settle a batch and return the accepted transactions in acceptance order
    pub fn handle_txs(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        self.settle_epoch(candidates).accepted
    }

    /// Settle a batch and report what happened to every candidate
    ///
    /// A transaction with no inputs and only zero-value outputs has the same
    /// hash every time it is built, so it is accepted again in any later
    /// epoch and re-inserts its outpoints even after they were spent. Only
    /// zero value is ever re-created this way.
    pub fn settle_epoch(&mut self, candidates: &[Transaction]) -> EpochReport {
        self.epoch += 1;

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let mut implicit_fees = Decimal::ZERO;

        for (position, tx) in candidates.iter().enumerate() {
            match self.check_tx(tx) {
                Ok(validated) => {
                    tracing::debug!(
                        epoch = self.epoch,
                        position,
                        tx_hash = %validated.hash,
                        fee = %validated.fee,
                        "Transaction accepted"
                    );
                    self.apply(tx, &validated);
                    implicit_fees = implicit_fees.saturating_add(validated.fee);
                    accepted.push(tx.clone());
                }
                Err(reason) => {
                    let tx_hash = tx.hash();
                    tracing::debug!(
                        epoch = self.epoch,
                        position,
                        tx_hash = %tx_hash,
                        reason = %reason,
                        "Transaction rejected"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics
                            .rejected_total
                            .with_label_values(&[reason.label()])
                            .inc();
                    }
                    rejected.push(RejectedTransaction {
                        position,
                        tx_hash,
                        reason,
                    });
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.epochs_total.inc();
            metrics.accepted_total.inc_by(accepted.len() as u64);
            metrics.batch_size.observe(candidates.len() as f64);
            metrics.pool_size.set(self.pool.len() as i64);
        }

        tracing::info!(
            epoch = self.epoch,
            candidates = candidates.len(),
            accepted = accepted.len(),
            rejected = rejected.len(),
            pool_size = self.pool.len(),
            "Epoch settled"
        );

        EpochReport {
            epoch: self.epoch,
            accepted,
            rejected,
            implicit_fees,
            settled_at: Utc::now(),
        }
    }

    /// Apply an accepted transaction: retire its claims, then create its outputs
    fn apply(&mut self, tx: &Transaction, validated: &ValidatedTransaction) {
        for input in &tx.inputs {
            self.pool.remove(&input.outpoint());
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            self.pool
                .insert(OutPoint::new(validated.hash, index as u32), output.clone());
        }
    }
}
