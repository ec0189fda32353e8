//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring settlement.
//!
//! # Metrics
//!
//! - `settlement_epochs_total` - Total number of settled epochs
//! - `settlement_accepted_total` - Total number of accepted transactions
//! - `settlement_rejected_total{reason}` - Rejected candidates by rule
//! - `settlement_batch_size` - Histogram of candidate batch sizes
//! - `settlement_pool_size` - Unspent outputs after the last epoch
//!
//! Collectors live in a private registry, so several handlers can coexist in
//! one process (tests do this).

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use crate::error::Result;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total settled epochs
    pub epochs_total: IntCounter,

    /// Total accepted transactions
    pub accepted_total: IntCounter,

    /// Rejected candidates, labelled by reason
    pub rejected_total: IntCounterVec,

    /// Batch size histogram
    pub batch_size: Histogram,

    /// Pool size after the last epoch
    pub pool_size: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let epochs_total = IntCounter::new("settlement_epochs_total", "Total number of settled epochs")?;
        registry.register(Box::new(epochs_total.clone()))?;

        let accepted_total = IntCounter::new(
            "settlement_accepted_total",
            "Total number of accepted transactions",
        )?;
        registry.register(Box::new(accepted_total.clone()))?;

        let rejected_total = IntCounterVec::new(
            Opts::new("settlement_rejected_total", "Rejected candidates by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let batch_size = Histogram::with_opts(
            HistogramOpts::new("settlement_batch_size", "Histogram of candidate batch sizes")
                .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]),
        )?;
        registry.register(Box::new(batch_size.clone()))?;

        let pool_size = IntGauge::new(
            "settlement_pool_size",
            "Unspent outputs held after the last epoch",
        )?;
        registry.register(Box::new(pool_size.clone()))?;

        Ok(Self {
            epochs_total,
            accepted_total,
            rejected_total,
            batch_size,
            pool_size,
            registry,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("epochs_total", &self.epochs_total.get())
            .field("accepted_total", &self.accepted_total.get())
            .field("pool_size", &self.pool_size.get())
            .finish_non_exhaustive()
    }
}
