//! Metrics collection for observability
//!
//! Prometheus metrics for one simulation run, on a registry owned by the run
//! so independent runs in one process never collide.
//!
//! # Metrics
//!
//! - `pool_sim_transactions_total` - Transactions processed
//! - `pool_sim_events_total` - Events dispatched to a handler
//! - `pool_sim_events_ignored_total` - Records from other contracts or unmodeled
//! - `pool_sim_warnings_total` - Consistency warnings raised
//! - `pool_sim_rewards_total` - Rewards created
//! - `pool_sim_events_per_transaction` - Histogram of records per transaction

use crate::processor::TxResult;
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Transactions processed
    pub transactions_total: IntCounter,

    /// Events handled
    pub events_total: IntCounter,

    /// Records ignored
    pub events_ignored: IntCounter,

    /// Warnings raised
    pub warnings_total: IntCounter,

    /// Rewards created
    pub rewards_total: IntCounter,

    /// Records per transaction
    pub events_per_transaction: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::new(
            "pool_sim_transactions_total",
            "Total number of transactions processed",
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let events_total = IntCounter::new(
            "pool_sim_events_total",
            "Total number of events dispatched to a handler",
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let events_ignored = IntCounter::new(
            "pool_sim_events_ignored_total",
            "Total number of records ignored",
        )?;
        registry.register(Box::new(events_ignored.clone()))?;

        let warnings_total = IntCounter::new(
            "pool_sim_warnings_total",
            "Total number of consistency warnings raised",
        )?;
        registry.register(Box::new(warnings_total.clone()))?;

        let rewards_total = IntCounter::new("pool_sim_rewards_total", "Total number of rewards created")?;
        registry.register(Box::new(rewards_total.clone()))?;

        let events_per_transaction = Histogram::with_opts(
            HistogramOpts::new(
                "pool_sim_events_per_transaction",
                "Histogram of records per transaction",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        )?;
        registry.register(Box::new(events_per_transaction.clone()))?;

        Ok(Self {
            transactions_total,
            events_total,
            events_ignored,
            warnings_total,
            rewards_total,
            events_per_transaction,
            registry,
        })
    }

    /// Record a processed transaction
    pub fn record_transaction(&self, result: &TxResult) {
        self.transactions_total.inc();
        self.events_total.inc_by(result.handled as u64);
        self.events_ignored.inc_by(result.ignored as u64);
        self.warnings_total.inc_by(result.warnings.len() as u64);
        self.rewards_total.inc_by(result.rewards.len() as u64);
        self.events_per_transaction.observe(result.event_count as f64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, reader::NoReads, store::EntityStore, types::TxContext};
    use alloy_primitives::B256;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.transactions_total.get(), 0);
        assert_eq!(metrics.rewards_total.get(), 0);
        assert_eq!(metrics.registry().gather().len(), 6);
    }

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.transactions_total.inc();
        assert_eq!(second.transactions_total.get(), 0);
    }

    #[test]
    fn test_record_transaction() {
        let metrics = Metrics::new().unwrap();
        let tx = TxContext {
            tx_hash: B256::ZERO,
            block_number: 1,
            block_timestamp: 1,
            transaction_index: 0,
        };
        let mut store = EntityStore::new();
        let result =
            crate::processor::process_transaction(&mut store, &tx, &[], &NoReads, &Config::default()).unwrap();

        metrics.record_transaction(&result);
        assert_eq!(metrics.transactions_total.get(), 1);
        assert_eq!(metrics.events_total.get(), 0);
    }
}
