//! Prometheus-backed transaction metrics.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed [`TxMetrics`].

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Contract transaction metrics.
///
/// These are registered into a [`Registry`] and updated by the block
/// pipeline. Rejection and failure counters are labelled with
/// [`crate::error::ValidationError::label`] and
/// [`crate::error::ExecutionError::label`].
#[derive(Clone)]
pub struct TxMetrics {
    /// Transactions that went through validation.
    pub checked: IntCounter,
    /// Transactions excluded by validation, by reason.
    pub rejected: IntCounterVec,
    /// Transactions executed successfully.
    pub applied: IntCounter,
    /// Transactions whose execution failed, by reason.
    pub failed: IntCounterVec,
    /// Fuel charged per contract deployment.
    pub deploy_fuel: Histogram,
}

impl TxMetrics {
    /// Registers transaction metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let checked = IntCounter::with_opts(Opts::new(
            "checked_total",
            "Total number of contract transactions that went through validation",
        ))?;
        registry.register(Box::new(checked.clone()))?;

        let rejected = IntCounterVec::new(
            Opts::new(
                "rejected_total",
                "Total number of contract transactions excluded by validation",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rejected.clone()))?;

        let applied = IntCounter::with_opts(Opts::new(
            "applied_total",
            "Total number of contract transactions executed successfully",
        ))?;
        registry.register(Box::new(applied.clone()))?;

        let failed = IntCounterVec::new(
            Opts::new(
                "failed_total",
                "Total number of contract transactions whose execution failed",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(failed.clone()))?;

        let deploy_fuel = Histogram::with_opts(
            HistogramOpts::new("deploy_fuel", "Fuel charged per contract deployment")
                .buckets(prometheus::exponential_buckets(1.0, 4.0, 12)?),
        )?;
        registry.register(Box::new(deploy_fuel.clone()))?;

        Ok(Self {
            checked,
            rejected,
            applied,
            failed,
            deploy_fuel,
        })
    }
}

/// Wrapper around a Prometheus registry and the transaction metrics.
///
/// Metric names are prefixed with `contract_tx_`.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub tx: TxMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the transaction metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("contract_tx".to_string()), None)?;
        let tx = TxMetrics::register(&registry)?;
        Ok(Self { registry, tx })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
