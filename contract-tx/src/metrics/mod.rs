//! Metrics for the contract transaction pipeline.
//!
//! This module defines Prometheus-compatible counters and histograms for
//! the validation and execution stages. No exporter is included; the
//! embedding node serves [`MetricsRegistry::gather_text`] however it likes.
//!
//! Typical usage:
//!
//! ```ignore
//! use contract_tx::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new()?;
//! let processor = BlockProcessor::new(validator, executor)
//!     .with_metrics(registry.tx.clone());
//!
//! // Later, e.g. from an HTTP handler:
//! let body = registry.gather_text();
//! ```

pub mod prometheus;

pub use prometheus::{MetricsRegistry, TxMetrics};
