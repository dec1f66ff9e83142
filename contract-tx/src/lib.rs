//! Contract transaction library crate.
//!
//! This crate provides the contract deploy/invoke transactions of an
//! account-based ledger, across the legacy and universal contract formats:
//!
//! - strongly-typed transaction and identity types (`types`),
//! - the canonical byte codec (`codec`),
//! - the signing digest with explicit caching (`digest`),
//! - ed25519 signing and verification (`crypto`),
//! - validity rules (`validation`),
//! - atomic execution, fuel accounting and key extraction (`execution`),
//! - ledger and VM collaborator interfaces (`ledger`, `vm`),
//! - block-level orchestration (`pipeline`),
//! - Prometheus-based metrics (`metrics`),
//! - and protocol configuration (`config`).
//!
//! The crate installs no `tracing` subscriber; embedders choose one.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod execution;
pub mod ledger;
pub mod metrics;
pub mod pipeline;
pub mod types;
pub mod validation;
pub mod vm;

// Re-export configuration types.
pub use config::{ContractLimits, MinFees, ProtocolConfig, UnspentFuelPolicy};

// Re-export error types.
pub use error::{
    CodecError, ConstructionError, ExecutionError, KeyError, LedgerError, ValidationError,
    VmError,
};

// Re-export the lifecycle stages.
pub use execution::{
    DeployedContract, Executor, Receipt, ValueTransfer, compute_fuel, derive_contract_address,
    involved_keys,
};
pub use pipeline::{BlockOutcome, BlockProcessor, ExclusionReason, TxOutcome};
pub use validation::{ContractTxValidity, TxValidator};

// Re-export collaborator interfaces and the in-memory ledger.
pub use ledger::{
    Account, ContractRecord, LedgerCache, LedgerView, MemLedger, SymbolRegistry,
};
pub use vm::{AcceptAllVm, ContractVm, InvokeContext, VmReceipt};

pub use metrics::{MetricsRegistry, TxMetrics};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Validator for a node whose symbol registry is a fixed set.
pub type DefaultValidator = ContractTxValidity<std::collections::BTreeSet<TokenSymbol>>;
