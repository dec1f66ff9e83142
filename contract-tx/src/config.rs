//! Protocol configuration for contract transactions.
//!
//! This module aggregates the knobs the validation and execution stages
//! read:
//!
//! - the base token used by legacy variants (`base_symbol`),
//! - payload size limits (`ContractLimits`),
//! - per-type minimum fees (`MinFees`),
//! - what happens to unspent deployment fuel (`UnspentFuelPolicy`).
//!
//! Every struct has a `Default` with the mainnet values and derives
//! `serde`, so embedders can construct it in code or load it from JSON.

use serde::{Deserialize, Serialize};

use crate::types::{TokenSymbol, TxType};

/// Size limits for contract payloads and call arguments, in bytes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractLimits {
    /// Maximum total payload size (code + memo + abi) of a deploy.
    pub max_contract_size: usize,
    /// Maximum memo size of a deploy.
    pub max_memo_size: usize,
    /// Maximum `arguments` size of an invoke.
    pub max_arguments_size: usize,
}

impl Default for ContractLimits {
    fn default() -> Self {
        Self {
            max_contract_size: 64 * 1024,
            max_memo_size: 100,
            max_arguments_size: 4 * 1024,
        }
    }
}

/// Minimum fees per transaction type, in the fee token's smallest unit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinFees {
    pub legacy_deploy: u64,
    pub legacy_invoke: u64,
    pub universal_deploy: u64,
    pub universal_invoke: u64,
}

impl MinFees {
    pub fn for_type(&self, tx_type: TxType) -> u64 {
        match tx_type {
            TxType::LegacyDeploy => self.legacy_deploy,
            TxType::LegacyInvoke => self.legacy_invoke,
            TxType::UniversalDeploy => self.universal_deploy,
            TxType::UniversalInvoke => self.universal_invoke,
        }
    }
}

impl Default for MinFees {
    fn default() -> Self {
        Self {
            legacy_deploy: 1_000_000,
            legacy_invoke: 1_000,
            universal_deploy: 1_000_000,
            universal_invoke: 1_000,
        }
    }
}

/// Treatment of `fees - fuel` after a successful deploy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnspentFuelPolicy {
    /// The whole fee is charged.
    #[default]
    Burn,
    /// The difference is credited back to the sender.
    Refund,
}

/// Top-level protocol configuration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Token that legacy variants pay fees and move value in.
    pub base_symbol: TokenSymbol,
    pub limits: ContractLimits,
    pub min_fees: MinFees,
    pub unspent_fuel: UnspentFuelPolicy,
}

impl ProtocolConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        // Safe to expect: this is a fixed, valid ticker literal.
        let base_symbol = TokenSymbol::new("WICC").expect("hard-coded base symbol should be valid");
        Self {
            base_symbol,
            limits: ContractLimits::default(),
            min_fees: MinFees::default(),
            unspent_fuel: UnspentFuelPolicy::default(),
        }
    }
}
