//! Error types for contract transactions.
//!
//! Every stage reports a typed error and nothing is swallowed or retried:
//!
//! - [`CodecError`]: structural decode failures (`MalformedEncoding`),
//! - [`ConstructionError`]: invariant violations when building a transaction,
//! - [`ValidationError`]: reasons a transaction is excluded from a block,
//! - [`ExecutionError`]: reasons execution failed (ledger rolled back),
//! - [`LedgerError`], [`VmError`]: collaborator failures, passed through.

use thiserror::Error;

use crate::types::{Address, RegId, TokenSymbol, TxType, UserId};

/// Structural decoding failure.
///
/// All variants are reported to validation callers as
/// [`ValidationError::MalformedEncoding`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before `0` was fully read.
    #[error("unexpected end of input while reading {0}")]
    Truncated(&'static str),

    /// A varint does not fit into its declared width.
    #[error("varint overflows a {width}-bit field")]
    VarintOverflow { width: u32 },

    /// A varint carries redundant trailing zero groups.
    #[error("non-canonical varint encoding")]
    NonCanonicalVarint,

    /// A length prefix points past the end of the input.
    #[error("length prefix {len} exceeds the {remaining} remaining bytes")]
    LengthOutOfBounds { len: u64, remaining: usize },

    /// A tagged union carries a tag this decoder does not know.
    #[error("unknown {field} discriminant {value}")]
    UnknownDiscriminant { field: &'static str, value: u64 },

    /// Bytes remain after the last declared field.
    #[error("{0} trailing bytes after the last field")]
    TrailingBytes(usize),

    /// A field decoded but violates its type's rules.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl From<ConstructionError> for CodecError {
    fn from(e: ConstructionError) -> Self {
        CodecError::InvalidField {
            field: "transaction",
            reason: e.to_string(),
        }
    }
}

/// A transaction or one of its fields could not be constructed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstructionError {
    /// A registration-id identity is empty (`0-0`).
    #[error("{field} is an empty registration id")]
    EmptyRegId { field: &'static str },

    /// A token symbol does not follow the ticker rules.
    #[error("invalid token symbol {symbol:?}: {reason}")]
    InvalidSymbol {
        symbol: String,
        reason: &'static str,
    },
}

/// Failure reported by a ledger view or ledger cache.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The identity cannot be mapped to an account.
    #[error("identity {0} does not resolve to an account")]
    Unresolved(UserId),

    /// No contract is deployed at the address.
    #[error("no contract deployed at {0}")]
    ContractNotFound(Address),

    /// An account already exists at the address.
    #[error("account {0} already exists")]
    AccountExists(Address),

    /// The registration id is already bound to another account.
    #[error("registration id {0} is already bound")]
    RegIdTaken(RegId),

    #[error("insufficient {symbol} balance on {address}: have {available}, need {required}")]
    InsufficientBalance {
        address: Address,
        symbol: TokenSymbol,
        available: u64,
        required: u64,
    },

    #[error("{symbol} balance overflow on {address}")]
    BalanceOverflow {
        address: Address,
        symbol: TokenSymbol,
    },

    /// Opaque failure of the underlying store.
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

/// Failure reported by the contract VM.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VmError {
    /// The contract aborted the call.
    #[error("contract reverted: {0}")]
    Reverted(String),

    /// The VM ran out of fuel.
    #[error("contract ran out of fuel after {used} units")]
    OutOfFuel { used: u64 },

    /// A ledger access made by the VM failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Reason a transaction fails the validation stage.
///
/// A transaction failing validation is excluded from the block and has
/// no effect on the ledger.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] CodecError),

    #[error("transaction expired: valid until height {valid_height}, now {height}")]
    Expired { valid_height: u32, height: u32 },

    #[error("unknown sender {0}")]
    UnknownSender(UserId),

    #[error("missing or invalid signature")]
    BadSignature,

    #[error("fees {fees} below the {min} minimum for {tx_type}")]
    FeeBelowMinimum { tx_type: TxType, fees: u64, min: u64 },

    /// `required` is wide enough that `fees + amount` cannot overflow.
    #[error("insufficient {symbol} funds: have {available}, need {required}")]
    InsufficientFunds {
        symbol: TokenSymbol,
        available: u64,
        required: u128,
    },

    #[error("unknown contract {0}")]
    UnknownContract(UserId),

    #[error("arguments of {size} bytes exceed the {max} byte limit")]
    ArgumentsTooLarge { size: usize, max: usize },

    #[error("contract payload of {size} bytes exceeds the {max} byte limit")]
    ContractTooLarge { size: usize, max: usize },

    #[error("contract code is empty")]
    EmptyContract,

    #[error("token symbol {0} is not registered")]
    UnknownSymbol(TokenSymbol),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ValidationError {
    /// Stable short name, used as a metric label and log field.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationError::MalformedEncoding(_) => "malformed_encoding",
            ValidationError::Expired { .. } => "expired",
            ValidationError::UnknownSender(_) => "unknown_sender",
            ValidationError::BadSignature => "bad_signature",
            ValidationError::FeeBelowMinimum { .. } => "fee_below_minimum",
            ValidationError::InsufficientFunds { .. } => "insufficient_funds",
            ValidationError::UnknownContract(_) => "unknown_contract",
            ValidationError::ArgumentsTooLarge { .. } => "arguments_too_large",
            ValidationError::ContractTooLarge { .. } => "contract_too_large",
            ValidationError::EmptyContract => "empty_contract",
            ValidationError::UnknownSymbol(_) => "unknown_symbol",
            ValidationError::Ledger(_) => "ledger",
        }
    }
}

/// Reason the execution stage failed.
///
/// Except for [`ExecutionError::ContractExecutionFailed`], the ledger is
/// left exactly as it was before the call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The fees do not cover the deployment fuel.
    #[error("fees {fees} do not cover the {fuel} fuel required")]
    InsufficientFuel { fees: u64, fuel: u64 },

    #[error("fuel for {payload_size} bytes at rate {fuel_rate} overflows u64")]
    FuelOverflow { payload_size: u64, fuel_rate: u64 },

    /// A deploy at height 0, index 0 would be assigned the empty
    /// registration id.
    #[error("no contract id can be assigned at height {height}, index {index}")]
    NoContractRegId { height: u32, index: u16 },

    /// The VM rejected the call. The fee stays charged; the value transfer
    /// and every VM write are rolled back.
    #[error("contract execution failed (fees {fees_charged} charged): {source}")]
    ContractExecutionFailed { fees_charged: u64, source: VmError },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ExecutionError {
    /// Stable short name, used as a metric label and log field.
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionError::InsufficientFuel { .. } => "insufficient_fuel",
            ExecutionError::FuelOverflow { .. } => "fuel_overflow",
            ExecutionError::NoContractRegId { .. } => "no_contract_reg_id",
            ExecutionError::ContractExecutionFailed { .. } => "contract_execution_failed",
            ExecutionError::Ledger(_) => "ledger",
        }
    }
}

/// Failure to compute the involved-key set of a transaction.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// A registration id did not resolve; the key set would be incomplete.
    #[error("cannot resolve {0} to a canonical account")]
    Unresolved(UserId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_error_maps_to_invalid_field() {
        let err: CodecError = ConstructionError::EmptyRegId { field: "sender" }.into();
        match err {
            CodecError::InvalidField { field, reason } => {
                assert_eq!(field, "transaction");
                assert!(reason.contains("sender"), "unexpected reason: {reason}");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn codec_errors_surface_as_malformed_encoding() {
        let err: ValidationError = CodecError::TrailingBytes(3).into();
        assert_eq!(err.label(), "malformed_encoding");
        assert!(err.to_string().contains("3 trailing bytes"));
    }

    #[test]
    fn vm_failure_message_names_the_fee() {
        let err = ExecutionError::ContractExecutionFailed {
            fees_charged: 42,
            source: VmError::Reverted("boom".to_string()),
        };
        assert_eq!(err.label(), "contract_execution_failed");
        let msg = err.to_string();
        assert!(msg.contains("42") && msg.contains("boom"), "unexpected message: {msg}");
    }
}
