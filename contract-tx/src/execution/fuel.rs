//! Fuel accounting for contract deployment.
//!
//! Fuel is charged per started block of [`FUEL_BYTES_PER_STEP`] payload
//! bytes, priced at the ledger's current fuel rate.

use crate::error::ExecutionError;

/// Payload bytes covered by one fuel step.
pub const FUEL_BYTES_PER_STEP: u64 = 100;

/// Fuel required to deploy a payload of `payload_size` bytes:
/// `ceil(payload_size / 100) * fuel_rate`.
pub fn compute_fuel(payload_size: u64, fuel_rate: u64) -> Result<u64, ExecutionError> {
    payload_size
        .div_ceil(FUEL_BYTES_PER_STEP)
        .checked_mul(fuel_rate)
        .ok_or(ExecutionError::FuelOverflow {
            payload_size,
            fuel_rate,
        })
}
