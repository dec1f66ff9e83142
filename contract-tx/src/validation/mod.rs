//! Transaction validity predicates.
//!
//! Validation decides whether a contract transaction may enter a block at
//! a given height. It only ever sees a [`LedgerView`], so a failed (or
//! successful) check cannot change ledger state.
//!
//! It currently provides:
//!
//! - [`TxValidator`]: the predicate interface the block pipeline uses,
//! - [`contract::ContractTxValidity`]: the ordered rule set for the four
//!   contract transaction variants.

pub mod contract;

pub use contract::ContractTxValidity;

use crate::error::ValidationError;
use crate::ledger::LedgerView;
use crate::types::ContractTx;

/// Validity predicate for a single transaction at a block height.
pub trait TxValidator {
    /// Returns `Ok(())` if `tx` may be included at `height`.
    fn check<L: LedgerView>(
        &self,
        tx: &ContractTx,
        height: u32,
        view: &L,
    ) -> Result<(), ValidationError>;
}
