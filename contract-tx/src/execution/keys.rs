//! Involved-key extraction.
//!
//! Schedulers use the returned set to decide which transactions may run
//! in parallel, so an incomplete set is worse than an error: a
//! registration id that does not resolve fails the whole call.

use std::collections::BTreeSet;

use crate::error::KeyError;
use crate::ledger::LedgerView;
use crate::types::{Address, ContractTx, UserId};

/// Canonical addresses whose state `tx` may read or write: the sender and,
/// for invoke variants, the called contract.
pub fn involved_keys<L: LedgerView>(
    tx: &ContractTx,
    view: &L,
) -> Result<BTreeSet<Address>, KeyError> {
    let mut keys = BTreeSet::new();
    keys.insert(resolve(tx.sender(), view)?);
    if let Some(app_uid) = tx.body().app_uid() {
        keys.insert(resolve(app_uid, view)?);
    }
    Ok(keys)
}

fn resolve<L: LedgerView>(id: &UserId, view: &L) -> Result<Address, KeyError> {
    view.resolve_address(id)?
        .ok_or(KeyError::Unresolved(*id))
}
