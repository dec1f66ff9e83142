//! Contract VM interface.
//!
//! Contract code runs in a VM owned by the embedding node. Execution hands
//! it an [`InvokeContext`] and the transaction's [`LedgerCache`]; every
//! write the VM makes goes through the cache so that a failed call can be
//! rolled back together with the value transfer that preceded it.

use serde::{Deserialize, Serialize};

use crate::error::VmError;
use crate::ledger::{ContractRecord, LedgerCache};
use crate::types::{Address, TokenSymbol, TxDigest};

/// Everything a VM learns about the call it is running.
#[derive(Clone, Debug)]
pub struct InvokeContext<'a> {
    pub tx_digest: TxDigest,
    /// Canonical address of the transaction sender.
    pub caller: Address,
    pub contract: &'a ContractRecord,
    pub arguments: &'a [u8],
    /// Token and amount already moved from the caller to the contract.
    pub value: (&'a TokenSymbol, u64),
    pub height: u32,
    pub index: u16,
}

impl InvokeContext<'_> {
    /// Address of the called contract.
    pub fn contract_address(&self) -> Address {
        self.contract.address
    }
}

/// Result of a successful contract call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VmReceipt {
    pub fuel_used: u64,
    /// Return data of the call.
    pub output: Vec<u8>,
}

/// A contract virtual machine.
pub trait ContractVm {
    fn invoke<C: LedgerCache>(
        &self,
        cache: &mut C,
        ctx: &InvokeContext<'_>,
    ) -> Result<VmReceipt, VmError>;
}

/// VM that accepts every call without running any code.
///
/// Useful for tests and for nodes that only track value movement.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllVm;

impl ContractVm for AcceptAllVm {
    fn invoke<C: LedgerCache>(
        &self,
        _cache: &mut C,
        _ctx: &InvokeContext<'_>,
    ) -> Result<VmReceipt, VmError> {
        Ok(VmReceipt::default())
    }
}
