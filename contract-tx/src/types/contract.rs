//! Contract payloads carried by deploy transactions.
//!
//! Two generations exist:
//!
//! - [`LegacyContract`]: a script plus a short memo, run by the legacy VM,
//! - [`UniversalContract`]: versioned bytecode with VM selection, an
//!   upgradability flag, a memo and an ABI description.
//!
//! Both are stored in the ledger as a [`ContractPayload`] once deployed.

use serde::{Deserialize, Serialize};

/// Virtual machine a universal contract targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VmType {
    LuaVm = 1,
    WasmVm = 2,
}

impl VmType {
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(VmType::LuaVm),
            2 => Some(VmType::WasmVm),
            _ => None,
        }
    }
}

/// Legacy scripting contract.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LegacyContract {
    /// Script bytes. Must be non-empty to deploy.
    pub code: Vec<u8>,
    /// Free-form description, bounded by the memo size limit.
    pub memo: Vec<u8>,
}

impl LegacyContract {
    pub fn new(code: impl Into<Vec<u8>>, memo: impl Into<Vec<u8>>) -> Self {
        Self {
            code: code.into(),
            memo: memo.into(),
        }
    }

    /// Total payload size in bytes, the basis for fuel and size limits.
    pub fn payload_size(&self) -> usize {
        self.code.len() + self.memo.len()
    }
}

/// Universal-format contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UniversalContract {
    /// VM that interprets `code`.
    pub vm_type: VmType,
    /// Whether the owner may later replace `code`.
    pub upgradable: bool,
    pub code: Vec<u8>,
    pub memo: Vec<u8>,
    /// Interface description consumed by wallets and explorers.
    pub abi: Vec<u8>,
}

impl UniversalContract {
    /// Total payload size in bytes, the basis for fuel and size limits.
    pub fn payload_size(&self) -> usize {
        self.code.len() + self.memo.len() + self.abi.len()
    }
}

/// A deployed contract's payload, of either generation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ContractPayload {
    Legacy(LegacyContract),
    Universal(UniversalContract),
}

impl ContractPayload {
    pub fn code(&self) -> &[u8] {
        match self {
            ContractPayload::Legacy(c) => &c.code,
            ContractPayload::Universal(c) => &c.code,
        }
    }

    pub fn memo(&self) -> &[u8] {
        match self {
            ContractPayload::Legacy(c) => &c.memo,
            ContractPayload::Universal(c) => &c.memo,
        }
    }

    pub fn payload_size(&self) -> usize {
        match self {
            ContractPayload::Legacy(c) => c.payload_size(),
            ContractPayload::Universal(c) => c.payload_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_size_counts_every_blob() {
        let legacy = LegacyContract::new(vec![1u8; 10], b"memo".to_vec());
        assert_eq!(legacy.payload_size(), 14);

        let universal = UniversalContract {
            vm_type: VmType::WasmVm,
            upgradable: true,
            code: vec![0u8; 100],
            memo: vec![0u8; 5],
            abi: vec![0u8; 7],
        };
        assert_eq!(universal.payload_size(), 112);
        assert_eq!(ContractPayload::Universal(universal).payload_size(), 112);
    }

    #[test]
    fn vm_type_roundtrips_through_its_tag() {
        for vm in [VmType::LuaVm, VmType::WasmVm] {
            assert_eq!(VmType::from_u64(vm as u64), Some(vm));
        }
        assert_eq!(VmType::from_u64(0), None);
        assert_eq!(VmType::from_u64(3), None);
    }
}
