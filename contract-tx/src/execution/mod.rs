//! Execution stage: applying a validated contract transaction.
//!
//! [`Executor::execute`] is the only entry point that mutates the ledger.
//! It assumes a successful [`crate::validation::TxValidator::check`] for the
//! same transaction and height, and is atomic:
//!
//! - on success every effect is applied,
//! - on [`ExecutionError::ContractExecutionFailed`] only the fee debit
//!   remains (the value transfer and every VM write are undone),
//! - on any other error the ledger is exactly as before the call.
//!
//! Submodules:
//!
//! - [`fuel`]: deployment fuel pricing,
//! - [`keys`]: the set of accounts a transaction touches.

pub mod fuel;
pub mod keys;

pub use fuel::{FUEL_BYTES_PER_STEP, compute_fuel};
pub use keys::involved_keys;

use serde::{Deserialize, Serialize};

use crate::codec::Writer;
use crate::config::{ProtocolConfig, UnspentFuelPolicy};
use crate::error::{ExecutionError, LedgerError};
use crate::ledger::{ContractRecord, LedgerCache};
use crate::types::{
    ADDRESS_LEN, Address, ContractPayload, ContractTx, ContractTxBody, RegId, TokenSymbol,
    TxDigest, TxType, UserId,
};
use crate::vm::{ContractVm, InvokeContext, VmReceipt};

/// BLAKE3 key-derivation context for contract account addresses.
pub const CONTRACT_ADDRESS_CONTEXT: &str = "contract-tx v1 contract account address";

/// Identity assigned to a newly deployed contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub address: Address,
    pub reg_id: RegId,
}

/// Value moved from the sender to a contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValueTransfer {
    pub symbol: TokenSymbol,
    pub amount: u64,
    pub to: Address,
}

/// Effects of a successfully executed transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_digest: TxDigest,
    pub tx_type: TxType,
    pub height: u32,
    /// Position of the transaction within its block.
    pub index: u16,
    pub fee_symbol: TokenSymbol,
    /// Fee debited from the sender, before any refund.
    pub fees: u64,
    /// Fuel consumed by a deploy.
    pub fuel: Option<u64>,
    /// Unspent fuel credited back to the sender.
    pub refunded: u64,
    pub deployed: Option<DeployedContract>,
    pub transfer: Option<ValueTransfer>,
    /// VM result of an invoke.
    pub vm: Option<VmReceipt>,
}

/// Address of the contract deployed by the transaction at
/// (`height`, `index`) from `sender`.
///
/// The in-block index makes it unique even when one sender deploys
/// several contracts in the same block.
pub fn derive_contract_address(sender: &Address, height: u32, index: u16) -> Address {
    let mut w = Writer::new();
    w.put_raw(sender.as_bytes())
        .put_varint(u64::from(height))
        .put_varint(u64::from(index));

    let mut hasher = blake3::Hasher::new_derive_key(CONTRACT_ADDRESS_CONTEXT);
    hasher.update(w.as_bytes());
    let h = hasher.finalize();

    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&h.as_bytes()[..ADDRESS_LEN]);
    Address(out)
}

/// Applies validated contract transactions to a [`LedgerCache`].
#[derive(Clone, Debug)]
pub struct Executor<M> {
    base_symbol: TokenSymbol,
    unspent_fuel: UnspentFuelPolicy,
    vm: M,
}

impl<M: ContractVm> Executor<M> {
    pub fn new(cfg: &ProtocolConfig, vm: M) -> Self {
        Self {
            base_symbol: cfg.base_symbol.clone(),
            unspent_fuel: cfg.unspent_fuel,
            vm,
        }
    }

    pub fn vm(&self) -> &M {
        &self.vm
    }

    /// Executes `tx` as the `index`-th transaction of the block at `height`.
    pub fn execute<C: LedgerCache>(
        &self,
        tx: &ContractTx,
        height: u32,
        index: u16,
        cache: &mut C,
    ) -> Result<Receipt, ExecutionError> {
        let savepoint = cache.savepoint();

        let result = match tx.body() {
            ContractTxBody::LegacyDeploy(b) => {
                let payload = ContractPayload::Legacy(b.contract.clone());
                self.deploy(tx, payload, height, index, cache)
            }
            ContractTxBody::UniversalDeploy(b) => {
                let payload = ContractPayload::Universal(b.contract.clone());
                self.deploy(tx, payload, height, index, cache)
            }
            ContractTxBody::LegacyInvoke(b) => {
                self.invoke(tx, &b.app_uid, &b.arguments, height, index, cache)
            }
            ContractTxBody::UniversalInvoke(b) => {
                self.invoke(tx, &b.app_uid, &b.arguments, height, index, cache)
            }
        };

        match &result {
            Ok(_) | Err(ExecutionError::ContractExecutionFailed { .. }) => {}
            Err(_) => cache.rollback_to(savepoint),
        }
        result
    }

    fn deploy<C: LedgerCache>(
        &self,
        tx: &ContractTx,
        payload: ContractPayload,
        height: u32,
        index: u16,
        cache: &mut C,
    ) -> Result<Receipt, ExecutionError> {
        let tx_digest = tx.txid();
        let reg_id = RegId::new(height, index);
        if reg_id.is_empty() {
            return Err(ExecutionError::NoContractRegId { height, index });
        }
        let sender = resolve(tx.sender(), &*cache)?;

        let fuel = compute_fuel(payload.payload_size() as u64, cache.fuel_rate()?)?;
        if tx.fees() < fuel {
            return Err(ExecutionError::InsufficientFuel {
                fees: tx.fees(),
                fuel,
            });
        }

        let fee_symbol = tx.fee_symbol(&self.base_symbol);
        cache.debit(&sender, fee_symbol, tx.fees())?;

        let deployed = DeployedContract {
            address: derive_contract_address(&sender, height, index),
            reg_id,
        };
        cache.create_contract(ContractRecord {
            address: deployed.address,
            reg_id: deployed.reg_id,
            owner: sender,
            payload,
            deployed_height: height,
        })?;

        let (coin_symbol, amount) = tx.values(&self.base_symbol);
        let transfer = if amount > 0 {
            cache.debit(&sender, coin_symbol, amount)?;
            cache.credit(&deployed.address, coin_symbol, amount)?;
            Some(ValueTransfer {
                symbol: coin_symbol.clone(),
                amount,
                to: deployed.address,
            })
        } else {
            None
        };

        let refunded = match self.unspent_fuel {
            UnspentFuelPolicy::Burn => 0,
            UnspentFuelPolicy::Refund => {
                let unspent = tx.fees() - fuel;
                if unspent > 0 {
                    cache.credit(&sender, fee_symbol, unspent)?;
                }
                unspent
            }
        };

        tracing::debug!(
            tx = %tx_digest,
            height,
            index,
            contract = %deployed.address,
            reg_id = %deployed.reg_id,
            fuel,
            refunded,
            "deployed contract"
        );

        Ok(Receipt {
            tx_digest,
            tx_type: tx.tx_type(),
            height,
            index,
            fee_symbol: fee_symbol.clone(),
            fees: tx.fees(),
            fuel: Some(fuel),
            refunded,
            deployed: Some(deployed),
            transfer,
            vm: None,
        })
    }

    fn invoke<C: LedgerCache>(
        &self,
        tx: &ContractTx,
        app_uid: &UserId,
        arguments: &[u8],
        height: u32,
        index: u16,
        cache: &mut C,
    ) -> Result<Receipt, ExecutionError> {
        let tx_digest = tx.txid();
        let sender = resolve(tx.sender(), &*cache)?;
        let contract = resolve(app_uid, &*cache)?;
        let record = cache
            .contract(&contract)?
            .ok_or(LedgerError::ContractNotFound(contract))?;

        let fee_symbol = tx.fee_symbol(&self.base_symbol);
        cache.debit(&sender, fee_symbol, tx.fees())?;

        // Everything after this point is undone if the VM fails.
        let after_fee = cache.savepoint();

        let (coin_symbol, amount) = tx.values(&self.base_symbol);
        let transfer = if amount > 0 {
            cache.debit(&sender, coin_symbol, amount)?;
            cache.credit(&contract, coin_symbol, amount)?;
            Some(ValueTransfer {
                symbol: coin_symbol.clone(),
                amount,
                to: contract,
            })
        } else {
            None
        };

        let ctx = InvokeContext {
            tx_digest,
            caller: sender,
            contract: &record,
            arguments,
            value: (coin_symbol, amount),
            height,
            index,
        };

        match self.vm.invoke(cache, &ctx) {
            Ok(vm) => {
                tracing::debug!(
                    tx = %tx_digest,
                    height,
                    index,
                    contract = %contract,
                    fuel_used = vm.fuel_used,
                    "invoked contract"
                );
                Ok(Receipt {
                    tx_digest,
                    tx_type: tx.tx_type(),
                    height,
                    index,
                    fee_symbol: fee_symbol.clone(),
                    fees: tx.fees(),
                    fuel: None,
                    refunded: 0,
                    deployed: None,
                    transfer,
                    vm: Some(vm),
                })
            }
            Err(source) => {
                cache.rollback_to(after_fee);
                tracing::warn!(
                    tx = %tx_digest,
                    height,
                    index,
                    contract = %contract,
                    error = %source,
                    "contract execution failed, fee kept"
                );
                Err(ExecutionError::ContractExecutionFailed {
                    fees_charged: tx.fees(),
                    source,
                })
            }
        }
    }
}

fn resolve<C: LedgerCache>(id: &UserId, cache: &C) -> Result<Address, LedgerError> {
    cache
        .resolve_address(id)?
        .ok_or(LedgerError::Unresolved(*id))
}
