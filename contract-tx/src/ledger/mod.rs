//! Ledger abstractions used by validation and execution.
//!
//! The account/contract store itself is owned by the embedding node; this
//! module only fixes the interface the contract stages need:
//!
//! - [`LedgerView`]: read-only access, the only thing validation gets,
//! - [`LedgerCache`]: a transactional handle with savepoints, handed to
//!   execution and to the contract VM,
//! - [`SymbolRegistry`]: the set of token symbols the protocol knows.
//!
//! [`mem::MemLedger`] is an in-memory implementation for tests and small
//! embedders.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{Address, ContractPayload, PublicKey, RegId, TokenSymbol, UserId};

pub mod mem;

pub use mem::{LedgerSnapshot, MemLedger, MemSavepoint};

/// An account as stored in the ledger.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    /// Registration id, once the account has been registered.
    pub reg_id: Option<RegId>,
    /// Key that signs for this account. Contract accounts have none.
    pub owner_pubkey: Option<PublicKey>,
    pub balances: BTreeMap<TokenSymbol, u64>,
}

impl Account {
    /// Unregistered account with no key and no balances.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            reg_id: None,
            owner_pubkey: None,
            balances: BTreeMap::new(),
        }
    }

    pub fn with_reg_id(mut self, reg_id: RegId) -> Self {
        self.reg_id = Some(reg_id);
        self
    }

    pub fn with_owner_pubkey(mut self, key: PublicKey) -> Self {
        self.owner_pubkey = Some(key);
        self
    }

    pub fn with_balance(mut self, symbol: TokenSymbol, amount: u64) -> Self {
        self.balances.insert(symbol, amount);
        self
    }

    pub fn balance(&self, symbol: &TokenSymbol) -> u64 {
        self.balances.get(symbol).copied().unwrap_or(0)
    }
}

/// A deployed contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Address of the contract account.
    pub address: Address,
    pub reg_id: RegId,
    /// Sender of the deploying transaction.
    pub owner: Address,
    pub payload: ContractPayload,
    pub deployed_height: u32,
}

/// Read-only view of ledger state.
pub trait LedgerView {
    /// Maps an identity to its canonical address.
    ///
    /// Returns `Ok(None)` for a registration id that is not bound to any
    /// account. An address always resolves to itself, even if no account
    /// exists for it yet.
    fn resolve_address(&self, id: &UserId) -> Result<Option<Address>, LedgerError>;

    /// Signing key recorded for the account, if any.
    fn owner_pubkey(&self, address: &Address) -> Result<Option<PublicKey>, LedgerError>;

    /// Balance of `symbol` held by `address`; zero for unknown accounts.
    fn balance(&self, address: &Address, symbol: &TokenSymbol) -> Result<u64, LedgerError>;

    /// Contract deployed at `address`, if any.
    fn contract(&self, address: &Address) -> Result<Option<ContractRecord>, LedgerError>;

    /// Value stored under `key` in a contract's storage.
    fn contract_data(&self, contract: &Address, key: &[u8])
    -> Result<Option<Vec<u8>>, LedgerError>;

    /// Current fuel price per fuel step.
    fn fuel_rate(&self) -> Result<u64, LedgerError>;
}

/// Transactional handle over ledger state.
///
/// Every mutation is undoable: [`LedgerCache::rollback_to`] restores the
/// state observed when the savepoint was taken. Savepoints nest; rolling
/// back to an older one also discards every newer one.
pub trait LedgerCache: LedgerView {
    type Savepoint: Copy;

    fn savepoint(&self) -> Self::Savepoint;

    fn rollback_to(&mut self, savepoint: Self::Savepoint);

    /// Removes `amount` of `symbol` from `address`.
    ///
    /// Fails with [`LedgerError::InsufficientBalance`] rather than going
    /// negative.
    fn debit(
        &mut self,
        address: &Address,
        symbol: &TokenSymbol,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Adds `amount` of `symbol` to `address`, creating the account if
    /// needed.
    fn credit(
        &mut self,
        address: &Address,
        symbol: &TokenSymbol,
        amount: u64,
    ) -> Result<(), LedgerError>;

    /// Creates the contract account for `record` and stores the record.
    ///
    /// Fails if an account already exists at the address or the
    /// registration id is taken.
    fn create_contract(&mut self, record: ContractRecord) -> Result<(), LedgerError>;

    fn put_contract_data(
        &mut self,
        contract: &Address,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<(), LedgerError>;
}

/// Set of token symbols the protocol accepts in universal transactions.
pub trait SymbolRegistry {
    fn is_registered(&self, symbol: &TokenSymbol) -> bool;
}

impl SymbolRegistry for HashSet<TokenSymbol> {
    fn is_registered(&self, symbol: &TokenSymbol) -> bool {
        self.contains(symbol)
    }
}

impl SymbolRegistry for BTreeSet<TokenSymbol> {
    fn is_registered(&self, symbol: &TokenSymbol) -> bool {
        self.contains(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ADDRESS_LEN;

    fn symbol(s: &str) -> TokenSymbol {
        TokenSymbol::new(s).expect("valid symbol")
    }

    #[test]
    fn account_builder_sets_fields() {
        let account = Account::new(Address([3u8; ADDRESS_LEN]))
            .with_reg_id(RegId::new(1, 0))
            .with_owner_pubkey(PublicKey(vec![1u8; 32]))
            .with_balance(symbol("WICC"), 50);

        assert_eq!(account.reg_id, Some(RegId::new(1, 0)));
        assert_eq!(account.balance(&symbol("WICC")), 50);
        assert_eq!(account.balance(&symbol("WUSD")), 0);
    }

    #[test]
    fn symbol_sets_act_as_registries() {
        let hashed: HashSet<TokenSymbol> = [symbol("WICC")].into_iter().collect();
        let ordered: BTreeSet<TokenSymbol> = [symbol("WUSD")].into_iter().collect();

        assert!(hashed.is_registered(&symbol("WICC")));
        assert!(!hashed.is_registered(&symbol("WUSD")));
        assert!(ordered.is_registered(&symbol("WUSD")));
    }
}
