//! In-memory ledger.
//!
//! This implementation is useful for unit tests, benchmarks and small
//! embedders. State lives in ordered maps; every mutation made through
//! [`LedgerCache`] pushes an undo record onto a journal, and a savepoint
//! is simply a journal length.

use std::collections::BTreeMap;

use crate::error::LedgerError;
use crate::ledger::{Account, ContractRecord, LedgerCache, LedgerView};
use crate::types::{Address, PublicKey, RegId, TokenSymbol, UserId};

/// Fuel rate of a fresh [`MemLedger`].
pub const DEFAULT_FUEL_RATE: u64 = 1;

/// Savepoint into a [`MemLedger`] journal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MemSavepoint(usize);

#[derive(Clone, Debug)]
enum Undo {
    Balance {
        address: Address,
        symbol: TokenSymbol,
        previous: Option<u64>,
    },
    AccountCreated(Address),
    ContractCreated {
        address: Address,
        reg_id: RegId,
    },
    ContractData {
        contract: Address,
        key: Vec<u8>,
        previous: Option<Vec<u8>>,
    },
}

/// Comparable copy of a [`MemLedger`]'s state, without the journal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerSnapshot {
    accounts: BTreeMap<Address, Account>,
    reg_ids: BTreeMap<RegId, Address>,
    contracts: BTreeMap<Address, ContractRecord>,
    contract_data: BTreeMap<(Address, Vec<u8>), Vec<u8>>,
    fuel_rate: u64,
}

/// In-memory implementation of [`LedgerView`] and [`LedgerCache`].
#[derive(Clone, Debug)]
pub struct MemLedger {
    accounts: BTreeMap<Address, Account>,
    reg_ids: BTreeMap<RegId, Address>,
    contracts: BTreeMap<Address, ContractRecord>,
    contract_data: BTreeMap<(Address, Vec<u8>), Vec<u8>>,
    fuel_rate: u64,
    journal: Vec<Undo>,
}

impl Default for MemLedger {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            reg_ids: BTreeMap::new(),
            contracts: BTreeMap::new(),
            contract_data: BTreeMap::new(),
            fuel_rate: DEFAULT_FUEL_RATE,
            journal: Vec::new(),
        }
    }
}

impl MemLedger {
    /// Creates an empty ledger with [`DEFAULT_FUEL_RATE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account. Setup operation; not journaled.
    pub fn insert_account(&mut self, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&account.address) {
            return Err(LedgerError::AccountExists(account.address));
        }
        if let Some(reg_id) = account.reg_id {
            if self.reg_ids.contains_key(&reg_id) {
                return Err(LedgerError::RegIdTaken(reg_id));
            }
            self.reg_ids.insert(reg_id, account.address);
        }
        self.accounts.insert(account.address, account);
        Ok(())
    }

    /// Sets the fuel rate. Setup operation; not journaled.
    pub fn set_fuel_rate(&mut self, rate: u64) {
        self.fuel_rate = rate;
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Accepts every mutation so far; earlier savepoints become invalid.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Number of undo records since the last commit.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts.clone(),
            reg_ids: self.reg_ids.clone(),
            contracts: self.contracts.clone(),
            contract_data: self.contract_data.clone(),
            fuel_rate: self.fuel_rate,
        }
    }

    fn set_balance(&mut self, address: &Address, symbol: &TokenSymbol, amount: u64) {
        if !self.accounts.contains_key(address) {
            self.accounts.insert(*address, Account::new(*address));
            self.journal.push(Undo::AccountCreated(*address));
        }
        if let Some(account) = self.accounts.get_mut(address) {
            let previous = account.balances.insert(symbol.clone(), amount);
            self.journal.push(Undo::Balance {
                address: *address,
                symbol: symbol.clone(),
                previous,
            });
        }
    }

    fn undo(&mut self, record: Undo) {
        match record {
            Undo::Balance {
                address,
                symbol,
                previous,
            } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    match previous {
                        Some(amount) => {
                            account.balances.insert(symbol, amount);
                        }
                        None => {
                            account.balances.remove(&symbol);
                        }
                    }
                }
            }
            Undo::AccountCreated(address) => {
                self.accounts.remove(&address);
            }
            Undo::ContractCreated { address, reg_id } => {
                self.contracts.remove(&address);
                self.reg_ids.remove(&reg_id);
                self.accounts.remove(&address);
            }
            Undo::ContractData {
                contract,
                key,
                previous,
            } => match previous {
                Some(value) => {
                    self.contract_data.insert((contract, key), value);
                }
                None => {
                    self.contract_data.remove(&(contract, key));
                }
            },
        }
    }
}

impl LedgerView for MemLedger {
    fn resolve_address(&self, id: &UserId) -> Result<Option<Address>, LedgerError> {
        Ok(match id {
            UserId::Address(a) => Some(*a),
            UserId::RegId(r) => self.reg_ids.get(r).copied(),
        })
    }

    fn owner_pubkey(&self, address: &Address) -> Result<Option<PublicKey>, LedgerError> {
        Ok(self
            .accounts
            .get(address)
            .and_then(|a| a.owner_pubkey.clone()))
    }

    fn balance(&self, address: &Address, symbol: &TokenSymbol) -> Result<u64, LedgerError> {
        Ok(self
            .accounts
            .get(address)
            .map(|a| a.balance(symbol))
            .unwrap_or(0))
    }

    fn contract(&self, address: &Address) -> Result<Option<ContractRecord>, LedgerError> {
        Ok(self.contracts.get(address).cloned())
    }

    fn contract_data(
        &self,
        contract: &Address,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.contract_data.get(&(*contract, key.to_vec())).cloned())
    }

    fn fuel_rate(&self) -> Result<u64, LedgerError> {
        Ok(self.fuel_rate)
    }
}

impl LedgerCache for MemLedger {
    type Savepoint = MemSavepoint;

    fn savepoint(&self) -> MemSavepoint {
        MemSavepoint(self.journal.len())
    }

    fn rollback_to(&mut self, savepoint: MemSavepoint) {
        while self.journal.len() > savepoint.0 {
            if let Some(record) = self.journal.pop() {
                self.undo(record);
            }
        }
    }

    fn debit(
        &mut self,
        address: &Address,
        symbol: &TokenSymbol,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let available = self.balance(address, symbol)?;
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    address: *address,
                    symbol: symbol.clone(),
                    available,
                    required: amount,
                })?;
        self.set_balance(address, symbol, remaining);
        Ok(())
    }

    fn credit(
        &mut self,
        address: &Address,
        symbol: &TokenSymbol,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let current = self.balance(address, symbol)?;
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                address: *address,
                symbol: symbol.clone(),
            })?;
        self.set_balance(address, symbol, updated);
        Ok(())
    }

    fn create_contract(&mut self, record: ContractRecord) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&record.address) || self.contracts.contains_key(&record.address)
        {
            return Err(LedgerError::AccountExists(record.address));
        }
        if self.reg_ids.contains_key(&record.reg_id) {
            return Err(LedgerError::RegIdTaken(record.reg_id));
        }

        let address = record.address;
        let reg_id = record.reg_id;
        self.accounts
            .insert(address, Account::new(address).with_reg_id(reg_id));
        self.reg_ids.insert(reg_id, address);
        self.contracts.insert(address, record);
        self.journal.push(Undo::ContractCreated { address, reg_id });
        Ok(())
    }

    fn put_contract_data(
        &mut self,
        contract: &Address,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<(), LedgerError> {
        if !self.contracts.contains_key(contract) {
            return Err(LedgerError::ContractNotFound(*contract));
        }
        let previous = self.contract_data.insert((*contract, key.clone()), value);
        self.journal.push(Undo::ContractData {
            contract: *contract,
            key,
            previous,
        });
        Ok(())
    }
}
