//! Validity rules for contract transactions.
//!
//! The rules run in a fixed order and the first failure wins:
//!
//! 1. expiry: `height <= valid_height`,
//! 2. sender: a registration id must resolve; an address is always accepted,
//! 3. signature over the signing digest with the sender's recorded key,
//! 4. minimum fee for the type, then balances for fees and value,
//! 5. invoke variants: target contract exists, arguments within limits,
//! 6. deploy variants: non-empty code, payload and memo within limits,
//! 7. universal variants: fee and coin symbols are registered.

use crate::config::{ContractLimits, MinFees, ProtocolConfig};
use crate::crypto::verify_digest;
use crate::error::ValidationError;
use crate::ledger::{LedgerView, SymbolRegistry};
use crate::types::{Address, ContractTx, ContractTxBody, TokenSymbol, UserId};
use crate::validation::TxValidator;

/// Rule set for the four contract transaction variants.
///
/// Configured from [`ProtocolConfig`]; `R` supplies the registered token
/// symbols for universal variants.
#[derive(Clone, Debug)]
pub struct ContractTxValidity<R> {
    base_symbol: TokenSymbol,
    limits: ContractLimits,
    min_fees: MinFees,
    symbols: R,
}

impl<R: SymbolRegistry> ContractTxValidity<R> {
    pub fn new(cfg: &ProtocolConfig, symbols: R) -> Self {
        Self {
            base_symbol: cfg.base_symbol.clone(),
            limits: cfg.limits.clone(),
            min_fees: cfg.min_fees.clone(),
            symbols,
        }
    }

    fn check_expiry(&self, tx: &ContractTx, height: u32) -> Result<(), ValidationError> {
        if height > tx.valid_height() {
            return Err(ValidationError::Expired {
                valid_height: tx.valid_height(),
                height,
            });
        }
        Ok(())
    }

    fn check_sender<L: LedgerView>(
        &self,
        tx: &ContractTx,
        view: &L,
    ) -> Result<Address, ValidationError> {
        match tx.sender() {
            // A fresh account's first transaction names it by address.
            UserId::Address(address) => Ok(*address),
            id @ UserId::RegId(_) => view
                .resolve_address(id)?
                .ok_or(ValidationError::UnknownSender(*id)),
        }
    }

    fn check_signature<L: LedgerView>(
        &self,
        tx: &ContractTx,
        sender: &Address,
        view: &L,
    ) -> Result<(), ValidationError> {
        if tx.signature().is_empty() {
            return Err(ValidationError::BadSignature);
        }
        let key = view
            .owner_pubkey(sender)?
            .ok_or(ValidationError::BadSignature)?;
        if !verify_digest(&key, tx.signature(), &tx.txid()) {
            return Err(ValidationError::BadSignature);
        }
        Ok(())
    }

    fn check_funds<L: LedgerView>(
        &self,
        tx: &ContractTx,
        sender: &Address,
        view: &L,
    ) -> Result<(), ValidationError> {
        let min = self.min_fees.for_type(tx.tx_type());
        if tx.fees() < min {
            return Err(ValidationError::FeeBelowMinimum {
                tx_type: tx.tx_type(),
                fees: tx.fees(),
                min,
            });
        }

        let fee_symbol = tx.fee_symbol(&self.base_symbol);
        let (coin_symbol, amount) = tx.values(&self.base_symbol);

        if fee_symbol == coin_symbol {
            let required = u128::from(tx.fees()) + u128::from(amount);
            return self.require_balance(view, sender, fee_symbol, required);
        }
        self.require_balance(view, sender, fee_symbol, u128::from(tx.fees()))?;
        self.require_balance(view, sender, coin_symbol, u128::from(amount))
    }

    fn require_balance<L: LedgerView>(
        &self,
        view: &L,
        sender: &Address,
        symbol: &TokenSymbol,
        required: u128,
    ) -> Result<(), ValidationError> {
        let available = view.balance(sender, symbol)?;
        if u128::from(available) < required {
            return Err(ValidationError::InsufficientFunds {
                symbol: symbol.clone(),
                available,
                required,
            });
        }
        Ok(())
    }

    fn check_invoke<L: LedgerView>(
        &self,
        app_uid: &UserId,
        arguments: &[u8],
        view: &L,
    ) -> Result<(), ValidationError> {
        let deployed = match view.resolve_address(app_uid)? {
            Some(address) => view.contract(&address)?.is_some(),
            None => false,
        };
        if !deployed {
            return Err(ValidationError::UnknownContract(*app_uid));
        }

        if arguments.len() > self.limits.max_arguments_size {
            return Err(ValidationError::ArgumentsTooLarge {
                size: arguments.len(),
                max: self.limits.max_arguments_size,
            });
        }
        Ok(())
    }

    fn check_deploy(
        &self,
        code: &[u8],
        memo: &[u8],
        payload_size: usize,
    ) -> Result<(), ValidationError> {
        if code.is_empty() {
            return Err(ValidationError::EmptyContract);
        }
        if memo.len() > self.limits.max_memo_size {
            return Err(ValidationError::ContractTooLarge {
                size: memo.len(),
                max: self.limits.max_memo_size,
            });
        }
        if payload_size > self.limits.max_contract_size {
            return Err(ValidationError::ContractTooLarge {
                size: payload_size,
                max: self.limits.max_contract_size,
            });
        }
        Ok(())
    }

    fn check_symbols(&self, symbols: [&TokenSymbol; 2]) -> Result<(), ValidationError> {
        for symbol in symbols {
            if !self.symbols.is_registered(symbol) {
                return Err(ValidationError::UnknownSymbol(symbol.clone()));
            }
        }
        Ok(())
    }
}

impl<R: SymbolRegistry> TxValidator for ContractTxValidity<R> {
    fn check<L: LedgerView>(
        &self,
        tx: &ContractTx,
        height: u32,
        view: &L,
    ) -> Result<(), ValidationError> {
        self.check_expiry(tx, height)?;
        let sender = self.check_sender(tx, view)?;
        self.check_signature(tx, &sender, view)?;
        self.check_funds(tx, &sender, view)?;

        match tx.body() {
            ContractTxBody::LegacyDeploy(b) => {
                let c = &b.contract;
                self.check_deploy(&c.code, &c.memo, c.payload_size())?;
            }
            ContractTxBody::LegacyInvoke(b) => {
                self.check_invoke(&b.app_uid, &b.arguments, view)?;
            }
            ContractTxBody::UniversalDeploy(b) => {
                let c = &b.contract;
                self.check_deploy(&c.code, &c.memo, c.payload_size())?;
                self.check_symbols([&b.fee_symbol, &b.coin_symbol])?;
            }
            ContractTxBody::UniversalInvoke(b) => {
                self.check_invoke(&b.app_uid, &b.arguments, view)?;
                self.check_symbols([&b.fee_symbol, &b.coin_symbol])?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use ed25519_dalek::SigningKey;

    use super::*;
    use crate::crypto::{public_key_of, sign_digest};
    use crate::ledger::{Account, ContractRecord, LedgerCache, MemLedger};
    use crate::types::{
        ADDRESS_LEN, ContractPayload, LegacyContract, RegId, Signature, UniversalContract, VmType,
    };

    fn symbol(s: &str) -> TokenSymbol {
        TokenSymbol::new(s).expect("valid symbol")
    }

    fn dummy_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn sender_address() -> Address {
        Address::from_public_key(&public_key_of(&dummy_key()))
    }

    fn contract_address() -> Address {
        Address([0xC0; ADDRESS_LEN])
    }

    fn sender_id() -> UserId {
        RegId::new(10, 2).into()
    }

    fn contract_id() -> UserId {
        RegId::new(3, 0).into()
    }

    fn dummy_ledger() -> MemLedger {
        let mut ledger = MemLedger::new();
        ledger
            .insert_account(
                Account::new(sender_address())
                    .with_reg_id(RegId::new(10, 2))
                    .with_owner_pubkey(public_key_of(&dummy_key()))
                    .with_balance(symbol("WICC"), 10_000_000)
                    .with_balance(symbol("WUSD"), 5_000),
            )
            .expect("insert sender");
        ledger
            .create_contract(ContractRecord {
                address: contract_address(),
                reg_id: RegId::new(3, 0),
                owner: sender_address(),
                payload: ContractPayload::Legacy(LegacyContract::new(vec![1], Vec::new())),
                deployed_height: 3,
            })
            .expect("create contract");
        ledger.commit();
        ledger
    }

    fn dummy_validator() -> ContractTxValidity<BTreeSet<TokenSymbol>> {
        let symbols = [symbol("WICC"), symbol("WUSD")].into_iter().collect();
        ContractTxValidity::new(&ProtocolConfig::default(), symbols)
    }

    fn signed(mut tx: ContractTx) -> ContractTx {
        let digest = tx.digest(false);
        tx.set_signature(sign_digest(&dummy_key(), &digest));
        tx
    }

    fn legacy_invoke(fees: u64, transfer: u64, arguments: Vec<u8>) -> ContractTx {
        signed(
            ContractTx::legacy_invoke(sender_id(), contract_id(), fees, transfer, 100, arguments)
                .expect("valid transaction"),
        )
    }

    fn universal_invoke(fee_symbol: &str, coin_symbol: &str, coin_amount: u64) -> ContractTx {
        signed(
            ContractTx::universal_invoke(
                sender_id(),
                100,
                1_000,
                contract_id(),
                Vec::new(),
                symbol(fee_symbol),
                symbol(coin_symbol),
                coin_amount,
            )
            .expect("valid transaction"),
        )
    }

    fn legacy_deploy(code: Vec<u8>, memo: Vec<u8>) -> ContractTx {
        signed(
            ContractTx::legacy_deploy(sender_id(), 100, 1_000_000, LegacyContract::new(code, memo))
                .expect("valid transaction"),
        )
    }

    #[test]
    fn signed_invoke_is_accepted_without_touching_the_ledger() {
        let ledger = dummy_ledger();
        let before = ledger.snapshot();

        dummy_validator()
            .check(&legacy_invoke(1_000, 500, b"call".to_vec()), 100, &ledger)
            .expect("valid transaction");

        assert_eq!(ledger.snapshot(), before);
        assert_eq!(ledger.journal_len(), 0);
    }

    #[test]
    fn expired_transaction_is_rejected() {
        let ledger = dummy_ledger();
        let tx = legacy_invoke(1_000, 0, Vec::new());

        let err = dummy_validator().check(&tx, 101, &ledger).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Expired {
                valid_height: 100,
                height: 101
            }
        );
    }

    #[test]
    fn failed_check_has_no_side_effects() {
        let ledger = dummy_ledger();
        let before = ledger.snapshot();

        let tx = legacy_invoke(1_000, 20_000_000, Vec::new());
        let err = dummy_validator().check(&tx, 50, &ledger).unwrap_err();
        assert_eq!(err.label(), "insufficient_funds");
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn unknown_reg_id_sender_is_rejected() {
        let tx = signed(
            ContractTx::legacy_invoke(
                RegId::new(99, 9).into(),
                contract_id(),
                1_000,
                0,
                100,
                Vec::new(),
            )
            .expect("valid transaction"),
        );
        let err = dummy_validator().check(&tx, 1, &dummy_ledger()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownSender(RegId::new(99, 9).into()));
    }

    #[test]
    fn fresh_address_sender_cannot_verify() {
        let tx = ContractTx::legacy_invoke(
            Address([0x55; ADDRESS_LEN]).into(),
            contract_id(),
            1_000,
            0,
            100,
            Vec::new(),
        )
        .expect("valid transaction")
        .with_signature(Signature(vec![1u8; 64]));

        let err = dummy_validator().check(&tx, 1, &dummy_ledger()).unwrap_err();
        assert_eq!(err, ValidationError::BadSignature);
    }

    #[test]
    fn address_sender_with_registered_key_is_accepted() {
        let tx = signed(
            ContractTx::legacy_invoke(
                sender_address().into(),
                contract_id(),
                1_000,
                0,
                100,
                Vec::new(),
            )
            .expect("valid transaction"),
        );
        assert_eq!(dummy_validator().check(&tx, 1, &dummy_ledger()), Ok(()));
    }

    #[test]
    fn missing_or_foreign_signature_is_rejected() {
        let ledger = dummy_ledger();
        let unsigned = ContractTx::legacy_invoke(sender_id(), contract_id(), 1_000, 0, 100, Vec::new())
            .expect("valid transaction");
        assert_eq!(
            dummy_validator().check(&unsigned, 1, &ledger),
            Err(ValidationError::BadSignature)
        );

        let mut foreign = unsigned.clone();
        let digest = foreign.digest(false);
        foreign.set_signature(sign_digest(&SigningKey::from_bytes(&[8u8; 32]), &digest));
        assert_eq!(
            dummy_validator().check(&foreign, 1, &ledger),
            Err(ValidationError::BadSignature)
        );
    }

    #[test]
    fn fee_below_minimum_is_rejected() {
        let err = dummy_validator()
            .check(&legacy_invoke(999, 0, Vec::new()), 1, &dummy_ledger())
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::FeeBelowMinimum {
                fees: 999,
                min: 1_000,
                ..
            }
        ));
    }

    #[test]
    fn fees_plus_value_overflow_counts_as_insufficient() {
        let err = dummy_validator()
            .check(&legacy_invoke(u64::MAX, 1, Vec::new()), 1, &dummy_ledger())
            .unwrap_err();
        match err {
            ValidationError::InsufficientFunds { required, .. } => {
                assert_eq!(required, u128::from(u64::MAX) + 1);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn separate_coin_token_is_checked_on_its_own() {
        let ledger = dummy_ledger();
        assert_eq!(
            dummy_validator().check(&universal_invoke("WICC", "WUSD", 5_000), 1, &ledger),
            Ok(())
        );

        let err = dummy_validator()
            .check(&universal_invoke("WICC", "WUSD", 5_001), 1, &ledger)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientFunds {
                symbol: symbol("WUSD"),
                available: 5_000,
                required: 5_001
            }
        );
    }

    #[test]
    fn unknown_contract_is_rejected() {
        let tx = signed(
            ContractTx::legacy_invoke(sender_id(), RegId::new(4, 4).into(), 1_000, 0, 100, Vec::new())
                .expect("valid transaction"),
        );
        let err = dummy_validator().check(&tx, 1, &dummy_ledger()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownContract(RegId::new(4, 4).into()));

        // The sender account exists but holds no contract.
        let tx = signed(
            ContractTx::legacy_invoke(sender_id(), sender_id(), 1_000, 0, 100, Vec::new())
                .expect("valid transaction"),
        );
        let err = dummy_validator().check(&tx, 1, &dummy_ledger()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownContract(sender_id()));
    }

    #[test]
    fn oversized_arguments_are_rejected() {
        let err = dummy_validator()
            .check(&legacy_invoke(1_000, 0, vec![0u8; 4_097]), 1, &dummy_ledger())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ArgumentsTooLarge {
                size: 4_097,
                max: 4_096
            }
        );
    }

    #[test]
    fn deploy_payload_rules() {
        let ledger = dummy_ledger();
        let v = dummy_validator();

        assert_eq!(v.check(&legacy_deploy(vec![1; 10], b"memo".to_vec()), 1, &ledger), Ok(()));
        assert_eq!(
            v.check(&legacy_deploy(Vec::new(), Vec::new()), 1, &ledger),
            Err(ValidationError::EmptyContract)
        );
        assert_eq!(
            v.check(&legacy_deploy(vec![1], vec![0; 101]), 1, &ledger),
            Err(ValidationError::ContractTooLarge {
                size: 101,
                max: 100
            })
        );
        assert_eq!(
            v.check(&legacy_deploy(vec![1; 65_537], Vec::new()), 1, &ledger),
            Err(ValidationError::ContractTooLarge {
                size: 65_537,
                max: 65_536
            })
        );
    }

    #[test]
    fn universal_deploy_counts_abi_in_payload_size() {
        let contract = UniversalContract {
            vm_type: VmType::WasmVm,
            upgradable: false,
            code: vec![1; 65_000],
            memo: Vec::new(),
            abi: vec![2; 1_000],
        };
        let tx = signed(
            ContractTx::universal_deploy(
                sender_id(),
                100,
                1_000_000,
                symbol("WICC"),
                symbol("WICC"),
                0,
                contract,
            )
            .expect("valid transaction"),
        );
        let err = dummy_validator().check(&tx, 1, &dummy_ledger()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ContractTooLarge {
                size: 66_000,
                max: 65_536
            }
        );
    }

    #[test]
    fn unregistered_symbol_is_rejected() {
        let err = dummy_validator()
            .check(&universal_invoke("WICC", "WXYZ", 0), 1, &dummy_ledger())
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownSymbol(symbol("WXYZ")));
    }
}
