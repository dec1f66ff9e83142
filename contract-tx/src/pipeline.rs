//! Block-level orchestration of the validate/execute lifecycle.
//!
//! The [`BlockProcessor`] wires together:
//!
//! - a [`TxValidator`] deciding which transactions may enter the block,
//! - an [`Executor`] applying them in order to one [`LedgerCache`],
//! - optional [`TxMetrics`].
//!
//! Only included transactions consume an in-block index. A transaction
//! whose contract call failed is still included: its fee pays for the
//! attempt.

use crate::codec;
use crate::error::{CodecError, ExecutionError, ValidationError};
use crate::execution::{Executor, Receipt};
use crate::ledger::{LedgerCache, LedgerView};
use crate::metrics::TxMetrics;
use crate::types::{ContractTx, TxDigest, TxType};
use crate::validation::TxValidator;
use crate::vm::ContractVm;

/// Why a transaction was left out of the block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Validation rejected it; the ledger was not touched.
    Invalid(ValidationError),
    /// Execution failed and was rolled back entirely.
    ExecutionFailed(ExecutionError),
    /// Every in-block index is taken.
    BlockFull,
}

/// Result of processing one transaction of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    Applied(Receipt),
    /// Included at `index`; only the fee was charged.
    FailedWithFee {
        tx_digest: TxDigest,
        index: u16,
        error: ExecutionError,
    },
    Excluded {
        tx_digest: TxDigest,
        reason: ExclusionReason,
    },
}

impl TxOutcome {
    pub fn is_included(&self) -> bool {
        !matches!(self, TxOutcome::Excluded { .. })
    }
}

/// Outcomes of a block, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockOutcome {
    pub height: u32,
    pub outcomes: Vec<TxOutcome>,
}

impl BlockOutcome {
    /// Number of transactions that occupy an index in the block.
    pub fn included(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_included()).count()
    }

    pub fn receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.outcomes.iter().filter_map(|o| match o {
            TxOutcome::Applied(r) => Some(r),
            _ => None,
        })
    }
}

/// Drives validation and execution for the transactions of a block.
///
/// This struct is generic over:
///
/// - `V`: validator implementing [`TxValidator`],
/// - `M`: contract VM implementing [`ContractVm`].
pub struct BlockProcessor<V, M> {
    validator: V,
    executor: Executor<M>,
    metrics: Option<TxMetrics>,
}

impl<V, M> BlockProcessor<V, M>
where
    V: TxValidator,
    M: ContractVm,
{
    pub fn new(validator: V, executor: Executor<M>) -> Self {
        Self {
            validator,
            executor,
            metrics: None,
        }
    }

    /// Records outcomes into `metrics`.
    pub fn with_metrics(mut self, metrics: TxMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn executor(&self) -> &Executor<M> {
        &self.executor
    }

    /// Decodes a transaction received with its type tag, then validates it.
    ///
    /// Decoding failures are reported as
    /// [`ValidationError::MalformedEncoding`] before any ledger rule runs.
    /// The returned transaction has its digest cached.
    pub fn check_encoded<L: LedgerView>(
        &self,
        tag: u8,
        bytes: &[u8],
        height: u32,
        view: &L,
    ) -> Result<ContractTx, ValidationError> {
        let tx_type = TxType::from_u8(tag).ok_or(CodecError::UnknownDiscriminant {
            field: "tx type",
            value: u64::from(tag),
        })?;
        let mut tx = codec::decode(tx_type, bytes)?;
        tx.digest(false);

        self.check(&tx, height, view)?;
        Ok(tx)
    }

    /// Validates `tx` at `height`, recording the result in metrics.
    pub fn check<L: LedgerView>(
        &self,
        tx: &ContractTx,
        height: u32,
        view: &L,
    ) -> Result<(), ValidationError> {
        if let Some(m) = &self.metrics {
            m.checked.inc();
        }
        let result = self.validator.check(tx, height, view);
        if let Err(err) = &result {
            if let Some(m) = &self.metrics {
                m.rejected.with_label_values(&[err.label()]).inc();
            }
        }
        result
    }

    /// Validates and executes `txs` in order as the block at `height`.
    pub fn process_block<C: LedgerCache>(
        &self,
        txs: &[ContractTx],
        height: u32,
        cache: &mut C,
    ) -> BlockOutcome {
        let mut next_index: u32 = 0;
        let mut outcomes = Vec::with_capacity(txs.len());

        for tx in txs {
            let outcome = self.process_tx(tx, height, next_index, cache);
            if outcome.is_included() {
                next_index += 1;
            }
            outcomes.push(outcome);
        }

        let outcome = BlockOutcome { height, outcomes };
        tracing::info!(
            height,
            total = txs.len(),
            included = outcome.included(),
            applied = outcome.receipts().count(),
            "processed contract transactions"
        );
        outcome
    }

    fn process_tx<C: LedgerCache>(
        &self,
        tx: &ContractTx,
        height: u32,
        next_index: u32,
        cache: &mut C,
    ) -> TxOutcome {
        let tx_digest = tx.txid();

        if let Err(err) = self.check(tx, height, &*cache) {
            tracing::debug!(tx = %tx_digest, height, reason = err.label(), "excluded transaction");
            return TxOutcome::Excluded {
                tx_digest,
                reason: ExclusionReason::Invalid(err),
            };
        }

        let Ok(index) = u16::try_from(next_index) else {
            tracing::warn!(tx = %tx_digest, height, "block has no free index");
            return TxOutcome::Excluded {
                tx_digest,
                reason: ExclusionReason::BlockFull,
            };
        };

        match self.executor.execute(tx, height, index, cache) {
            Ok(receipt) => {
                if let Some(m) = &self.metrics {
                    m.applied.inc();
                    if let Some(fuel) = receipt.fuel {
                        m.deploy_fuel.observe(fuel as f64);
                    }
                }
                tracing::debug!(tx = %tx_digest, height, index, "applied transaction");
                TxOutcome::Applied(receipt)
            }
            Err(error) => {
                if let Some(m) = &self.metrics {
                    m.failed.with_label_values(&[error.label()]).inc();
                }
                if matches!(error, ExecutionError::ContractExecutionFailed { .. }) {
                    TxOutcome::FailedWithFee {
                        tx_digest,
                        index,
                        error,
                    }
                } else {
                    tracing::warn!(
                        tx = %tx_digest,
                        height,
                        reason = error.label(),
                        error = %error,
                        "execution failed, transaction excluded"
                    );
                    TxOutcome::Excluded {
                        tx_digest,
                        reason: ExclusionReason::ExecutionFailed(error),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use ed25519_dalek::SigningKey;

    use super::*;
    use crate::config::ProtocolConfig;
    use crate::crypto::{public_key_of, sign_digest};
    use crate::ledger::{Account, ContractRecord, MemLedger};
    use crate::metrics::MetricsRegistry;
    use crate::types::{
        ADDRESS_LEN, Address, ContractPayload, LegacyContract, RegId, TokenSymbol,
    };
    use crate::validation::ContractTxValidity;
    use crate::vm::AcceptAllVm;

    fn symbol(s: &str) -> TokenSymbol {
        TokenSymbol::new(s).expect("valid symbol")
    }

    fn dummy_key() -> SigningKey {
        SigningKey::from_bytes(&[3u8; 32])
    }

    fn dummy_ledger() -> MemLedger {
        let mut ledger = MemLedger::new();
        ledger
            .insert_account(
                Account::new(Address::from_public_key(&public_key_of(&dummy_key())))
                    .with_reg_id(RegId::new(10, 2))
                    .with_owner_pubkey(public_key_of(&dummy_key()))
                    .with_balance(symbol("WICC"), 5_000_000),
            )
            .expect("insert sender");
        ledger
            .create_contract(ContractRecord {
                address: Address([0xC0; ADDRESS_LEN]),
                reg_id: RegId::new(3, 0),
                owner: Address([0xC1; ADDRESS_LEN]),
                payload: ContractPayload::Legacy(LegacyContract::new(vec![1], Vec::new())),
                deployed_height: 3,
            })
            .expect("create contract");
        ledger.commit();
        ledger
    }

    fn dummy_processor() -> BlockProcessor<ContractTxValidity<BTreeSet<TokenSymbol>>, AcceptAllVm>
    {
        let cfg = ProtocolConfig::default();
        let symbols = [symbol("WICC")].into_iter().collect();
        BlockProcessor::new(
            ContractTxValidity::new(&cfg, symbols),
            Executor::new(&cfg, AcceptAllVm),
        )
    }

    fn signed_invoke(valid_height: u32) -> ContractTx {
        let mut tx = ContractTx::legacy_invoke(
            RegId::new(10, 2).into(),
            RegId::new(3, 0).into(),
            1_000,
            10,
            valid_height,
            Vec::new(),
        )
        .expect("valid transaction");
        let digest = tx.digest(false);
        tx.set_signature(sign_digest(&dummy_key(), &digest));
        tx
    }

    #[test]
    fn excluded_transactions_do_not_consume_an_index() {
        let mut ledger = dummy_ledger();
        let txs = vec![signed_invoke(100), signed_invoke(10), signed_invoke(100)];

        let outcome = dummy_processor().process_block(&txs, 50, &mut ledger);

        assert_eq!(outcome.included(), 2);
        let indices: Vec<u16> = outcome.receipts().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);
        match &outcome.outcomes[1] {
            TxOutcome::Excluded {
                reason: ExclusionReason::Invalid(err),
                ..
            } => assert_eq!(err.label(), "expired"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn check_encoded_reports_malformed_bytes() {
        let ledger = dummy_ledger();
        let processor = dummy_processor();

        let err = processor.check_encoded(99, &[], 1, &ledger).unwrap_err();
        assert_eq!(err.label(), "malformed_encoding");

        let tx = signed_invoke(100);
        let mut bytes = codec::encode(&tx);
        bytes.push(0);
        let err = processor
            .check_encoded(TxType::LegacyInvoke as u8, &bytes, 1, &ledger)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedEncoding(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn check_encoded_returns_decoded_transaction() {
        let ledger = dummy_ledger();
        let tx = signed_invoke(100);
        let bytes = codec::encode(&tx);

        let decoded = dummy_processor()
            .check_encoded(TxType::LegacyInvoke as u8, &bytes, 1, &ledger)
            .expect("valid transaction");
        assert_eq!(decoded, tx);
        assert_eq!(decoded.cached_digest(), Some(tx.compute_digest()));
    }

    #[test]
    fn metrics_follow_outcomes() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        let processor = dummy_processor().with_metrics(registry.tx.clone());
        let mut ledger = dummy_ledger();

        processor.process_block(&[signed_invoke(100), signed_invoke(10)], 50, &mut ledger);

        assert_eq!(registry.tx.checked.get(), 2);
        assert_eq!(registry.tx.applied.get(), 1);
        assert_eq!(
            registry.tx.rejected.with_label_values(&["expired"]).get(),
            1
        );
    }
}
