//! Signing digest of contract transactions.
//!
//! The digest is `SHA256(SHA256(stream))` where `stream` is
//! `version ‖ type tag ‖ valid_height ‖ sender` followed by the variant's
//! fields in a fixed order (which is not the wire order):
//!
//! | variant          | fields after `sender`                                             |
//! |------------------|-------------------------------------------------------------------|
//! | legacy deploy    | `contract, fees`                                                  |
//! | legacy invoke    | `app_uid, fees, transfer_amount, arguments`                       |
//! | universal deploy | `fees, fee_symbol, coin_symbol, coin_amount, contract`            |
//! | universal invoke | `app_uid, arguments, fees, fee_symbol, coin_symbol, coin_amount`  |
//!
//! The one-byte type tag separates the variants, so a signature over one
//! variant never verifies for another. The signature itself is never
//! hashed.
//!
//! Caching is explicit: [`ContractTx::digest`] fills the cache,
//! [`ContractTx::invalidate_digest`] clears it, and
//! [`ContractTx::compute_digest`] / [`ContractTx::txid`] never write it.

use crate::codec::Writer;
use crate::types::{ContractTx, ContractTxBody, Hash256, TxDigest};

impl ContractTx {
    /// Computes the digest from the current fields, ignoring the cache.
    pub fn compute_digest(&self) -> TxDigest {
        let mut w = Writer::new();
        let base = self.base();

        w.put_varint(u64::from(base.version))
            .put_u8(self.tx_type() as u8)
            .put_varint(u64::from(base.valid_height))
            .put(&base.sender);

        match self.body() {
            ContractTxBody::LegacyDeploy(b) => {
                w.put(&b.contract).put_varint(base.fees);
            }
            ContractTxBody::LegacyInvoke(b) => {
                w.put(&b.app_uid)
                    .put_varint(base.fees)
                    .put_varint(b.transfer_amount)
                    .put_bytes(&b.arguments);
            }
            ContractTxBody::UniversalDeploy(b) => {
                w.put_varint(base.fees)
                    .put(&b.fee_symbol)
                    .put(&b.coin_symbol)
                    .put_varint(b.coin_amount)
                    .put(&b.contract);
            }
            ContractTxBody::UniversalInvoke(b) => {
                w.put(&b.app_uid)
                    .put_bytes(&b.arguments)
                    .put_varint(base.fees)
                    .put(&b.fee_symbol)
                    .put(&b.coin_symbol)
                    .put_varint(b.coin_amount);
            }
        }

        let digest = TxDigest(Hash256::double_sha256(w.as_bytes()));
        tracing::trace!(tx = %digest, tx_type = %self.tx_type(), "computed signing digest");
        digest
    }

    /// Returns the cached digest, computing and caching it if absent or if
    /// `force_recompute` is set.
    pub fn digest(&mut self, force_recompute: bool) -> TxDigest {
        if !force_recompute {
            if let Some(d) = self.cached_digest {
                return d;
            }
        }
        let d = self.compute_digest();
        self.cached_digest = Some(d);
        d
    }

    pub fn cached_digest(&self) -> Option<TxDigest> {
        self.cached_digest
    }

    /// Drops the cached digest; the next [`ContractTx::digest`] recomputes.
    pub fn invalidate_digest(&mut self) {
        self.cached_digest = None;
    }

    /// Transaction id for read-only callers: the cached digest, or a fresh
    /// computation that is not stored.
    pub fn txid(&self) -> TxDigest {
        self.cached_digest.unwrap_or_else(|| self.compute_digest())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{
        ADDRESS_LEN, Address, ContractTx, ContractTxBody, LegacyContract, LegacyInvokeTx, RegId,
        Signature, TokenSymbol, TxBase, UniversalInvokeTx, UserId,
    };

    fn symbol(s: &str) -> TokenSymbol {
        TokenSymbol::new(s).expect("valid symbol")
    }

    fn dummy_base() -> TxBase {
        TxBase::new(RegId::new(10, 2).into(), 500, 1_000)
    }

    fn dummy_legacy_invoke() -> ContractTx {
        ContractTx::new(
            dummy_base(),
            ContractTxBody::LegacyInvoke(LegacyInvokeTx {
                app_uid: RegId::new(3, 0).into(),
                transfer_amount: 25,
                arguments: b"ping".to_vec(),
            }),
        )
        .expect("valid transaction")
    }

    #[test]
    fn digest_is_deterministic() {
        let mut tx = dummy_legacy_invoke();
        let a = tx.digest(false);
        let b = tx.digest(false);
        let c = tx.clone().digest(true);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, tx.compute_digest());
    }

    #[test]
    fn signature_does_not_affect_digest() {
        let unsigned = dummy_legacy_invoke();
        let signed = unsigned.clone().with_signature(Signature(vec![0xff; 64]));
        assert_eq!(unsigned.compute_digest(), signed.compute_digest());
    }

    #[test]
    fn every_signed_field_changes_the_digest() {
        let reference = dummy_legacy_invoke().compute_digest();

        let mut variants = Vec::new();
        let mut base = dummy_base();
        base.version = 2;
        variants.push(base);
        let mut base = dummy_base();
        base.valid_height += 1;
        variants.push(base);
        let mut base = dummy_base();
        base.fees += 1;
        variants.push(base);
        let mut base = dummy_base();
        base.sender = UserId::Address(Address([1u8; ADDRESS_LEN]));
        variants.push(base);

        for base in variants {
            let tx = ContractTx::new(base.clone(), dummy_legacy_invoke().body().clone())
                .expect("valid transaction");
            assert_ne!(tx.compute_digest(), reference, "{base:?} did not change the digest");
        }

        let tx = ContractTx::legacy_invoke(
            RegId::new(10, 2).into(),
            RegId::new(3, 0).into(),
            1_000,
            25,
            500,
            b"pong".to_vec(),
        )
        .expect("valid transaction");
        assert_ne!(tx.compute_digest(), reference);
    }

    #[test]
    fn variants_with_identical_shared_fields_are_domain_separated() {
        let legacy = ContractTx::new(
            dummy_base(),
            ContractTxBody::LegacyInvoke(LegacyInvokeTx {
                app_uid: RegId::new(3, 0).into(),
                transfer_amount: 0,
                arguments: Vec::new(),
            }),
        )
        .expect("valid transaction");
        let universal = ContractTx::new(
            dummy_base(),
            ContractTxBody::UniversalInvoke(UniversalInvokeTx {
                app_uid: RegId::new(3, 0).into(),
                arguments: Vec::new(),
                fee_symbol: symbol("WICC"),
                coin_symbol: symbol("WICC"),
                coin_amount: 0,
            }),
        )
        .expect("valid transaction");
        let deploy = ContractTx::legacy_deploy(
            RegId::new(10, 2).into(),
            500,
            1_000,
            LegacyContract::new(Vec::new(), Vec::new()),
        )
        .expect("valid transaction");

        let digests = [
            legacy.compute_digest(),
            universal.compute_digest(),
            deploy.compute_digest(),
        ];
        assert_ne!(digests[0], digests[1]);
        assert_ne!(digests[0], digests[2]);
        assert_ne!(digests[1], digests[2]);
    }

    #[test]
    fn cache_survives_signature_changes_until_forced() {
        let mut tx = dummy_legacy_invoke();
        assert_eq!(tx.cached_digest(), None);

        let first = tx.digest(false);
        assert_eq!(tx.cached_digest(), Some(first));

        tx.set_signature(Signature(vec![1, 2, 3]));
        assert_eq!(tx.digest(false), first);
        assert_eq!(tx.digest(true), first);
    }

    #[test]
    fn invalidate_clears_cache_and_txid_does_not_fill_it() {
        let mut tx = dummy_legacy_invoke();
        let d = tx.digest(false);

        tx.invalidate_digest();
        assert_eq!(tx.cached_digest(), None);

        assert_eq!(tx.txid(), d);
        assert_eq!(tx.cached_digest(), None);
    }

    #[test]
    fn stale_cache_is_returned_until_forced() {
        let mut tx = dummy_legacy_invoke();
        tx.cached_digest = Some(crate::types::TxDigest(crate::types::Hash256([7u8; 32])));
        assert_eq!(tx.digest(false).0.0, [7u8; 32]);
        assert_eq!(tx.digest(true), tx.compute_digest());
    }
}
