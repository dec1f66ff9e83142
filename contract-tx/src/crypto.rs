// contract-tx/src/crypto.rs

//! Ed25519 signing and verification over transaction digests.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

use crate::types::{PublicKey, Signature, TxDigest};

/// Verifies `signature` over `digest` with `public_key`.
///
/// Returns `false` on a malformed key or signature as well as on a
/// verification failure.
pub fn verify_digest(public_key: &PublicKey, signature: &Signature, digest: &TxDigest) -> bool {
    let key_array: [u8; 32] = match public_key.as_bytes().try_into() {
        Ok(arr) => arr,
        Err(_) => return false,
    };
    let key = match VerifyingKey::from_bytes(&key_array) {
        Ok(k) => k,
        Err(_) => return false,
    };

    let sig_array: [u8; 64] = match signature.as_bytes().try_into() {
        Ok(arr) => arr,
        Err(_) => return false,
    };
    let sig = ed25519_dalek::Signature::from_bytes(&sig_array);

    key.verify(digest.as_bytes(), &sig).is_ok()
}

/// Signs `digest` with `key`.
pub fn sign_digest(key: &SigningKey, digest: &TxDigest) -> Signature {
    Signature(key.sign(digest.as_bytes()).to_bytes().to_vec())
}

/// Public key of `key`, in the 32-byte form that [`verify_digest`] accepts.
pub fn public_key_of(key: &SigningKey) -> PublicKey {
    PublicKey(key.verifying_key().to_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HASH_LEN, Hash256};

    fn dummy_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn dummy_digest(byte: u8) -> TxDigest {
        TxDigest(Hash256([byte; HASH_LEN]))
    }

    #[test]
    fn sign_then_verify() {
        let key = dummy_key(7);
        let digest = dummy_digest(1);
        let sig = sign_digest(&key, &digest);
        assert_eq!(sig.as_bytes().len(), 64);
        assert!(verify_digest(&public_key_of(&key), &sig, &digest));
    }

    #[test]
    fn wrong_digest_or_key_fails() {
        let key = dummy_key(7);
        let sig = sign_digest(&key, &dummy_digest(1));
        assert!(!verify_digest(&public_key_of(&key), &sig, &dummy_digest(2)));
        assert!(!verify_digest(&public_key_of(&dummy_key(8)), &sig, &dummy_digest(1)));
    }

    #[test]
    fn malformed_material_fails_without_panicking() {
        let key = dummy_key(7);
        let digest = dummy_digest(1);
        let sig = sign_digest(&key, &digest);

        assert!(!verify_digest(&PublicKey(vec![1, 2, 3]), &sig, &digest));
        assert!(!verify_digest(&public_key_of(&key), &Signature::default(), &digest));

        let mut truncated = sig.clone();
        truncated.0.pop();
        assert!(!verify_digest(&public_key_of(&key), &truncated, &digest));
    }
}
