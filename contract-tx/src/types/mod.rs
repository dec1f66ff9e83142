//! Core domain types for contract transactions.
//!
//! This module defines strongly-typed hashes, account identities, token
//! symbols and signature material shared by the codec, the digest engine
//! and the validation/execution stages. As elsewhere in the crate, public
//! APIs take domain newtypes instead of naked byte buffers.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ConstructionError;

/// Contract payload types (legacy and universal).
pub mod contract;
/// The four contract transaction variants.
pub mod tx;

pub use contract::{ContractPayload, LegacyContract, UniversalContract, VmType};
pub use tx::{
    ContractTx, ContractTxBody, LegacyDeployTx, LegacyInvokeTx, TxBase, TxType, UniversalDeployTx,
    UniversalInvokeTx,
};

/// Length in bytes of all 256-bit hash types used in this module.
pub const HASH_LEN: usize = 32;

/// Length in bytes of an account [`Address`].
pub const ADDRESS_LEN: usize = 20;

/// Strongly-typed 256-bit hash wrapper.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// Computes the BLAKE3-256 hash of `data`.
    ///
    /// Used for identifiers derived locally (addresses, contract ids);
    /// never for the signing digest.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }

    /// Computes `SHA256(SHA256(data))`, the hash behind the signing digest.
    pub fn double_sha256(data: &[u8]) -> Self {
        let first = Sha256::digest(data);
        let second = Sha256::digest(first);
        Hash256(second.into())
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Signing digest of a contract transaction.
///
/// The same value is signed by the sender and used as the transaction's
/// on-chain identifier; there is no separate id computation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxDigest(pub Hash256);

impl TxDigest {
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        self.0.as_bytes()
    }
}

impl fmt::Display for TxDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Canonical account identity: a 160-bit hash of the owner key.
///
/// Contract accounts use the same address space; their address is derived
/// from the deploying transaction instead of a key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Derives the address owned by `public_key`.
    ///
    /// The caller must pass the canonical 32-byte ed25519 encoding; other
    /// encodings of the same key map to different addresses.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let h = Hash256::compute(public_key.as_bytes());
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&h.0[..ADDRESS_LEN]);
        Address(out)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Registration id: a compact, ledger-assigned alias for an account.
///
/// It records the block height and in-block index of the transaction that
/// registered the account. `0-0` is the empty id and never names an account.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RegId {
    pub height: u32,
    pub index: u16,
}

impl RegId {
    pub fn new(height: u32, index: u16) -> Self {
        Self { height, index }
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 && self.index == 0
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.height, self.index)
    }
}

/// Identity of an account as written in a transaction.
///
/// Either form resolves to a canonical [`Address`] through the ledger
/// (see [`crate::ledger::LedgerView::resolve_address`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum UserId {
    RegId(RegId),
    Address(Address),
}

impl UserId {
    /// Returns `true` for the empty registration id, which no transaction
    /// may carry.
    pub fn is_empty_reg_id(&self) -> bool {
        matches!(self, UserId::RegId(r) if r.is_empty())
    }
}

impl From<RegId> for UserId {
    fn from(r: RegId) -> Self {
        UserId::RegId(r)
    }
}

impl From<Address> for UserId {
    fn from(a: Address) -> Self {
        UserId::Address(a)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::RegId(r) => write!(f, "regid:{r}"),
            UserId::Address(a) => write!(f, "addr:{a}"),
        }
    }
}

/// Longest accepted token ticker.
pub const MAX_SYMBOL_LEN: usize = 12;

/// Token ticker such as `WICC` or `WUSD`.
///
/// Always 1 to [`MAX_SYMBOL_LEN`] ASCII uppercase letters or digits; the
/// constructor, the decoder and serde all enforce this.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenSymbol(String);

impl TokenSymbol {
    pub fn new(symbol: impl Into<String>) -> Result<Self, ConstructionError> {
        let symbol = symbol.into();
        let reason = if symbol.is_empty() {
            Some("empty")
        } else if symbol.len() > MAX_SYMBOL_LEN {
            Some("too long")
        } else if !symbol
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            Some("only A-Z and 0-9 are allowed")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConstructionError::InvalidSymbol { symbol, reason }),
            None => Ok(TokenSymbol(symbol)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TokenSymbol {
    type Error = ConstructionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        TokenSymbol::new(s)
    }
}

impl From<TokenSymbol> for String {
    fn from(s: TokenSymbol) -> Self {
        s.0
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ed25519 public key bytes, wrapped to avoid naked `Vec<u8>`.
///
/// Not validated on construction; verification rejects keys that are not
/// 32 bytes or not on the curve.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublicKey(pub Vec<u8>);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Detached signature over a transaction's signing digest.
///
/// Empty until the transaction is signed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
