// contract-tx/src/types/tx.rs

//! Contract transaction types.
//!
//! A [`ContractTx`] is the shared [`TxBase`] fields plus one of four
//! variant payloads ([`ContractTxBody`]):
//!
//! - [`LegacyDeployTx`] / [`LegacyInvokeTx`]: legacy scripting contracts,
//!   fees and value in the protocol base token,
//! - [`UniversalDeployTx`] / [`UniversalInvokeTx`]: universal contracts with
//!   separate fee and coin token symbols.
//!
//! After construction a transaction only changes through
//! [`ContractTx::set_signature`] and the digest cache operations in
//! [`crate::digest`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{LegacyContract, Signature, TokenSymbol, TxDigest, UniversalContract, UserId};
use crate::error::ConstructionError;

/// Transaction version written by this implementation.
pub const CURRENT_TX_VERSION: u32 = 1;

/// One-byte transaction type tag.
///
/// The values are consensus constants: they are hashed into the signing
/// digest (domain separation between variants) and prefix framed encodings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxType {
    LegacyInvoke = 4,
    LegacyDeploy = 5,
    UniversalDeploy = 14,
    UniversalInvoke = 15,
}

impl TxType {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            4 => Some(TxType::LegacyInvoke),
            5 => Some(TxType::LegacyDeploy),
            14 => Some(TxType::UniversalDeploy),
            15 => Some(TxType::UniversalInvoke),
            _ => None,
        }
    }

    pub fn is_deploy(self) -> bool {
        matches!(self, TxType::LegacyDeploy | TxType::UniversalDeploy)
    }

    pub fn is_universal(self) -> bool {
        matches!(self, TxType::UniversalDeploy | TxType::UniversalInvoke)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxType::LegacyInvoke => "legacy_invoke",
            TxType::LegacyDeploy => "legacy_deploy",
            TxType::UniversalDeploy => "universal_deploy",
            TxType::UniversalInvoke => "universal_invoke",
        };
        f.write_str(name)
    }
}

/// Fields shared by every contract transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxBase {
    /// Protocol version tag.
    pub version: u32,

    /// Last block height at which the transaction may be included.
    ///
    /// This bounds the replay window: a node at a later height rejects
    /// the transaction as expired.
    pub valid_height: u32,

    /// Account that signs the transaction and pays its fees.
    pub sender: UserId,

    /// Fee amount, in the base token (legacy) or `fee_symbol` (universal).
    pub fees: u64,
}

impl TxBase {
    /// Builds the shared fields with [`CURRENT_TX_VERSION`].
    pub fn new(sender: UserId, valid_height: u32, fees: u64) -> Self {
        Self {
            version: CURRENT_TX_VERSION,
            valid_height,
            sender,
            fees,
        }
    }
}

/// Deploys a legacy scripting contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LegacyDeployTx {
    pub contract: LegacyContract,
}

/// Calls a legacy contract, optionally moving base-token value to it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LegacyInvokeTx {
    /// Target contract, by registration id or address.
    pub app_uid: UserId,
    /// Base-token amount moved from the sender to the contract.
    pub transfer_amount: u64,
    /// Opaque call arguments handed to the VM.
    pub arguments: Vec<u8>,
}

/// Deploys a universal contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UniversalDeployTx {
    pub fee_symbol: TokenSymbol,
    pub coin_symbol: TokenSymbol,
    /// Endowment moved from the sender to the new contract account.
    pub coin_amount: u64,
    pub contract: UniversalContract,
}

/// Calls a universal contract, optionally moving `coin_symbol` value to it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UniversalInvokeTx {
    pub app_uid: UserId,
    pub arguments: Vec<u8>,
    pub fee_symbol: TokenSymbol,
    pub coin_symbol: TokenSymbol,
    pub coin_amount: u64,
}

/// Variant-specific payload of a [`ContractTx`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ContractTxBody {
    LegacyDeploy(LegacyDeployTx),
    LegacyInvoke(LegacyInvokeTx),
    UniversalDeploy(UniversalDeployTx),
    UniversalInvoke(UniversalInvokeTx),
}

impl ContractTxBody {
    pub fn tx_type(&self) -> TxType {
        match self {
            ContractTxBody::LegacyDeploy(_) => TxType::LegacyDeploy,
            ContractTxBody::LegacyInvoke(_) => TxType::LegacyInvoke,
            ContractTxBody::UniversalDeploy(_) => TxType::UniversalDeploy,
            ContractTxBody::UniversalInvoke(_) => TxType::UniversalInvoke,
        }
    }

    /// Target contract of an invoke variant.
    pub fn app_uid(&self) -> Option<&UserId> {
        match self {
            ContractTxBody::LegacyInvoke(b) => Some(&b.app_uid),
            ContractTxBody::UniversalInvoke(b) => Some(&b.app_uid),
            _ => None,
        }
    }
}

/// A contract deploy or invoke transaction.
///
/// Equality compares every field including the signature; the digest
/// cache is ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawContractTx")]
pub struct ContractTx {
    base: TxBase,
    body: ContractTxBody,
    signature: Signature,

    /// Lazily computed signing digest, see [`crate::digest`].
    #[serde(skip)]
    pub(crate) cached_digest: Option<TxDigest>,
}

impl ContractTx {
    /// Builds an unsigned transaction.
    ///
    /// Fails if the sender or the target contract is an empty
    /// registration id.
    pub fn new(base: TxBase, body: ContractTxBody) -> Result<Self, ConstructionError> {
        if base.sender.is_empty_reg_id() {
            return Err(ConstructionError::EmptyRegId { field: "sender" });
        }
        if body.app_uid().is_some_and(UserId::is_empty_reg_id) {
            return Err(ConstructionError::EmptyRegId { field: "app_uid" });
        }

        Ok(Self {
            base,
            body,
            signature: Signature::default(),
            cached_digest: None,
        })
    }

    /// Builds an unsigned legacy invoke transaction.
    pub fn legacy_invoke(
        sender: UserId,
        app_uid: UserId,
        fees: u64,
        transfer_amount: u64,
        valid_height: u32,
        arguments: Vec<u8>,
    ) -> Result<Self, ConstructionError> {
        Self::new(
            TxBase::new(sender, valid_height, fees),
            ContractTxBody::LegacyInvoke(LegacyInvokeTx {
                app_uid,
                transfer_amount,
                arguments,
            }),
        )
    }

    /// Builds an unsigned universal invoke transaction.
    #[allow(clippy::too_many_arguments)]
    pub fn universal_invoke(
        sender: UserId,
        valid_height: u32,
        fees: u64,
        app_uid: UserId,
        arguments: Vec<u8>,
        fee_symbol: TokenSymbol,
        coin_symbol: TokenSymbol,
        coin_amount: u64,
    ) -> Result<Self, ConstructionError> {
        Self::new(
            TxBase::new(sender, valid_height, fees),
            ContractTxBody::UniversalInvoke(UniversalInvokeTx {
                app_uid,
                arguments,
                fee_symbol,
                coin_symbol,
                coin_amount,
            }),
        )
    }

    /// Builds an unsigned legacy deploy transaction.
    pub fn legacy_deploy(
        sender: UserId,
        valid_height: u32,
        fees: u64,
        contract: LegacyContract,
    ) -> Result<Self, ConstructionError> {
        Self::new(
            TxBase::new(sender, valid_height, fees),
            ContractTxBody::LegacyDeploy(LegacyDeployTx { contract }),
        )
    }

    /// Builds an unsigned universal deploy transaction.
    pub fn universal_deploy(
        sender: UserId,
        valid_height: u32,
        fees: u64,
        fee_symbol: TokenSymbol,
        coin_symbol: TokenSymbol,
        coin_amount: u64,
        contract: UniversalContract,
    ) -> Result<Self, ConstructionError> {
        Self::new(
            TxBase::new(sender, valid_height, fees),
            ContractTxBody::UniversalDeploy(UniversalDeployTx {
                fee_symbol,
                coin_symbol,
                coin_amount,
                contract,
            }),
        )
    }

    /// Builder-style variant of [`ContractTx::set_signature`].
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Attaches or replaces the signature.
    ///
    /// The digest cache is left alone: the signature is never part of it.
    pub fn set_signature(&mut self, signature: Signature) {
        self.signature = signature;
    }

    pub fn base(&self) -> &TxBase {
        &self.base
    }

    pub fn body(&self) -> &ContractTxBody {
        &self.body
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn tx_type(&self) -> TxType {
        self.body.tx_type()
    }

    pub fn sender(&self) -> &UserId {
        &self.base.sender
    }

    pub fn fees(&self) -> u64 {
        self.base.fees
    }

    pub fn valid_height(&self) -> u32 {
        self.base.valid_height
    }

    /// Token the fees are paid in; legacy variants use `base_symbol`.
    pub fn fee_symbol<'a>(&'a self, base_symbol: &'a TokenSymbol) -> &'a TokenSymbol {
        match &self.body {
            ContractTxBody::UniversalDeploy(b) => &b.fee_symbol,
            ContractTxBody::UniversalInvoke(b) => &b.fee_symbol,
            _ => base_symbol,
        }
    }

    /// Token and amount this transaction moves from the sender to a
    /// contract; legacy variants move `base_symbol`.
    pub fn values<'a>(&'a self, base_symbol: &'a TokenSymbol) -> (&'a TokenSymbol, u64) {
        match &self.body {
            ContractTxBody::LegacyDeploy(_) => (base_symbol, 0),
            ContractTxBody::LegacyInvoke(b) => (base_symbol, b.transfer_amount),
            ContractTxBody::UniversalDeploy(b) => (&b.coin_symbol, b.coin_amount),
            ContractTxBody::UniversalInvoke(b) => (&b.coin_symbol, b.coin_amount),
        }
    }
}

/// Deserialization form of [`ContractTx`], checked by [`ContractTx::new`].
#[derive(Deserialize)]
struct RawContractTx {
    base: TxBase,
    body: ContractTxBody,
    signature: Signature,
}

impl TryFrom<RawContractTx> for ContractTx {
    type Error = ConstructionError;

    fn try_from(raw: RawContractTx) -> Result<Self, Self::Error> {
        Ok(ContractTx::new(raw.base, raw.body)?.with_signature(raw.signature))
    }
}

impl PartialEq for ContractTx {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.body == other.body && self.signature == other.signature
    }
}

impl Eq for ContractTx {}
