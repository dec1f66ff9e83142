//! Per-variant wire layouts.
//!
//! Field order is fixed per variant and may only change under a new
//! version tag. The signature is always the last field.
//!
//! | variant          | layout after `version, valid_height, sender`                      |
//! |------------------|--------------------------------------------------------------------|
//! | legacy deploy    | `contract, fees`                                                   |
//! | legacy invoke    | `app_uid, fees, transfer_amount, arguments`                        |
//! | universal deploy | `fee_symbol, fees, coin_symbol, coin_amount, contract`             |
//! | universal invoke | `app_uid, arguments, fees, fee_symbol, coin_symbol, coin_amount`   |
//!
//! The transaction type is not part of the payload; callers either know it
//! out of band ([`decode`]) or use the framed form ([`decode_framed`]).

use super::{Decode, Encode, Reader, Writer};
use crate::error::CodecError;
use crate::types::{
    ADDRESS_LEN, Address, ContractTx, ContractTxBody, LegacyContract, LegacyDeployTx,
    LegacyInvokeTx, RegId, Signature, TokenSymbol, TxBase, TxType, UniversalContract,
    UniversalDeployTx, UniversalInvokeTx, UserId, VmType,
};

const USER_ID_REG_ID: u64 = 1;
const USER_ID_ADDRESS: u64 = 2;

impl Encode for UserId {
    fn encode_to(&self, w: &mut Writer) {
        match self {
            UserId::RegId(r) => {
                w.put_varint(USER_ID_REG_ID)
                    .put_varint(u64::from(r.height))
                    .put_varint(u64::from(r.index));
            }
            UserId::Address(a) => {
                w.put_varint(USER_ID_ADDRESS).put_raw(a.as_bytes());
            }
        }
    }
}

impl Decode for UserId {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        match r.read_varint_u64()? {
            USER_ID_REG_ID => {
                let height = r.read_varint_u32()?;
                let index = r.read_varint_u16()?;
                Ok(UserId::RegId(RegId::new(height, index)))
            }
            USER_ID_ADDRESS => Ok(UserId::Address(Address(
                r.read_array::<ADDRESS_LEN>("address")?,
            ))),
            value => Err(CodecError::UnknownDiscriminant {
                field: "user id",
                value,
            }),
        }
    }
}

impl Encode for TokenSymbol {
    fn encode_to(&self, w: &mut Writer) {
        w.put_bytes(self.as_str().as_bytes());
    }
}

impl Decode for TokenSymbol {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let raw = r.read_bytes()?;
        let s = String::from_utf8(raw).map_err(|_| CodecError::InvalidField {
            field: "token symbol",
            reason: "not UTF-8".to_string(),
        })?;
        TokenSymbol::new(s).map_err(|e| CodecError::InvalidField {
            field: "token symbol",
            reason: e.to_string(),
        })
    }
}

impl Encode for LegacyContract {
    fn encode_to(&self, w: &mut Writer) {
        w.put_bytes(&self.code).put_bytes(&self.memo);
    }
}

impl Decode for LegacyContract {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let code = r.read_bytes()?;
        let memo = r.read_bytes()?;
        Ok(LegacyContract { code, memo })
    }
}

impl Encode for UniversalContract {
    fn encode_to(&self, w: &mut Writer) {
        w.put_varint(self.vm_type as u64)
            .put_u8(u8::from(self.upgradable))
            .put_bytes(&self.code)
            .put_bytes(&self.memo)
            .put_bytes(&self.abi);
    }
}

impl Decode for UniversalContract {
    fn decode_from(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let tag = r.read_varint_u64()?;
        let vm_type = VmType::from_u64(tag).ok_or(CodecError::UnknownDiscriminant {
            field: "vm type",
            value: tag,
        })?;
        let upgradable = match r.read_u8("upgradable flag")? {
            0 => false,
            1 => true,
            other => {
                return Err(CodecError::InvalidField {
                    field: "upgradable flag",
                    reason: format!("expected 0 or 1, got {other}"),
                });
            }
        };
        let code = r.read_bytes()?;
        let memo = r.read_bytes()?;
        let abi = r.read_bytes()?;
        Ok(UniversalContract {
            vm_type,
            upgradable,
            code,
            memo,
            abi,
        })
    }
}

/// Encodes `tx` without its type tag.
pub fn encode(tx: &ContractTx) -> Vec<u8> {
    let mut w = Writer::new();
    let base = tx.base();

    w.put_varint(u64::from(base.version))
        .put_varint(u64::from(base.valid_height))
        .put(&base.sender);

    match tx.body() {
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
            w.put(&b.fee_symbol)
                .put_varint(base.fees)
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

    w.put_bytes(tx.signature().as_bytes());
    w.into_bytes()
}

/// Decodes a transaction of the given type.
///
/// Fails on any structural problem, including trailing bytes and identities
/// that violate construction rules.
pub fn decode(tx_type: TxType, bytes: &[u8]) -> Result<ContractTx, CodecError> {
    let mut r = Reader::new(bytes);

    let version = r.read_varint_u32()?;
    let valid_height = r.read_varint_u32()?;
    let sender: UserId = r.read()?;

    let (fees, body) = match tx_type {
        TxType::LegacyDeploy => {
            let contract: LegacyContract = r.read()?;
            let fees = r.read_varint_u64()?;
            (fees, ContractTxBody::LegacyDeploy(LegacyDeployTx { contract }))
        }
        TxType::LegacyInvoke => {
            let app_uid: UserId = r.read()?;
            let fees = r.read_varint_u64()?;
            let transfer_amount = r.read_varint_u64()?;
            let arguments = r.read_bytes()?;
            let body = LegacyInvokeTx {
                app_uid,
                transfer_amount,
                arguments,
            };
            (fees, ContractTxBody::LegacyInvoke(body))
        }
        TxType::UniversalDeploy => {
            let fee_symbol: TokenSymbol = r.read()?;
            let fees = r.read_varint_u64()?;
            let coin_symbol: TokenSymbol = r.read()?;
            let coin_amount = r.read_varint_u64()?;
            let contract: UniversalContract = r.read()?;
            let body = UniversalDeployTx {
                fee_symbol,
                coin_symbol,
                coin_amount,
                contract,
            };
            (fees, ContractTxBody::UniversalDeploy(body))
        }
        TxType::UniversalInvoke => {
            let app_uid: UserId = r.read()?;
            let arguments = r.read_bytes()?;
            let fees = r.read_varint_u64()?;
            let fee_symbol: TokenSymbol = r.read()?;
            let coin_symbol: TokenSymbol = r.read()?;
            let coin_amount = r.read_varint_u64()?;
            let body = UniversalInvokeTx {
                app_uid,
                arguments,
                fee_symbol,
                coin_symbol,
                coin_amount,
            };
            (fees, ContractTxBody::UniversalInvoke(body))
        }
    };

    let signature = Signature(r.read_bytes()?);
    r.finish()?;

    let base = TxBase {
        version,
        valid_height,
        sender,
        fees,
    };
    Ok(ContractTx::new(base, body)?.with_signature(signature))
}

/// Encodes `tx` prefixed with its one-byte type tag.
pub fn encode_framed(tx: &ContractTx) -> Vec<u8> {
    let payload = encode(tx);
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(tx.tx_type() as u8);
    out.extend_from_slice(&payload);
    out
}

/// Decodes a transaction written by [`encode_framed`].
pub fn decode_framed(bytes: &[u8]) -> Result<ContractTx, CodecError> {
    let (&tag, payload) = bytes.split_first().ok_or(CodecError::Truncated("tx type"))?;
    let tx_type = TxType::from_u8(tag).ok_or(CodecError::UnknownDiscriminant {
        field: "tx type",
        value: u64::from(tag),
    })?;
    decode(tx_type, payload)
}
