//! Plain EVM transactions, as objects or RLP encoded.

use crate::error::DecodeError;
use alloy::{
    consensus::{
        TxEip1559, TxEip2930, TxEnvelope, TxLegacy, TypedTransaction,
        transaction::RlpEcdsaDecodableTx,
    },
    eips::{Decodable2718, eip2930::AccessList},
    primitives::{Address, Bytes, ChainId, U256},
    rlp::{self, Decodable, Header},
};
use serde::{Deserialize, Serialize};

/// A transaction described field by field.
///
/// Quantities accept hex strings, decimal strings and numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionSerializable {
    /// The chain the transaction is valid on.
    pub chain_id: ChainId,
    /// Sender, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Sender nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    /// The call target. `None` is a contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Native value, in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// The calldata bytes.
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Gas limit.
    #[serde(default, alias = "gasLimit", skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    /// Legacy gas price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// EIP-1559 max fee per gas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-1559 max priority fee per gas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Transaction type, e.g. `"eip1559"` or `"0x2"`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
    /// EIP-2930 access list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
}

impl TransactionSerializable {
    /// Flattens a decoded transaction.
    ///
    /// Legacy transactions without replay protection take `fallback_chain_id`.
    pub fn from_typed(tx: &TypedTransaction, fallback_chain_id: ChainId) -> Self {
        match tx {
            TypedTransaction::Legacy(tx) => Self {
                chain_id: tx.chain_id.unwrap_or(fallback_chain_id),
                nonce: Some(U256::from(tx.nonce)),
                to: tx.to.to().copied(),
                value: Some(tx.value),
                data: Some(tx.input.clone()),
                gas: Some(U256::from(tx.gas_limit)),
                gas_price: Some(U256::from(tx.gas_price)),
                tx_type: Some("legacy".to_string()),
                ..Default::default()
            },
            TypedTransaction::Eip2930(tx) => Self {
                chain_id: tx.chain_id,
                nonce: Some(U256::from(tx.nonce)),
                to: tx.to.to().copied(),
                value: Some(tx.value),
                data: Some(tx.input.clone()),
                gas: Some(U256::from(tx.gas_limit)),
                gas_price: Some(U256::from(tx.gas_price)),
                tx_type: Some("eip2930".to_string()),
                access_list: Some(tx.access_list.clone()),
                ..Default::default()
            },
            TypedTransaction::Eip1559(tx) => Self {
                chain_id: tx.chain_id,
                nonce: Some(U256::from(tx.nonce)),
                to: tx.to.to().copied(),
                value: Some(tx.value),
                data: Some(tx.input.clone()),
                gas: Some(U256::from(tx.gas_limit)),
                max_fee_per_gas: Some(U256::from(tx.max_fee_per_gas)),
                max_priority_fee_per_gas: Some(U256::from(tx.max_priority_fee_per_gas)),
                tx_type: Some("eip1559".to_string()),
                access_list: Some(tx.access_list.clone()),
                ..Default::default()
            },
            // never produced by `decode_rlp_transaction`
            _ => Self { chain_id: fallback_chain_id, ..Default::default() },
        }
    }

    /// Upper bound of the fees paid by the transaction.
    ///
    /// `gas * (maxFeePerGas + maxPriorityFeePerGas)` for fee market transactions, `gas *
    /// gasPrice` for legacy ones.
    pub fn max_cost(&self) -> Result<U256, DecodeError> {
        let gas = self.gas.filter(|gas| !gas.is_zero()).ok_or(DecodeError::InsufficientFeeData)?;
        match (self.max_fee_per_gas, self.max_priority_fee_per_gas, self.gas_price) {
            (Some(max_fee), Some(priority_fee), _) if !max_fee.is_zero() => {
                Ok(gas * (max_fee + priority_fee))
            }
            (None, None, Some(gas_price)) if !gas_price.is_zero() => Ok(gas * gas_price),
            _ => Err(DecodeError::InsufficientFeeData),
        }
    }
}

/// Decodes a legacy, EIP-2930 or EIP-1559 transaction, signed or unsigned.
///
/// Signatures are dropped.
pub fn decode_rlp_transaction(raw: &[u8]) -> Result<TypedTransaction, DecodeError> {
    let (&first, rest) = raw.split_first().ok_or(rlp::Error::InputTooShort)?;
    let legacy = first >= rlp::EMPTY_LIST_CODE;
    if !legacy && !matches!(first, 0x01 | 0x02) {
        return Err(DecodeError::UnsupportedTxType(first));
    }

    // an unsigned `[.., chainId, 0, 0]` also reads as a signed legacy transaction
    if legacy && let Ok(tx) = decode_unsigned_legacy(raw) {
        return Ok(tx);
    }
    if let Ok(envelope) = TxEnvelope::decode_2718_exact(raw) {
        return Ok(envelope.into());
    }

    let mut buf = rest;
    let tx = match first {
        0x01 => TypedTransaction::Eip2930(TxEip2930::rlp_decode(&mut buf)?),
        0x02 => TypedTransaction::Eip1559(TxEip1559::rlp_decode(&mut buf)?),
        _ => return decode_unsigned_legacy(raw),
    };
    if !buf.is_empty() {
        return Err(rlp::Error::Custom("trailing bytes after transaction").into());
    }
    Ok(tx)
}

/// An unsigned legacy transaction, optionally followed by the EIP-155 `[chainId, 0, 0]`.
fn decode_unsigned_legacy(mut buf: &[u8]) -> Result<TypedTransaction, DecodeError> {
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(rlp::Error::UnexpectedString.into());
    }
    if buf.len() != header.payload_length {
        return Err(rlp::Error::UnexpectedLength.into());
    }

    let mut tx = TxLegacy::rlp_decode_fields(&mut buf)?;
    if !buf.is_empty() {
        tx.chain_id = Some(Decodable::decode(&mut buf)?);
        let (r, s) = (U256::decode(&mut buf)?, U256::decode(&mut buf)?);
        if !r.is_zero() || !s.is_zero() || !buf.is_empty() {
            return Err(rlp::Error::Custom("unexpected legacy transaction field").into());
        }
    }
    Ok(TypedTransaction::Legacy(tx))
}
