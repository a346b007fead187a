//! Recovery of transaction intent from the payloads the router produces.
//!
//! A payload is one of:
//! - an RLP encoded transaction, as `0x` hex,
//! - a transaction object,
//! - EIP-712 typed data, as object or JSON string,
//! - a user operation, as JSON string,
//! - a plain message.

mod explain;
pub use explain::{
    DecodedParameter, FunctionSignature, SAFE_NETWORKS, SafeDecoder, format_evm_data,
    network_name, safe_network,
};

mod util;
pub use util::{
    decode_rlp_hex, decode_transaction_serializable, decode_typed_data, decode_user_operation,
};

use crate::{
    error::DecodeError,
    types::{
        BroadcastTarget, DecodedTxData, EvmData, EvmMessage, TransactionSerializable,
        UserOperation, decode_rlp_transaction,
    },
};
use alloy::{dyn_abi::TypedData, hex, primitives::ChainId};
use serde_json::Value;
use tracing::warn;

/// Decodes `evm_message` as submitted on `chain_id`.
pub fn decode_tx_data(chain_id: ChainId, evm_message: &Value) -> Result<DecodedTxData, DecodeError> {
    if let Some(raw) = evm_message.as_str().and_then(parse_rlp_hex) {
        return decode_rlp_hex(chain_id, &raw);
    }
    if let Some(tx) = parse_transaction(evm_message) {
        return decode_transaction_serializable(chain_id, &tx);
    }
    if let Some(typed_data) = parse_typed_data(evm_message) {
        return Ok(decode_typed_data(chain_id, typed_data));
    }
    if let Some(op) = parse_user_operation(evm_message) {
        match decode_user_operation(chain_id, &op) {
            Ok(decoded) => return Ok(decoded),
            Err(err) => warn!(chain_id, %err, "user operation call data not decodable"),
        }
    }
    match evm_message {
        Value::String(message) => {
            Ok(DecodedTxData::message(chain_id, EvmMessage::Text(message.clone())))
        }
        other => {
            warn!(chain_id, payload = %other, "unrecognized payload");
            Err(DecodeError::UnrecognizedFormat { chain_id })
        }
    }
}

/// Decodes the payload of an encoded request.
pub fn decode_evm_data(data: &EvmData) -> Result<DecodedTxData, DecodeError> {
    decode_tx_data(data.chain_id, &serde_json::to_value(&data.evm_message)?)
}

/// Where `evm_message` is submitted once signed, `None` if it is not a transaction.
///
/// Legacy transactions without replay protection are assigned `chain_id`.
pub fn determine_broadcast_target(chain_id: ChainId, evm_message: &Value) -> Option<BroadcastTarget> {
    if let Value::String(message) = evm_message {
        if let Some(op) = parse_user_operation(evm_message) {
            return Some(BroadcastTarget::Bundler(op));
        }
        let tx = parse_rlp_hex(message).and_then(|raw| decode_rlp_transaction(&raw).ok())?;
        return Some(BroadcastTarget::Evm(TransactionSerializable::from_typed(&tx, chain_id)));
    }
    parse_transaction(evm_message).map(BroadcastTarget::Evm)
}

/// Raw bytes of a hex string that holds a transaction.
fn parse_rlp_hex(message: &str) -> Option<Vec<u8>> {
    let raw = hex::decode(message.strip_prefix("0x")?).ok()?;
    decode_rlp_transaction(&raw).is_ok().then_some(raw)
}

fn parse_transaction(value: &Value) -> Option<TransactionSerializable> {
    value.is_object().then(|| serde_json::from_value(value.clone()).ok()).flatten()
}

/// Typed data given as object or as JSON string.
fn parse_typed_data(value: &Value) -> Option<TypedData> {
    match value {
        Value::String(json) => serde_json::from_str(json).ok(),
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// A user operation given as JSON string.
fn parse_user_operation(value: &Value) -> Option<UserOperation> {
    let json = value.as_str()?;
    serde_json::from_str::<Value>(json)
        .ok()
        .filter(Value::is_object)
        .and_then(|op| serde_json::from_value(op).ok())
}
