//! Signing requests, as received from wallet connections, and their encoded form.

use super::MetaTransaction;
use crate::error::RequestError;
use alloy::{
    dyn_abi::TypedData,
    hex,
    primitives::{Address, B256, Bytes, ChainId, U256},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of `eth_sendTransaction` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    /// The sender.
    pub from: Address,
    /// The call target.
    pub to: Address,
    /// Gas limit suggested by the dapp. Ignored for Safe operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    /// Native value, in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// The calldata bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl From<TransactionParams> for MetaTransaction {
    fn from(params: TransactionParams) -> Self {
        Self::call(params.to, params.value.unwrap_or_default(), params.data.unwrap_or_default())
    }
}

/// Params of `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTransactionParams {
    /// Explicit calls.
    Calls(Vec<TransactionParams>),
    /// A single RLP encoded transaction.
    Rlp(Bytes),
}

/// The supported signing methods, keyed by their JSON-RPC name.
#[derive(Debug, Clone)]
pub enum SignMethod {
    /// `personal_sign [message, from]`
    PersonalSign {
        /// Text, or hex encoded bytes.
        message: String,
        /// The sender.
        from: Address,
    },
    /// `eth_sign [from, message]`
    EthSign {
        /// The sender.
        from: Address,
        /// Text, or hex encoded bytes.
        message: String,
    },
    /// `eth_signTypedData[_v4] [from, typedData]`
    SignTypedData {
        /// The sender.
        from: Address,
        /// The typed data, given either as object or as JSON string.
        typed_data: Box<TypedData>,
        /// Whether the `_v4` method name was used.
        v4: bool,
    },
    /// `eth_sendTransaction`
    SendTransaction(SendTransactionParams),
}

impl SignMethod {
    /// The JSON-RPC method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PersonalSign { .. } => "personal_sign",
            Self::EthSign { .. } => "eth_sign",
            Self::SignTypedData { v4: false, .. } => "eth_signTypedData",
            Self::SignTypedData { v4: true, .. } => "eth_signTypedData_v4",
            Self::SendTransaction(_) => "eth_sendTransaction",
        }
    }

    /// Every sender implied by the params.
    ///
    /// RLP encoded transactions carry no sender and count as the zero address.
    pub fn from_addresses(&self) -> Vec<Address> {
        match self {
            Self::PersonalSign { from, .. }
            | Self::EthSign { from, .. }
            | Self::SignTypedData { from, .. } => vec![*from],
            Self::SendTransaction(SendTransactionParams::Calls(calls)) => {
                calls.iter().map(|call| call.from).collect()
            }
            Self::SendTransaction(SendTransactionParams::Rlp(_)) => vec![Address::ZERO],
        }
    }

    fn parse(method: &str, params: Value) -> Result<Self, RequestError> {
        match method {
            "personal_sign" => {
                let (message, from) = serde_json::from_value(params)
                    .map_err(|err| RequestError::invalid_params("personal_sign", err))?;
                Ok(Self::PersonalSign { message, from })
            }
            "eth_sign" => {
                let (from, message) = serde_json::from_value(params)
                    .map_err(|err| RequestError::invalid_params("eth_sign", err))?;
                Ok(Self::EthSign { from, message })
            }
            "eth_signTypedData" | "eth_signTypedData_v4" => {
                let v4 = method == "eth_signTypedData_v4";
                let name = if v4 { "eth_signTypedData_v4" } else { "eth_signTypedData" };
                let (from, typed_data): (Address, Value) = serde_json::from_value(params)
                    .map_err(|err| RequestError::invalid_params(name, err))?;
                let typed_data = match typed_data {
                    Value::String(json) => serde_json::from_str(&json),
                    other => serde_json::from_value(other),
                }
                .map_err(|err| RequestError::invalid_params(name, err))?;
                Ok(Self::SignTypedData { from, typed_data, v4 })
            }
            "eth_sendTransaction" => {
                let params = match params {
                    Value::String(raw) => SendTransactionParams::Rlp(
                        hex::decode(&raw)
                            .map_err(|err| RequestError::invalid_params("eth_sendTransaction", err))?
                            .into(),
                    ),
                    other => SendTransactionParams::Calls(
                        serde_json::from_value(other).map_err(|err| {
                            RequestError::invalid_params("eth_sendTransaction", err)
                        })?,
                    ),
                };
                Ok(Self::SendTransaction(params))
            }
            other => Err(RequestError::UnknownMethod(other.to_string())),
        }
    }

    fn params(&self) -> Value {
        match self {
            Self::PersonalSign { message, from } => serde_json::json!([message, from]),
            Self::EthSign { from, message } => serde_json::json!([from, message]),
            Self::SignTypedData { from, typed_data, .. } => serde_json::json!([from, typed_data]),
            Self::SendTransaction(SendTransactionParams::Calls(calls)) => serde_json::json!(calls),
            Self::SendTransaction(SendTransactionParams::Rlp(raw)) => serde_json::json!(raw),
        }
    }
}

/// A request to sign something on behalf of the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSignRequest", into = "RawSignRequest")]
pub struct SignRequest {
    /// The chain the request is made on.
    pub chain_id: ChainId,
    /// The method and its params.
    pub method: SignMethod,
}

impl SignRequest {
    /// Creates a new [`SignRequest`].
    pub fn new(chain_id: ChainId, method: SignMethod) -> Self {
        Self { chain_id, method }
    }

    /// An `eth_sendTransaction` request for the given calls.
    pub fn send_transaction(chain_id: ChainId, calls: Vec<TransactionParams>) -> Self {
        Self::new(chain_id, SignMethod::SendTransaction(SendTransactionParams::Calls(calls)))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSignRequest {
    method: String,
    chain_id: ChainId,
    params: Value,
}

impl TryFrom<RawSignRequest> for SignRequest {
    type Error = RequestError;

    fn try_from(raw: RawSignRequest) -> Result<Self, Self::Error> {
        Ok(Self { chain_id: raw.chain_id, method: SignMethod::parse(&raw.method, raw.params)? })
    }
}

impl From<SignRequest> for RawSignRequest {
    fn from(request: SignRequest) -> Self {
        Self {
            method: request.method.name().to_string(),
            chain_id: request.chain_id,
            params: request.method.params(),
        }
    }
}

/// A message as shown to the user next to the hash they sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvmMessage {
    /// A text message, an RLP transaction in hex, or a JSON encoded user operation.
    Text(String),
    /// EIP-712 typed data.
    TypedData(Box<TypedData>),
}

impl From<String> for EvmMessage {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A signing request reduced to the 32 byte hash the signer sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedSignRequest {
    /// What is being signed.
    pub evm_message: EvmMessage,
    /// The hash to sign.
    pub hash_to_sign: B256,
}

/// An [`EncodedSignRequest`] bound to its chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmData {
    /// The chain the request is made on.
    pub chain_id: ChainId,
    /// What is being signed.
    pub evm_message: EvmMessage,
    /// The hash to sign.
    pub hash_to_sign: B256,
}

/// Everything needed to obtain a signature from the remote signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedTxData {
    /// The signer's own request, encoded by the signer.
    pub signer_payload: Value,
    /// The request being signed.
    pub evm_data: EvmData,
}
