//! Human readable summaries of signing requests, with call data decoded by the Safe transaction
//! service.

use super::decode_evm_data;
use crate::{
    error::DecodeError,
    types::{DecodedTxData, EvmData},
};
use alloy::primitives::{Address, Bytes, ChainId};
use alloy_chains::Chain;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Networks served by the Safe transaction service, by chain id.
pub const SAFE_NETWORKS: &[(ChainId, &str)] = &[
    (1, "mainnet"),
    (10, "optimism"),
    (56, "binance"),
    (97, "bsc-testnet"),
    (100, "gnosis-chain"),
    (137, "polygon"),
    (250, "fantom"),
    (288, "boba"),
    (1284, "moonbeam"),
    (1285, "moonriver"),
    (4002, "fantom-testnet"),
    (8453, "base"),
    (42161, "arbitrum"),
    (43113, "avalanche-fuji"),
    (43114, "avalanche"),
    (80001, "polygon-mumbai"),
    (11155111, "sepolia"),
    (1313161554, "aurora"),
    (1313161555, "aurora-testnet"),
    (1666600000, "harmony"),
    (1666700000, "harmony-testnet"),
];

const DEFAULT_DECODER_URL: &str = "https://safe-transaction-{network}.safe.global";

/// Transaction service network of `chain_id`, mainnet for unknown chains.
pub fn safe_network(chain_id: ChainId) -> &'static str {
    SAFE_NETWORKS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map_or(SAFE_NETWORKS[0].1, |&(_, network)| network)
}

/// Display name of a chain, e.g. `Sepolia`.
pub fn network_name(chain_id: ChainId) -> String {
    let name = Chain::from_id(chain_id).to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

/// A decoded argument of a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedParameter {
    /// Name in the contract ABI.
    pub name: String,
    /// ABI type, e.g. `address`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The value, nested for tuples and arrays.
    pub value: Value,
}

/// A decoded contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// The called method.
    pub method: String,
    /// Its arguments.
    pub parameters: Vec<DecodedParameter>,
}

#[derive(Debug, Deserialize)]
struct DecoderErrorResponse {
    message: String,
    #[serde(default)]
    arguments: Vec<String>,
}

/// Client of the data decoder of the Safe transaction service.
#[derive(Debug, Clone)]
pub struct SafeDecoder {
    http: reqwest::Client,
    base_url: String,
}

impl Default for SafeDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_DECODER_URL)
    }
}

impl SafeDecoder {
    /// A decoder reached at `base_url`, in which `{network}` is replaced by the network name.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// Decoder endpoint for `chain_id`.
    pub fn decoder_url(&self, chain_id: ChainId) -> String {
        let base = self.base_url.replace("{network}", safe_network(chain_id));
        format!("{}/api/v1/data-decoder/", base.trim_end_matches('/'))
    }

    /// Decodes a call to `to`, `None` if the service cannot.
    ///
    /// Failures are logged, never returned: a call that cannot be explained is still shown.
    pub async fn decode_call(
        &self,
        data: &Bytes,
        to: Address,
        chain_id: ChainId,
    ) -> Option<FunctionSignature> {
        let response = match self
            .http
            .post(self.decoder_url(chain_id))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "data": data, "to": to }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(%err, "failed to reach data decoder");
                return None;
            }
        };

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => {
                warn!(%to, "cannot find function selector to decode data");
                None
            }
            reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                match response.json::<DecoderErrorResponse>().await {
                    Ok(err) => warn!(reason = %err.message, arguments = ?err.arguments, "invalid data"),
                    Err(err) => warn!(%err, "invalid data"),
                }
                None
            }
            status if !status.is_success() => {
                error!(%status, "unexpected data decoder response");
                None
            }
            _ => response
                .json()
                .await
                .inspect_err(|err| error!(%err, "malformed data decoder response"))
                .ok(),
        }
    }

    /// Decodes a request and the calls it makes, rendered as pretty printed JSON.
    pub async fn explain_sign_request(&self, data: &EvmData) -> Result<String, DecodeError> {
        let decoded = decode_evm_data(data)?;
        let signatures = futures_util::future::join_all(
            decoded.transactions.iter().map(|tx| self.decode_call(&tx.data, tx.to, decoded.chain_id)),
        )
        .await;
        debug!(
            calls = decoded.transactions.len(),
            decoded = signatures.iter().flatten().count(),
            "explained request"
        );
        format_evm_data(&decoded, &signatures)
    }
}

/// The decoded request with its network name and decoded calls, as pretty printed JSON.
pub fn format_evm_data(
    decoded: &DecodedTxData,
    function_signatures: &[Option<FunctionSignature>],
) -> Result<String, DecodeError> {
    let mut formatted = serde_json::to_value(decoded)?;
    if let Value::Object(fields) = &mut formatted {
        fields.insert("network".into(), network_name(decoded.chain_id).into());
        fields.insert("functionSignatures".into(), serde_json::to_value(function_signatures)?);
    }
    Ok(serde_json::to_string_pretty(&formatted)?)
}
