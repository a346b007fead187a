//! EIP-1271 message hashes of a Safe.
//!
//! A Safe signs a message by having its owner sign the EIP-712 `SafeMessage(bytes message)`
//! struct, where `message` is the EIP-191 hash of a text message or the EIP-712 hash of typed
//! data.

use crate::{error::RequestError, types::EvmMessage};
use alloy::{
    hex,
    primitives::{Address, B256, Bytes, ChainId, U256, eip191_hash_message},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use semver::Version;

sol! {
    /// Reference: <https://github.com/safe-global/safe-smart-account/blob/main/contracts/handler/CompatibilityFallbackHandler.sol>
    struct SafeMessage {
        bytes message;
    }
}

/// First Safe version whose message domain carries the chain id.
const CHAIN_BOUND_DOMAIN_VERSION: (u64, u64, u64) = (1, 3, 0);

/// The Safe a message is signed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeInfo {
    /// The Safe address.
    pub address: Address,
    /// The chain the message is signed on.
    pub chain_id: ChainId,
    /// The Safe version, which selects the message domain.
    pub version: Option<Version>,
}

/// The hashes involved in signing a message with a Safe.
#[derive(Debug, Clone)]
pub struct DecodedSafeMessage {
    /// The message, with UTF-8 hex decoded to text.
    pub decoded_message: EvmMessage,
    /// The value inside the `SafeMessage` struct.
    pub safe_message_message: B256,
    /// The digest the owner signs.
    pub safe_message_hash: B256,
}

/// Decodes a hex message to text if it is valid UTF-8, otherwise returns it unchanged.
pub fn decoded_message(message: &str) -> String {
    message
        .strip_prefix("0x")
        .and_then(|raw| hex::decode(raw).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}

/// Computes the hashes a Safe signs for `message`.
pub fn decode_safe_message(
    message: EvmMessage,
    safe: &SafeInfo,
) -> Result<DecodedSafeMessage, RequestError> {
    let decoded_message = match message {
        EvmMessage::Text(text) => EvmMessage::Text(decoded_message(&text)),
        typed => typed,
    };
    let safe_message_message = message_hash(&decoded_message)?;
    let domain = safe_message_domain(safe)?;
    let safe_message = SafeMessage { message: Bytes::copy_from_slice(safe_message_message.as_slice()) };
    let safe_message_hash = safe_message.eip712_signing_hash(&domain);

    Ok(DecodedSafeMessage { decoded_message, safe_message_message, safe_message_hash })
}

/// EIP-191 hash of a text message, EIP-712 hash of typed data.
pub fn message_hash(message: &EvmMessage) -> Result<B256, RequestError> {
    match message {
        EvmMessage::Text(text) => Ok(eip191_hash_message(text)),
        EvmMessage::TypedData(typed_data) => Ok(typed_data.eip712_signing_hash()?),
    }
}

/// `{chainId, verifyingContract}` from 1.3.0 on, `{verifyingContract}` before.
fn safe_message_domain(safe: &SafeInfo) -> Result<Eip712Domain, RequestError> {
    let version = safe.version.as_ref().ok_or(RequestError::MissingSafeVersion)?;
    let chain_bound =
        (version.major, version.minor, version.patch) >= CHAIN_BOUND_DOMAIN_VERSION;
    let chain_id = chain_bound.then(|| U256::from(safe.chain_id));
    Ok(Eip712Domain::new(None, None, chain_id, Some(safe.address), None))
}
