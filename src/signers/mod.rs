//! The remote signer owning the Safe, and signature packing.

mod local;
pub use local::LocalMpcSigner;

use crate::{error::SignatureError, types::U48};
use alloy::primitives::{Address, B256, Bytes, Signature};
use serde::{Deserialize, Serialize};

/// A signature request, in the shape the remote signer relays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// Key derivation path.
    pub path: String,
    /// The 32 byte hash to sign.
    pub payload: B256,
    /// Key version of the signer.
    pub key_version: u32,
}

/// A signer holding the sole owner key of the Safe.
///
/// Threshold signers may return several candidate signatures for a single hash, typically the
/// same `(r, s)` with both parities. [`select_signature`] picks the one that recovers to the
/// owner.
#[async_trait::async_trait]
pub trait MpcSigner: std::fmt::Debug + Send + Sync {
    /// The owner address controlled by the signer.
    fn address(&self) -> Address;

    /// Account the signer acts for.
    fn account_id(&self) -> &str;

    /// Key derivation path of the owner key.
    fn derivation_path(&self) -> &str;

    /// Signs a 32 byte hash, returning every candidate signature.
    async fn sign_hash(&self, hash: B256) -> eyre::Result<Vec<Signature>>;

    /// Encodes the signer's own request for `request`, so it can be relayed by someone else.
    async fn encode_signature_request_tx(
        &self,
        request: &SignatureRequest,
    ) -> eyre::Result<serde_json::Value>;
}

/// `uint48 validFrom ‖ uint48 validTo ‖ signature`
pub fn pack_signature(signature: &[u8], valid_from: U48, valid_to: U48) -> Bytes {
    let mut packed = Vec::with_capacity(12 + signature.len());
    packed.extend_from_slice(&valid_from.to_be_bytes::<6>());
    packed.extend_from_slice(&valid_to.to_be_bytes::<6>());
    packed.extend_from_slice(signature);
    packed.into()
}

/// Returns the first candidate that recovers to `owner` for `hash`.
pub fn select_signature(
    hash: B256,
    candidates: &[Signature],
    owner: Address,
) -> Result<Signature, SignatureError> {
    candidates
        .iter()
        .find(|sig| sig.recover_address_from_prehash(&hash).is_ok_and(|signer| signer == owner))
        .copied()
        .ok_or(SignatureError::NoValidCandidate { hash, owner, candidates: candidates.len() })
}
