use alloy::primitives::{Address, B256};
use thiserror::Error;

/// Errors related to signatures returned by the remote signer.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// No candidate recovers to the owner for the given hash.
    #[error("no signature for {hash} recovers to owner {owner} ({candidates} candidates)")]
    NoValidCandidate {
        /// The signed hash.
        hash: B256,
        /// The expected signer.
        owner: Address,
        /// How many candidates were checked.
        candidates: usize,
    },
}
