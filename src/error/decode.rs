use super::MultisendError;
use alloy::primitives::ChainId;
use thiserror::Error;

/// Errors related to decoding a payload back into transaction intent.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload matches none of the supported formats.
    #[error("unrecognized message format for chain {chain_id}")]
    UnrecognizedFormat {
        /// The chain the payload was submitted for.
        chain_id: ChainId,
    },
    /// The transaction targets another chain.
    #[error("transaction chain id mismatch {expected} != {got}")]
    ChainIdMismatch {
        /// The chain the payload was submitted for.
        expected: ChainId,
        /// The chain id encoded in the transaction.
        got: ChainId,
    },
    /// Gas limit or fee fields are missing.
    #[error("insufficient fee data for transaction")]
    InsufficientFeeData,
    /// Contract creations are not supported.
    #[error("transaction is missing `to`")]
    MissingRecipient,
    /// The transaction type byte is not supported.
    #[error("unsupported transaction type {0:#04x}")]
    UnsupportedTxType(u8),
    /// The RLP payload is malformed.
    #[error("invalid rlp transaction: {0}")]
    Rlp(#[from] alloy::rlp::Error),
    /// The operation call data is not an `executeUserOp` call.
    #[error(transparent)]
    Abi(#[from] alloy::sol_types::Error),
    /// The decoded intent could not be rendered.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The batched call data is malformed.
    #[error(transparent)]
    Multisend(#[from] MultisendError),
}
