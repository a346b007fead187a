use thiserror::Error;

/// Errors related to batching calls through `multiSend`.
#[derive(Debug, Error)]
pub enum MultisendError {
    /// There is nothing to execute.
    #[error("empty transaction set")]
    EmptyBatch,
    /// The operation byte is neither `Call` nor `DelegateCall`.
    #[error("unknown operation type {0}")]
    UnknownOperation(u8),
    /// A packed transaction runs past the end of the buffer.
    #[error("malformed multisend data at offset {offset}")]
    Malformed {
        /// Offset of the transaction that could not be read.
        offset: usize,
    },
    /// The `multiSend` call itself could not be decoded.
    #[error(transparent)]
    Abi(#[from] alloy::sol_types::Error),
}
