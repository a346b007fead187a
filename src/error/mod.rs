//! Error types.
use alloy::{primitives::ChainId, transports::TransportErrorKind};
use thiserror::Error;

mod bundler;
pub use bundler::{BundlerError, strip_api_key};

mod decode;
pub use decode::DecodeError;

mod multisend;
pub use multisend::MultisendError;

mod request;
pub use request::RequestError;

mod signature;
pub use signature::SignatureError;

/// The overarching error type returned by the operation pipeline.
#[derive(Debug, Error)]
pub enum SafeError {
    /// The signing request was malformed or inconsistent.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// A batch could not be encoded or decoded.
    #[error(transparent)]
    Multisend(#[from] MultisendError),
    /// The bundler or the paymaster API failed.
    #[error(transparent)]
    Bundler(#[from] BundlerError),
    /// A payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// None of the signatures returned by the signer is usable.
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// No provider is configured for the chain.
    #[error("unsupported chain {0}")]
    UnsupportedChain(ChainId),
    /// A chain read failed.
    #[error("chain: {0}")]
    Chain(#[from] alloy::transports::RpcError<TransportErrorKind>),
    /// A contract read failed.
    #[error("chain: {0}")]
    Contract(#[from] alloy::contract::Error),
    /// The remote signer failed.
    #[error("signer: {0}")]
    Signer(eyre::Error),
    /// An error occurred during ABI encoding/decoding.
    #[error(transparent)]
    AbiError(#[from] alloy::sol_types::Error),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}

impl SafeError {
    /// Wraps an error reported by the remote signer.
    pub fn signer(err: impl Into<eyre::Error>) -> Self {
        Self::Signer(err.into())
    }
}
