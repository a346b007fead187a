use alloy::primitives::Address;
use thiserror::Error;

/// Errors related to incoming signing requests.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The JSON-RPC method is not a signing method.
    #[error("unsupported method {0}")]
    UnknownMethod(String),
    /// No parameter carried a sender.
    #[error("no from address provided")]
    MissingFrom,
    /// The parameters name more than one sender.
    #[error("ambiguous sender: {0:?}")]
    AmbiguousSender(Vec<Address>),
    /// The sender is neither the Safe, its owner, nor the zero address.
    #[error("unexpected from address {from}, expected {safe} or {owner}")]
    UnexpectedFrom {
        /// The address found in the request.
        from: Address,
        /// The Safe address.
        safe: Address,
        /// The owner address.
        owner: Address,
    },
    /// The Safe version is required to pick the message domain.
    #[error("Cannot create SafeMessage without version information")]
    MissingSafeVersion,
    /// The request parameters do not match the method.
    #[error("invalid params for {method}: {reason}")]
    InvalidParams {
        /// The JSON-RPC method.
        method: &'static str,
        /// What is wrong with the params.
        reason: String,
    },
    /// The request is well formed but cannot be served on this path.
    #[error("unsupported request: {0}")]
    Unsupported(&'static str),
    /// The address does not own the Safe.
    #[error("{0} is not a current owner")]
    NotAnOwner(Address),
    /// The typed data could not be hashed.
    #[error(transparent)]
    TypedData(#[from] alloy::dyn_abi::Error),
}

impl RequestError {
    /// Creates a new [`RequestError::InvalidParams`] error.
    pub fn invalid_params(method: &'static str, reason: impl ToString) -> Self {
        Self::InvalidParams { method, reason: reason.to_string() }
    }
}
