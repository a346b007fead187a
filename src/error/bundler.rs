use alloy::transports::{RpcError, TransportErrorKind};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static API_KEY_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(apikey=)[^\s&]+").expect("valid api key pattern"));

/// Replaces the value of every `apikey=` query parameter in `message` with `***`.
pub fn strip_api_key(message: &str) -> String {
    API_KEY_PARAM.replace_all(message, "${1}***").into_owned()
}

/// Errors related to the bundler and paymaster APIs.
///
/// Every message carried by this type has been passed through [`strip_api_key`].
#[derive(Debug, Error)]
pub enum BundlerError {
    /// The API key was rejected. Never retried.
    #[error("Unauthorized request. Please check your Pimlico API key.")]
    Unauthorized,
    /// The bundler answered with a JSON-RPC error.
    #[error("bundler: rpc error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The error message.
        message: String,
    },
    /// The bundler could not be reached or answered garbage.
    #[error("bundler: {0}")]
    Transport(String),
    /// The policy API failed.
    #[error("Pimlico: {0}")]
    Http(String),
    /// No Pimlico API key is configured.
    #[error("Pimlico API key is not configured")]
    MissingApiKey,
    /// Submitting an operation failed.
    #[error("failed to send user op with: {0}")]
    SendUserOp(Box<BundlerError>),
    /// No sponsorship policy matched the lookup.
    #[error("no policy found with {field}={value}: try {available:?}")]
    PolicyNotFound {
        /// The field that was matched.
        field: &'static str,
        /// The value that was looked up.
        value: String,
        /// Values available for that field.
        available: Vec<String>,
    },
    /// Several sponsorship policies share the looked up name.
    #[error("multiple policies with policy_name={name}: {ids:?}")]
    AmbiguousPolicy {
        /// The looked up name.
        name: String,
        /// Ids of the matching policies.
        ids: Vec<String>,
    },
}

impl BundlerError {
    /// Returns `true` if the API key was rejected.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized => true,
            Self::SendUserOp(inner) => inner.is_unauthorized(),
            _ => false,
        }
    }
}

impl From<RpcError<TransportErrorKind>> for BundlerError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match &err {
            RpcError::Transport(TransportErrorKind::HttpError(http)) if http.status == 401 => {
                Self::Unauthorized
            }
            RpcError::ErrorResp(payload) => {
                Self::Rpc { code: payload.code, message: strip_api_key(&payload.message) }
            }
            _ => Self::Transport(strip_api_key(&err.to_string())),
        }
    }
}

impl From<reqwest::Error> for BundlerError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            return Self::Unauthorized;
        }
        Self::Http(strip_api_key(&err.to_string()))
    }
}
