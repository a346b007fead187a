//! Gas limit and paymaster negotiation.

use crate::{
    bundler::Erc4337Bundler,
    error::BundlerError,
    types::{PaymasterData, UnsignedUserOperation, UserOperation},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who pays for an operation, and how its gas limits are obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GasMode {
    /// A paymaster sponsors the operation and sets every limit.
    Sponsored {
        /// Sponsorship policy id, if the paymaster account has several.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<String>,
    },
    /// The Safe pays. Limits are estimated by the bundler.
    SelfFunded,
    /// The Safe pays. Static limits, no request is made.
    Fallback,
}

impl Default for GasMode {
    fn default() -> Self {
        Self::Sponsored { policy: None }
    }
}

impl GasMode {
    /// Sponsorship under `policy`.
    pub fn sponsored(policy: Option<String>) -> Self {
        Self::Sponsored { policy }
    }

    /// Returns `true` if a paymaster pays for the operation.
    pub fn is_sponsored(&self) -> bool {
        matches!(self, Self::Sponsored { .. })
    }

    /// Completes `op` with gas limits, and paymaster fields when sponsored.
    ///
    /// `deployed` only matters for [`GasMode::Fallback`], where validating an undeployed Safe
    /// gets a larger limit.
    pub async fn negotiate(
        &self,
        bundler: &Erc4337Bundler,
        op: UnsignedUserOperation,
        deployed: bool,
    ) -> Result<UserOperation, BundlerError> {
        let gas = match self {
            Self::Sponsored { policy } => {
                bundler.sponsor_user_operation(&op, policy.as_deref()).await?
            }
            Self::SelfFunded => bundler.estimate_user_operation_gas(&op).await?,
            Self::Fallback => PaymasterData::fallback(deployed),
        };
        debug!(mode = ?self, call_gas_limit = %gas.call_gas_limit, "negotiated gas");
        Ok(op.with_gas(gas))
    }
}
