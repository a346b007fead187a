use alloy::primitives::ChainId;
use serde::{Deserialize, Serialize};

/// Chains a sponsorship policy applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAllowlist {
    /// Allowed chain ids. Empty means every chain.
    #[serde(default)]
    pub allowlist: Vec<ChainId>,
}

/// A paymaster sponsorship policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorshipPolicy {
    /// Policy id, passed to `pm_sponsorUserOperation`.
    pub id: String,
    /// Human readable name.
    pub policy_name: String,
    /// Chains the policy applies to.
    #[serde(default)]
    pub chain_ids: ChainAllowlist,
    /// Start of validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// End of validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl SponsorshipPolicy {
    /// Returns `true` if the policy may sponsor operations on `chain_id`.
    pub fn supports_chain(&self, chain_id: ChainId) -> bool {
        self.chain_ids.allowlist.is_empty() || self.chain_ids.allowlist.contains(&chain_id)
    }
}

/// Answer of the policy listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorshipPoliciesResponse {
    /// All policies of the account.
    pub data: Vec<SponsorshipPolicy>,
}
