//! Pimlico bundler endpoints and sponsorship policies.

use crate::{
    bundler::Erc4337Bundler,
    constants::PIMLICO_API_URL,
    error::BundlerError,
    types::{SponsorshipPoliciesResponse, SponsorshipPolicy},
};
use alloy::primitives::{Address, ChainId};
use tracing::{debug, instrument};
use url::Url;

/// Client of the Pimlico API.
#[derive(Clone)]
pub struct PimlicoClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for PimlicoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PimlicoClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl PimlicoClient {
    /// Creates a client authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, PIMLICO_API_URL)
    }

    /// Creates a client against another deployment of the API.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The bundler endpoint for `chain_id`. Contains the API key.
    pub fn bundler_url(&self, chain_id: ChainId) -> Result<Url, BundlerError> {
        let url = format!("{}/{chain_id}/rpc?apikey={}", self.base_url, self.api_key);
        Url::parse(&url).map_err(|err| BundlerError::Transport(err.to_string()))
    }

    /// A bundler client for `chain_id`.
    pub fn bundler(
        &self,
        chain_id: ChainId,
        entry_point: Address,
    ) -> Result<Erc4337Bundler, BundlerError> {
        Ok(Erc4337Bundler::new(self.bundler_url(chain_id)?, entry_point, chain_id))
    }

    /// Every sponsorship policy of the account.
    #[instrument(skip(self))]
    pub async fn sponsorship_policies(&self) -> Result<Vec<SponsorshipPolicy>, BundlerError> {
        let url = format!("{}/account/sponsorship_policies?apikey={}", self.base_url, self.api_key);
        let response: SponsorshipPoliciesResponse =
            self.http.get(url).send().await?.error_for_status()?.json().await?;
        debug!(count = response.data.len(), "fetched sponsorship policies");
        Ok(response.data)
    }

    /// Sponsorship policies applying to `chain_id`.
    pub async fn policies_for_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<SponsorshipPolicy>, BundlerError> {
        Ok(filter_by_chain(self.sponsorship_policies().await?, chain_id))
    }

    /// The sponsorship policy named `name`.
    pub async fn policy_by_name(&self, name: &str) -> Result<SponsorshipPolicy, BundlerError> {
        select_by_name(self.sponsorship_policies().await?, name)
    }

    /// The sponsorship policy with id `id`.
    pub async fn policy_by_id(&self, id: &str) -> Result<SponsorshipPolicy, BundlerError> {
        select_by_id(self.sponsorship_policies().await?, id)
    }
}

fn filter_by_chain(policies: Vec<SponsorshipPolicy>, chain_id: ChainId) -> Vec<SponsorshipPolicy> {
    policies.into_iter().filter(|policy| policy.supports_chain(chain_id)).collect()
}

fn select_by_name(
    policies: Vec<SponsorshipPolicy>,
    name: &str,
) -> Result<SponsorshipPolicy, BundlerError> {
    let (mut matching, others): (Vec<_>, Vec<_>) =
        policies.into_iter().partition(|policy| policy.policy_name == name);

    match matching.len() {
        0 => Err(BundlerError::PolicyNotFound {
            field: "policy_name",
            value: name.to_string(),
            available: others.into_iter().map(|policy| policy.policy_name).collect(),
        }),
        1 => Ok(matching.remove(0)),
        _ => Err(BundlerError::AmbiguousPolicy {
            name: name.to_string(),
            ids: matching.into_iter().map(|policy| policy.id).collect(),
        }),
    }
}

// ids are unique
fn select_by_id(policies: Vec<SponsorshipPolicy>, id: &str) -> Result<SponsorshipPolicy, BundlerError> {
    let available: Vec<String> = policies.iter().map(|policy| policy.id.clone()).collect();
    policies.into_iter().find(|policy| policy.id == id).ok_or_else(|| {
        BundlerError::PolicyNotFound { field: "id", value: id.to_string(), available }
    })
}
