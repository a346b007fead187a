//! The Safe account owned by the remote signer.

use crate::{error::SafeError, provider::ProviderExt, safe::SafeContractSuite};
use alloy::{
    primitives::{Address, Bytes, ChainId, U256, map::HashSet},
    providers::DynProvider,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Chains the account is known to be deployed on.
///
/// Entries are only ever added: a deployed Safe cannot be undeployed.
#[derive(Debug, Default)]
pub struct DeploymentCache {
    deployed: RwLock<HashSet<ChainId>>,
}

impl DeploymentCache {
    /// Returns `true` if the account was observed deployed on `chain_id`.
    pub async fn is_cached(&self, chain_id: ChainId) -> bool {
        self.deployed.read().await.contains(&chain_id)
    }

    /// Records that the account is deployed on `chain_id`.
    pub async fn mark_deployed(&self, chain_id: ChainId) {
        if self.deployed.write().await.insert(chain_id) {
            debug!(chain_id, "safe deployed");
        }
    }

    /// Returns whether `address` is deployed, reading the chain only while it is not.
    pub async fn is_deployed(
        &self,
        chain_id: ChainId,
        provider: &DynProvider,
        address: Address,
    ) -> Result<bool, SafeError> {
        if self.is_cached(chain_id).await {
            return Ok(true);
        }
        self.refresh(chain_id, provider, address).await
    }

    /// Reads the deployment status of `address` from the chain.
    pub async fn refresh(
        &self,
        chain_id: ChainId,
        provider: &DynProvider,
        address: Address,
    ) -> Result<bool, SafeError> {
        let deployed = provider.is_contract(address).await?;
        if deployed {
            self.mark_deployed(chain_id).await;
        }
        Ok(deployed)
    }
}

/// A Safe with a single owner and threshold 1.
#[derive(Debug)]
pub struct SafeAccount {
    address: Address,
    owner: Address,
    recovery_owner: Option<Address>,
    salt_nonce: U256,
    setup: Bytes,
    deployed: DeploymentCache,
}

impl SafeAccount {
    /// Derives the account of `owner` for `salt_nonce`.
    ///
    /// The address only depends on the setup and the salt nonce, the Safe does not need to be
    /// deployed.
    #[instrument(skip(suite))]
    pub async fn derive(
        suite: &SafeContractSuite,
        owner: Address,
        salt_nonce: U256,
    ) -> Result<Self, SafeError> {
        let setup = suite.get_setup(vec![owner]);
        let address = suite.address_for_setup(&setup, salt_nonce).await?;
        debug!(%address, "derived safe");
        Ok(Self {
            address,
            owner,
            recovery_owner: None,
            salt_nonce,
            setup,
            deployed: DeploymentCache::default(),
        })
    }

    /// Sets the owner to add for recovery.
    pub fn with_recovery_owner(mut self, recovery_owner: Address) -> Self {
        self.recovery_owner = Some(recovery_owner);
        self
    }

    /// The Safe address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The owner controlled by the remote signer.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The recovery owner, if any.
    pub fn recovery_owner(&self) -> Option<Address> {
        self.recovery_owner
    }

    /// The salt nonce of the deployment.
    pub fn salt_nonce(&self) -> U256 {
        self.salt_nonce
    }

    /// `Safe.setup` call data run on deployment.
    pub fn setup(&self) -> &Bytes {
        &self.setup
    }

    /// The setup and salt nonce needed to deploy the Safe.
    pub fn deployment_params(&self) -> (Bytes, U256) {
        (self.setup.clone(), self.salt_nonce)
    }

    /// Chains the Safe is known to be deployed on.
    pub fn deployments(&self) -> &DeploymentCache {
        &self.deployed
    }
}
