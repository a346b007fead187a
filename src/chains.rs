//! A collection of providers and bundlers for different chains.

use crate::{
    bundler::Erc4337Bundler,
    config::SafeConfig,
    error::SafeError,
    pimlico::PimlicoClient,
    transport::{RETRY_LAYER, create_transport},
};
use alloy::{
    primitives::{ChainId, map::HashMap},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::ClientBuilder,
};
use tracing::info;

/// A single supported chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Provider for the chain.
    pub provider: DynProvider,
    /// Bundler serving the chain, if one is known.
    pub bundler: Option<Erc4337Bundler>,
    /// The chain ID.
    pub chain_id: ChainId,
}

impl Chain {
    /// A chain without a bundler.
    pub fn new(chain_id: ChainId, provider: DynProvider) -> Self {
        Self { provider, bundler: None, chain_id }
    }

    /// Sets the bundler.
    pub fn with_bundler(mut self, bundler: Erc4337Bundler) -> Self {
        self.bundler = Some(bundler);
        self
    }

    /// The bundler serving the chain.
    pub fn bundler(&self) -> Result<&Erc4337Bundler, SafeError> {
        self.bundler.as_ref().ok_or(SafeError::UnsupportedChain(self.chain_id))
    }
}

/// A collection of providers for different chains.
#[derive(Clone, Default)]
pub struct Chains {
    chains: HashMap<ChainId, Chain>,
}

impl Chains {
    /// Creates a new instance of [`Chains`].
    pub fn new(chains: impl IntoIterator<Item = Chain>) -> Self {
        Self { chains: chains.into_iter().map(|chain| (chain.chain_id, chain)).collect() }
    }

    /// Connects to every configured chain.
    ///
    /// Providers retry failed reads. Bundlers come from the chain configuration, or from Pimlico
    /// when an API key is available.
    pub async fn from_config(config: &SafeConfig) -> eyre::Result<Self> {
        let pimlico = config.secrets.pimlico_api_key.clone().map(PimlicoClient::new);

        let chains = futures_util::future::try_join_all(config.chains.iter().map(
            |(chain, chain_config)| {
                let pimlico = pimlico.clone();
                async move {
                    let (transport, is_local) = create_transport(&chain_config.endpoint).await?;
                    let client = ClientBuilder::default()
                        .layer(RETRY_LAYER)
                        .transport(transport, is_local);
                    let provider = ProviderBuilder::new().connect_client(client).erased();

                    let chain_id = provider.get_chain_id().await?;
                    if chain_id != chain.id() {
                        eyre::bail!("endpoint for {chain} serves chain {chain_id}");
                    }

                    let entry_point = config.deployments.entry_point;
                    let bundler = match (&chain_config.bundler, pimlico) {
                        (Some(url), _) => {
                            Some(Erc4337Bundler::new(url.clone(), entry_point, chain_id))
                        }
                        (None, Some(pimlico)) => Some(pimlico.bundler(chain_id, entry_point)?),
                        (None, None) => None,
                    };
                    info!(%chain, has_bundler = bundler.is_some(), "connected chain");

                    eyre::Ok(Chain { provider, bundler, chain_id })
                }
            },
        ))
        .await?;

        Ok(Self::new(chains))
    }

    /// Get a chain for a given chain ID.
    pub fn get(&self, chain_id: ChainId) -> Result<&Chain, SafeError> {
        self.chains.get(&chain_id).ok_or(SafeError::UnsupportedChain(chain_id))
    }

    /// Get an iterator over the supported chain IDs.
    pub fn chain_ids_iter(&self) -> impl Iterator<Item = &ChainId> {
        self.chains.keys()
    }
}

impl std::fmt::Debug for Chains {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chains").field("providers", &self.chains.keys()).finish()
    }
}
