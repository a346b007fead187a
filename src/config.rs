//! Account configuration.
use crate::{
    constants::{DEFAULT_SAFE_SALT_NONCE, DEFAULT_SAFE_VERSION, DEFAULT_SETUP_RPC, PIMLICO_KEY_ENV},
    gas::GasMode,
    safe::salt_nonce_from_message,
    types::SafeDeployments,
};
use alloy::primitives::{U256, map::HashMap};
use alloy_chains::Chain;
use eyre::Context;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;
use url::Url;

/// Configuration of a Safe account and the chains it operates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeConfig {
    /// Chain configurations.
    #[serde(with = "crate::serde::chain_map")]
    pub chains: HashMap<Chain, ChainConfig>,
    /// Salt nonce of the Safe deployment. Selects one of the Safes the owner can have.
    #[serde(default = "default_salt_nonce")]
    pub safe_salt_nonce: U256,
    /// Version of the deployed Safe, which selects the message signing domain.
    #[serde(default = "default_safe_version")]
    pub safe_version: Version,
    /// Contract addresses.
    #[serde(default)]
    pub deployments: SafeDeployments,
    /// RPC used for chain independent reads, like the proxy creation code.
    #[serde(default = "default_setup_rpc")]
    pub setup_rpc: Url,
    /// How operations are paid for, unless a request says otherwise.
    #[serde(default)]
    pub gas: GasMode,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

impl Default for SafeConfig {
    fn default() -> Self {
        Self {
            chains: HashMap::default(),
            safe_salt_nonce: default_salt_nonce(),
            safe_version: default_safe_version(),
            deployments: SafeDeployments::default(),
            setup_rpc: default_setup_rpc(),
            gas: GasMode::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl SafeConfig {
    /// Adds a chain, replacing any previous configuration for it.
    pub fn with_chain(mut self, chain: impl Into<Chain>, config: ChainConfig) -> Self {
        self.chains.insert(chain.into(), config);
        self
    }

    /// Set the chains.
    pub fn with_chains(self, chains: HashMap<Chain, ChainConfig>) -> Self {
        Self { chains, ..self }
    }

    /// Sets the salt nonce.
    pub fn with_safe_salt_nonce(mut self, salt_nonce: U256) -> Self {
        self.safe_salt_nonce = salt_nonce;
        self
    }

    /// Sets the salt nonce to the one derived from `label`.
    ///
    /// See [`salt_nonce_from_message`].
    pub fn with_salt_label(self, label: &str) -> Self {
        self.with_safe_salt_nonce(salt_nonce_from_message(label))
    }

    /// Sets the Safe version.
    pub fn with_safe_version(mut self, version: Version) -> Self {
        self.safe_version = version;
        self
    }

    /// Sets the contract addresses.
    pub fn with_deployments(mut self, deployments: SafeDeployments) -> Self {
        self.deployments = deployments;
        self
    }

    /// Sets the setup RPC.
    pub fn with_setup_rpc(mut self, url: Url) -> Self {
        self.setup_rpc = url;
        self
    }

    /// Sets the default gas mode.
    pub fn with_gas_mode(mut self, gas: GasMode) -> Self {
        self.gas = gas;
        self
    }

    /// Sets the Pimlico API key.
    pub fn with_pimlico_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(api_key) = api_key {
            self.secrets.pimlico_api_key = Some(api_key);
        }
        self
    }

    /// Fills secrets missing from the file from the environment.
    pub fn with_env_secrets(mut self) -> Self {
        if self.secrets.pimlico_api_key.is_none() {
            self.secrets.pimlico_api_key = std::env::var(PIMLICO_KEY_ENV).ok();
        }
        if self.secrets.pimlico_api_key.is_none() {
            warn!("{PIMLICO_KEY_ENV} is not set, only configured bundler endpoints are available");
        }
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config.with_env_secrets())
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Chain configuration for individual chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The RPC endpoint used for chain reads.
    pub endpoint: Url,
    /// Bundler endpoint. Defaults to the Pimlico bundler of the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundler: Option<Url>,
}

impl ChainConfig {
    /// A chain read through `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint, bundler: None }
    }

    /// Sets the bundler endpoint.
    pub fn with_bundler(mut self, bundler: Url) -> Self {
        self.bundler = Some(bundler);
        self
    }
}

/// Secrets (kept out of serialized output).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsConfig {
    /// Key of the Pimlico bundler and policy APIs.
    #[serde(default)]
    pub pimlico_api_key: Option<String>,
}

fn default_salt_nonce() -> U256 {
    DEFAULT_SAFE_SALT_NONCE
}

fn default_safe_version() -> Version {
    Version::parse(DEFAULT_SAFE_VERSION).expect("valid default version")
}

fn default_setup_rpc() -> Url {
    Url::parse(DEFAULT_SETUP_RPC).expect("valid default setup rpc")
}
