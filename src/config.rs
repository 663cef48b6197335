//! Vault kit configuration.
use crate::{
    constants::{
        BLOCK_POLL_INTERVAL, DEFAULT_ANVIL_RPC_URL, DEFAULT_API_URL, DEFAULT_MAINNET_RPC_URL,
        DEFAULT_SLIPPAGE_TOLERANCE, DEFAULT_VAULT, POSITION_POLL_INTERVAL, SIMULATION_MARKET_IDS,
        TEST_FORK_CHAIN_ID,
    },
    types::MarketId,
};
use alloy::primitives::{Address, ChainId, U256, map::HashMap};
use alloy_chains::Chain;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Vault kit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultKitConfig {
    /// Chain the wallet connects to.
    #[serde(default = "Chain::mainnet")]
    pub chain: Chain,
    /// Chain configurations.
    #[serde(default, with = "crate::serde::hash_map")]
    pub chains: HashMap<Chain, ChainConfig>,
    /// Morpho API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Targeted vault.
    #[serde(default)]
    pub vault: VaultConfig,
    /// Refresh intervals.
    #[serde(default)]
    pub polling: PollingConfig,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

impl Default for VaultKitConfig {
    fn default() -> Self {
        Self {
            chain: Chain::mainnet(),
            chains: HashMap::default(),
            api: ApiConfig::default(),
            vault: VaultConfig::default(),
            polling: PollingConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl VaultKitConfig {
    /// Sets the chain the wallet connects to.
    pub fn with_chain(mut self, chain: Option<Chain>) -> Self {
        self.chain = chain.unwrap_or(self.chain);
        self
    }

    /// Sets the RPC endpoint of the connected chain.
    pub fn with_endpoint(mut self, endpoint: Option<Url>) -> Self {
        if let Some(endpoint) = endpoint {
            self.chains.insert(self.chain, ChainConfig { endpoint });
        }
        self
    }

    /// Adds the public mainnet and local anvil endpoints, unless already configured.
    pub fn with_default_endpoints(mut self) -> Result<Self, url::ParseError> {
        for (chain, endpoint) in [
            (Chain::mainnet(), DEFAULT_MAINNET_RPC_URL),
            (Chain::from_id(TEST_FORK_CHAIN_ID), DEFAULT_ANVIL_RPC_URL),
        ] {
            if !self.chains.contains_key(&chain) {
                self.chains.insert(chain, ChainConfig { endpoint: Url::parse(endpoint)? });
            }
        }
        Ok(self)
    }

    /// Sets the Morpho API endpoint.
    pub fn with_api_endpoint(mut self, endpoint: Option<Url>) -> Self {
        self.api.endpoint = endpoint.or(self.api.endpoint);
        self
    }

    /// Sets the targeted vault.
    pub fn with_vault(mut self, vault: Option<Address>) -> Self {
        self.vault.address = vault.unwrap_or(self.vault.address);
        self
    }

    /// Sets the slippage tolerance, in WAD.
    pub fn with_slippage_tolerance(mut self, slippage_tolerance: Option<U256>) -> Self {
        self.vault.slippage_tolerance = slippage_tolerance.unwrap_or(self.vault.slippage_tolerance);
        self
    }

    /// Sets the position refresh interval.
    pub fn with_position_interval(mut self, interval: Option<Duration>) -> Self {
        self.polling.position_interval = interval.unwrap_or(self.polling.position_interval);
        self
    }

    /// Sets the private key of the wallet.
    pub fn with_private_key(mut self, private_key: Option<String>) -> Self {
        self.secrets.private_key = private_key.or(self.secrets.private_key);
        self
    }

    /// Returns the RPC endpoint of a chain.
    pub fn endpoint(&self, chain_id: ChainId) -> Option<&Url> {
        self.chains.get(&Chain::from_id(chain_id)).map(|chain| &chain.endpoint)
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The RPC endpoint of the chain.
    pub endpoint: Url,
}

/// Morpho API configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// GraphQL endpoint. Defaults to the public Morpho API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Url>,
}

impl ApiConfig {
    /// Returns the configured endpoint or the public Morpho API.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        self.endpoint.clone().map_or_else(|| Url::parse(DEFAULT_API_URL), Ok)
    }
}

/// Vault configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// The vault address.
    pub address: Address,
    /// Markets loaded into simulation snapshots.
    pub market_ids: Vec<MarketId>,
    /// Slippage tolerance of deposits and withdrawals, in WAD.
    pub slippage_tolerance: U256,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT,
            market_ids: SIMULATION_MARKET_IDS.to_vec(),
            slippage_tolerance: DEFAULT_SLIPPAGE_TOLERANCE,
        }
    }
}

/// Refresh intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    /// Interval between two position refreshes.
    #[serde(with = "crate::serde::duration")]
    pub position_interval: Duration,
    /// Interval between two latest block lookups.
    #[serde(with = "crate::serde::duration")]
    pub block_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { position_interval: POSITION_POLL_INTERVAL, block_interval: BLOCK_POLL_INTERVAL }
    }
}

/// Secrets (kept out of serialized output).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SecretsConfig {
    /// The private key of the wallet. Without it the wallet is read-only.
    pub private_key: Option<String>,
}
