use crate::types::MarketId;
use alloy::primitives::{Address, ChainId, U256};
use serde::{Deserialize, Serialize};

/// Vault metadata as displayed by the Morpho API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDisplay {
    /// Whether the vault is listed by Morpho.
    pub whitelisted: bool,
    /// Vault name.
    pub name: String,
    /// Vault address.
    pub address: Address,
    /// Share symbol.
    pub symbol: String,
    /// Block the vault was created in.
    pub creation_block_number: u64,
    /// Creation timestamp, in seconds.
    #[serde(with = "crate::serde::big_int")]
    pub creation_timestamp: U256,
    /// Vault creator.
    pub creator_address: Option<Address>,
    /// Available liquidity.
    pub liquidity: Option<VaultLiquidity>,
    /// The underlying asset.
    pub asset: ApiAsset,
    /// Curated metadata.
    pub metadata: Option<VaultMetadata>,
    /// Current allocation.
    pub state: Option<VaultState>,
    /// Allocator accounts.
    pub allocators: Option<Vec<VaultAllocator>>,
    /// The vault chain.
    pub chain: ApiChain,
    /// The factory that deployed the vault.
    pub factory: VaultFactory,
}

impl VaultDisplay {
    /// Returns the allocation of the vault, empty if unknown.
    pub fn allocation(&self) -> &[VaultAllocation] {
        self.state.as_ref().and_then(|state| state.allocation.as_deref()).unwrap_or_default()
    }
}

/// Liquidity of a vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultLiquidity {
    /// Liquidity in underlying units.
    #[serde(with = "crate::serde::big_int")]
    pub underlying: U256,
    /// Liquidity in USD.
    pub usd: f64,
}

/// A token known to the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAsset {
    /// Token address.
    pub address: Address,
    /// Token symbol.
    pub symbol: String,
    /// Token name.
    pub name: String,
    /// Token decimals.
    pub decimals: u8,
    /// Token price in USD.
    pub price_usd: Option<f64>,
    /// Token tags.
    pub tags: Option<Vec<String>>,
    /// Token logo.
    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,
    /// Token chain.
    pub chain: AssetChain,
}

/// Chain of an [`ApiAsset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetChain {
    /// Chain id.
    pub id: ChainId,
}

/// Chain of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiChain {
    /// Chain id.
    pub id: ChainId,
    /// Network name.
    pub network: String,
}

/// Curated vault metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    /// Vault description.
    pub description: String,
    /// Vault image.
    pub image: String,
    /// Vault curators.
    pub curators: Vec<VaultCurator>,
}

/// A vault curator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultCurator {
    /// Curator image.
    pub image: String,
    /// Curator name.
    pub name: String,
}

/// Vault state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultState {
    /// Allocation across markets.
    pub allocation: Option<Vec<VaultAllocation>>,
}

/// Supply of a vault into one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultAllocation {
    /// Supplied assets.
    #[serde(with = "crate::serde::big_int")]
    pub supply_assets: U256,
    /// Supplied assets in USD.
    pub supply_assets_usd: Option<f64>,
    /// The market.
    pub market: AllocationMarket,
}

/// Market of a [`VaultAllocation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationMarket {
    /// Market id.
    pub unique_key: MarketId,
    /// Collateral token, absent for idle markets.
    pub collateral_asset: Option<ApiAsset>,
}

/// A vault allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAllocator {
    /// Allocator address.
    pub address: Address,
}

/// A vault factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultFactory {
    /// Factory address.
    pub address: Address,
}
