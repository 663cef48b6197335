//! Client of the Morpho GraphQL API.
//!
//! [`VaultApiClient`] follows a cache-and-network policy: [`VaultApiClient::cached`] answers
//! immediately with the last known value, [`VaultApiClient::fetch`] always goes to the network and
//! refreshes the cache.

mod query;
pub use query::GET_VAULT_DISPLAY;

mod types;
pub use types::*;

use crate::error::ApiError;
use alloy::primitives::{Address, ChainId, map::HashMap};
use query::{GraphQlRequest, GraphQlResponse, VaultByAddressData};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

/// GraphQL client for vault metadata.
#[derive(Debug, Clone)]
pub struct VaultApiClient {
    http_client: Client,
    endpoint: Url,
    cache: Arc<RwLock<HashMap<(Address, ChainId), VaultDisplay>>>,
}

impl VaultApiClient {
    /// Creates a client of the API at `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self { http_client: Client::new(), endpoint, cache: Default::default() }
    }

    /// Returns the endpoint of the API.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the last fetched display data of a vault, if any.
    pub async fn cached(&self, address: Address, chain_id: ChainId) -> Option<VaultDisplay> {
        self.cache.read().await.get(&(address, chain_id)).cloned()
    }

    /// Fetches the display data of a vault and refreshes the cache.
    #[instrument(skip(self))]
    pub async fn fetch(&self, address: Address, chain_id: ChainId) -> Result<VaultDisplay, ApiError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&GraphQlRequest::vault_display(address, chain_id))
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQlResponse<VaultByAddressData<VaultDisplay>>>()
            .await?;

        let vault = into_vault(response, address, chain_id)?;
        debug!(name = %vault.name, "Fetched vault display");
        self.store(vault.clone(), chain_id).await;

        Ok(vault)
    }

    /// Fetches the display data of a vault, answering from the cache if the API is unreachable.
    ///
    /// API answers, including errors, are authoritative. Without a cached value the request
    /// error is returned.
    pub async fn fetch_or_cached(
        &self,
        address: Address,
        chain_id: ChainId,
    ) -> Result<VaultDisplay, ApiError> {
        match self.fetch(address, chain_id).await {
            Err(ApiError::Http(err)) => match self.cached(address, chain_id).await {
                Some(vault) => {
                    warn!(%err, %address, "Vault API unreachable, using cached display");
                    Ok(vault)
                }
                None => Err(ApiError::Http(err)),
            },
            result => result,
        }
    }

    async fn store(&self, vault: VaultDisplay, chain_id: ChainId) {
        self.cache.write().await.insert((vault.address, chain_id), vault);
    }
}

fn into_vault(
    response: GraphQlResponse<VaultByAddressData<VaultDisplay>>,
    address: Address,
    chain_id: ChainId,
) -> Result<VaultDisplay, ApiError> {
    if !response.errors.is_empty() {
        return Err(ApiError::GraphQl(response.errors.into_iter().map(|err| err.message).collect()));
    }

    response
        .data
        .and_then(|data| data.vault_by_address)
        .ok_or(ApiError::VaultNotFound { address, chain_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{U256, address, b256};

    const VAULT: Address = address!("2371e134e3455e0593363cBF89d3b6cf53740618");

    const FIXTURE: &str = r#"{
      "data": {
        "vaultByAddress": {
          "whitelisted": true,
          "name": "Gauntlet WETH Prime",
          "address": "0x2371e134e3455e0593363cBF89d3b6cf53740618",
          "symbol": "gtWETH",
          "liquidity": { "underlying": "12345678901234567890123", "usd": 41234567.89 },
          "asset": {
            "address": "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2",
            "symbol": "WETH",
            "name": "Wrapped Ether",
            "decimals": 18,
            "priceUsd": 3340.12,
            "tags": ["blue-chip"],
            "logoURI": "https://cdn.morpho.org/assets/logos/weth.svg",
            "chain": { "id": 1 }
          },
          "metadata": {
            "description": "WETH vault curated by Gauntlet.",
            "image": "https://cdn.morpho.org/v2/assets/images/gauntlet.svg",
            "curators": [{ "image": "https://cdn.morpho.org/gauntlet.svg", "name": "Gauntlet" }]
          },
          "state": {
            "allocation": [
              {
                "supplyAssets": "5000000000000000000000",
                "supplyAssetsUsd": 16700600.0,
                "market": {
                  "uniqueKey": "0xb8fc70e82bc5bb53e773626fcc6a23f7eefa036918d7ef216ecfb1950a94a85e",
                  "collateralAsset": {
                    "address": "0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0",
                    "symbol": "wstETH",
                    "name": "Wrapped liquid staked Ether 2.0",
                    "decimals": 18,
                    "priceUsd": null,
                    "tags": null,
                    "logoURI": null,
                    "chain": { "id": 1 }
                  }
                }
              },
              {
                "supplyAssets": 0,
                "supplyAssetsUsd": null,
                "market": {
                  "uniqueKey": "0x58e212060645d18eab6d9b2af3d56fbc906a92ff5667385f616f662c70372284",
                  "collateralAsset": null
                }
              }
            ]
          },
          "allocators": [{ "address": "0xfd32fA2ca22c76dD6E550706Ad913FC6CE91c75D" }],
          "chain": { "id": 1, "network": "ethereum" },
          "creationBlockNumber": 19613955,
          "creationTimestamp": "1712767583",
          "creatorAddress": null,
          "factory": { "address": "0xA9c3D3a366466Fa809d1Ae982Fb2c46E5fC41101" }
        }
      }
    }"#;

    #[test]
    fn decodes_vault_display() {
        let response = serde_json::from_str(FIXTURE).unwrap();
        let vault = into_vault(response, VAULT, 1).unwrap();

        assert_eq!(vault.address, VAULT);
        assert_eq!(vault.symbol, "gtWETH");
        assert_eq!(
            vault.liquidity.as_ref().unwrap().underlying,
            U256::from_str_radix("12345678901234567890123", 10).unwrap()
        );
        assert_eq!(vault.creation_timestamp, U256::from(1712767583u64));
        assert_eq!(vault.asset.logo_uri.as_deref(), Some("https://cdn.morpho.org/assets/logos/weth.svg"));
        assert_eq!(vault.allocation().len(), 2);
        assert_eq!(
            vault.allocation()[0].market.unique_key,
            b256!("b8fc70e82bc5bb53e773626fcc6a23f7eefa036918d7ef216ecfb1950a94a85e")
        );
        assert_eq!(vault.allocation()[1].supply_assets, U256::ZERO);
        assert!(vault.allocation()[1].market.collateral_asset.is_none());
        assert_eq!(vault.chain.network, "ethereum");
    }

    #[test]
    fn graphql_errors_are_surfaced() {
        let response = serde_json::from_str(
            r#"{"data":null,"errors":[{"message":"No results matching given parameters"}]}"#,
        )
        .unwrap();
        let err = into_vault(response, VAULT, 1).unwrap_err();
        assert_eq!(err.to_string(), "graphql errors: No results matching given parameters");
    }

    #[test]
    fn missing_vault_is_not_found() {
        let response = serde_json::from_str(r#"{"data":{"vaultByAddress":null}}"#).unwrap();
        assert!(matches!(
            into_vault(response, VAULT, 8453).unwrap_err(),
            ApiError::VaultNotFound { address: VAULT, chain_id: 8453 }
        ));
    }

    #[tokio::test]
    async fn cache_is_keyed_by_chain() {
        let client = VaultApiClient::new(Url::parse(crate::constants::DEFAULT_API_URL).unwrap());
        assert!(client.cached(VAULT, 1).await.is_none());

        let response = serde_json::from_str(FIXTURE).unwrap();
        client.store(into_vault(response, VAULT, 1).unwrap(), 1).await;

        assert_eq!(client.cached(VAULT, 1).await.unwrap().name, "Gauntlet WETH Prime");
        assert!(client.cached(VAULT, 8453).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_api_falls_back_to_cache() {
        // nothing listens on port 1
        let client = VaultApiClient::new(Url::parse("http://127.0.0.1:1/graphql").unwrap());
        assert!(matches!(client.fetch_or_cached(VAULT, 1).await, Err(ApiError::Http(_))));

        let response = serde_json::from_str(FIXTURE).unwrap();
        client.store(into_vault(response, VAULT, 1).unwrap(), 1).await;

        let vault = client.fetch_or_cached(VAULT, 1).await.unwrap();
        assert_eq!(vault.symbol, "gtWETH");
        assert!(client.fetch_or_cached(VAULT, 8453).await.is_err());
    }

    #[test]
    fn request_carries_variables() {
        let body = serde_json::to_value(GraphQlRequest::vault_display(VAULT, 1)).unwrap();
        assert_eq!(body["operationName"], "GetVaultDisplay");
        assert_eq!(body["variables"]["chainId"], 1);
        assert_eq!(
            body["variables"]["address"].as_str().unwrap().to_lowercase(),
            "0x2371e134e3455e0593363cbf89d3b6cf53740618"
        );
    }
}
