use alloy::primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// The `GetVaultDisplay` document.
pub const GET_VAULT_DISPLAY: &str = r#"query GetVaultDisplay($address: String!, $chainId: Int) {
  vaultByAddress(address: $address, chainId: $chainId) {
    whitelisted
    name
    address
    symbol
    liquidity {
      underlying
      usd
    }
    asset {
      address
      symbol
      name
      decimals
      priceUsd
      tags
      logoURI
      chain {
        id
      }
    }
    metadata {
      description
      image
      curators {
        image
        name
      }
    }
    state {
      allocation {
        supplyAssets
        supplyAssetsUsd
        market {
          uniqueKey
          collateralAsset {
            address
            symbol
            name
            decimals
            priceUsd
            tags
            logoURI
            chain {
              id
            }
          }
        }
      }
    }
    allocators {
      address
    }
    chain {
      id
      network
    }
    creationBlockNumber
    creationTimestamp
    creatorAddress
    factory {
      address
    }
  }
}"#;

/// A GraphQL request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphQlRequest<V> {
    pub(crate) operation_name: &'static str,
    pub(crate) query: &'static str,
    pub(crate) variables: V,
}

/// Variables of [`GET_VAULT_DISPLAY`].
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VaultByAddressVariables {
    pub(crate) address: Address,
    pub(crate) chain_id: ChainId,
}

impl GraphQlRequest<VaultByAddressVariables> {
    pub(crate) fn vault_display(address: Address, chain_id: ChainId) -> Self {
        Self {
            operation_name: "GetVaultDisplay",
            query: GET_VAULT_DISPLAY,
            variables: VaultByAddressVariables { address, chain_id },
        }
    }
}

/// A GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub(crate) data: Option<T>,
    #[serde(default)]
    pub(crate) errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VaultByAddressData<T> {
    pub(crate) vault_by_address: Option<T>,
}
