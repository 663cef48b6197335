use alloy::primitives::{Address, ChainId};
use thiserror::Error;

/// Errors related to the vault API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The API answered with GraphQL errors.
    #[error("graphql errors: {}", .0.join(", "))]
    GraphQl(Vec<String>),
    /// The API does not know the vault.
    #[error("vault {address} not found on chain {chain_id}")]
    VaultNotFound {
        /// The requested vault.
        address: Address,
        /// The requested chain.
        chain_id: ChainId,
    },
}
