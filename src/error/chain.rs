use alloy::primitives::Address;
use thiserror::Error;

/// Errors related to on-chain reads.
#[derive(Debug, Error)]
pub enum ChainReadError {
    /// A contract call failed.
    #[error("failed to read `{method}` on {address}: {source}")]
    Contract {
        /// The called method.
        method: &'static str,
        /// The called contract.
        address: Address,
        /// The underlying error.
        source: alloy::contract::Error,
    },
    /// The block could not be found.
    #[error("block not found")]
    MissingBlock,
    /// An error occurred talking to RPC.
    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),
}

impl ChainReadError {
    /// Returns a closure wrapping a contract error with the call that produced it.
    pub fn contract(
        method: &'static str,
        address: Address,
    ) -> impl FnOnce(alloy::contract::Error) -> Self {
        move |source| Self::Contract { method, address, source }
    }
}
