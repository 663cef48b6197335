use super::{ChainReadError, MathError};
use alloy::primitives::Address;
use thiserror::Error;

/// Errors related to position derivation.
#[derive(Debug, Error)]
pub enum PositionError {
    /// The vault has no shares outstanding, so it has no share price.
    #[error("vault {0} has no supply")]
    EmptyVault(Address),
    /// Share conversion failed.
    #[error(transparent)]
    Math(#[from] MathError),
    /// An on-chain read failed.
    #[error(transparent)]
    Read(#[from] ChainReadError),
}
