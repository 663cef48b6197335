use super::MathError;
use crate::bundle::BundleStage;
use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Errors returned by [`submit`](crate::bundle::submit).
#[derive(Debug, Error)]
pub enum BundleError {
    /// No account is connected.
    #[error("Please connect your wallet first")]
    NoAccount,
    /// The simulation snapshot is not loaded yet.
    #[error("Simulation state is still loading, please try again shortly.")]
    SimulationPending,
    /// The simulation snapshot failed to load.
    #[error("Error loading simulation state: {0}")]
    SimulationFailed(String),
    /// A stage after validation failed. Transactions sent before the failure stay on-chain.
    #[error("{message}")]
    Stage {
        /// The stage that failed.
        stage: BundleStage,
        /// The error message.
        message: String,
    },
}

impl BundleError {
    /// Returns `true` if the submission was rejected before any external call.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Stage { .. })
    }

    /// Returns the failed stage, if the error happened after validation.
    pub fn stage(&self) -> Option<BundleStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::NoAccount | Self::SimulationPending | Self::SimulationFailed(_) => None,
        }
    }
}

/// Errors returned by a [`Bundler`](crate::bundle::Bundler).
#[derive(Debug, Error)]
pub enum BundlerError {
    /// The snapshot does not contain the vault.
    #[error("vault {0} is not part of the simulation")]
    UnknownVault(Address),
    /// The snapshot does not contain the holding.
    #[error("holding of {token} by {user} is not part of the simulation")]
    UnknownHolding {
        /// The holder.
        user: Address,
        /// The token.
        token: Address,
    },
    /// The user does not hold enough of a token.
    #[error("insufficient balance of {token}: required {required}, available {available}")]
    InsufficientBalance {
        /// The token.
        token: Address,
        /// The required amount.
        required: U256,
        /// The available amount.
        available: U256,
    },
    /// The operation would produce nothing.
    #[error("operation on {0} would produce zero output")]
    ZeroOutput(Address),
    /// The operation cannot be handled by this bundler.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// Amount computation failed.
    #[error(transparent)]
    Math(#[from] MathError),
}
