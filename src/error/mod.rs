//! Vault kit error types.

mod api;
pub use api::ApiError;

mod bundle;
pub use bundle::{BundleError, BundlerError};

mod chain;
pub use chain::ChainReadError;

mod input;
pub use input::InputError;

mod position;
pub use position::PositionError;

mod wallet;
pub use wallet::WalletError;

pub use crate::{math::MathError, simulation::SimulationError};
