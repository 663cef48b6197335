//! Block-anchored simulation snapshots.
//!
//! A [`SimulationScope`] lists what an interaction touches. A [`SimulationService`] turns it into
//! a [`SimulationSnapshot`] as of the scope's anchor block, and the [`SimulationStateBuilder`]
//! keeps the published [`SimulationState`] in sync with the latest scope.

mod builder;
pub use builder::{SimulationState, SimulationStateBuilder};

mod error;
pub use error::{
    CategoryErrors, GlobalError, SimulationError, SimulationErrorCategories,
    simulation_error_message,
};

mod scope;
pub use scope::{AnchorBlock, SimulationScope, build_scope};

mod service;
pub use service::{RpcSimulationService, SimulationResponse, SimulationService};

mod snapshot;
pub use snapshot::{GlobalState, Holding, Market, SimulationSnapshot, UserState};
