use crate::{constants::SIMULATION_MARKET_IDS, context::ChainContext, types::MarketId};
use alloy::primitives::Address;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The block a simulation snapshot is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorBlock {
    /// Block number.
    pub number: u64,
    /// Block timestamp.
    pub timestamp: u64,
}

/// Everything a simulation snapshot covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationScope {
    /// The targeted chain.
    pub chain: ChainContext,
    /// Markets to load.
    pub market_ids: Vec<MarketId>,
    /// Users whose state is loaded: the account, the bundler and the vault.
    pub users: Vec<Address>,
    /// Tokens to load. Unknown wrappers are replaced by [`Address::ZERO`].
    pub tokens: Vec<Address>,
    /// Vaults to load.
    pub vaults: Vec<Address>,
    /// The anchor block. Nothing is fetched until it is known.
    pub block: Option<AnchorBlock>,
}

impl SimulationScope {
    /// Replaces the market allow-list.
    pub fn with_market_ids(mut self, market_ids: Vec<MarketId>) -> Self {
        self.market_ids = market_ids;
        self
    }
}

/// Builds the scope of an interaction of `account` with `vault`.
pub fn build_scope(
    account: Option<Address>,
    vault: Address,
    chain: &ChainContext,
    block: Option<AnchorBlock>,
) -> SimulationScope {
    let addresses = chain.addresses();

    SimulationScope {
        chain: *chain,
        market_ids: SIMULATION_MARKET_IDS.to_vec(),
        users: [account, addresses.bundler, Some(vault)].into_iter().flatten().unique().collect(),
        tokens: vec![
            addresses.wrapped_native.unwrap_or(Address::ZERO),
            addresses.wrapped_staked_ether.unwrap_or(Address::ZERO),
            vault,
        ],
        vaults: vec![vault],
        block,
    }
}
