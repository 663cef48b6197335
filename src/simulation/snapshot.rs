use super::AnchorBlock;
use crate::{
    provider::{MarketParams, MarketPosition, MarketTotals, TokenInfo, VaultInfo},
    types::MarketId,
};
use alloy::primitives::{Address, ChainId, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Protocol-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalState {
    /// The Morpho fee recipient.
    pub fee_recipient: Option<Address>,
}

/// A Morpho Blue market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Market id.
    pub id: MarketId,
    /// Market parameters.
    pub params: MarketParams,
    /// Market totals.
    pub totals: MarketTotals,
}

/// Morpho-level state of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    /// The user.
    pub address: Address,
    /// Whether the bundler may manage the user's Morpho positions.
    pub is_bundler_authorized: bool,
    /// The user's Morpho signature nonce.
    pub morpho_nonce: U256,
}

/// A user's balance of a token and its allowances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// The holder.
    pub user: Address,
    /// The token.
    pub token: Address,
    /// The balance.
    pub balance: U256,
    /// Allowances per spender.
    pub allowances: BTreeMap<Address, U256>,
}

impl Holding {
    /// Returns the allowance granted to `spender`, zero if unknown.
    pub fn allowance(&self, spender: Address) -> U256 {
        self.allowances.get(&spender).copied().unwrap_or_default()
    }
}

/// On-chain state as of a single block.
///
/// A snapshot is a value: it is never updated in place and a newer block produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// The chain the state was read from.
    pub chain_id: ChainId,
    /// The block the state was read at.
    pub block: AnchorBlock,
    /// Protocol-wide state.
    pub global: GlobalState,
    /// Markets by id.
    pub markets: BTreeMap<MarketId, Market>,
    /// Users by address.
    pub users: BTreeMap<Address, UserState>,
    /// Tokens by address.
    pub tokens: BTreeMap<Address, TokenInfo>,
    /// Vaults by address.
    pub vaults: BTreeMap<Address, VaultInfo>,
    /// Holdings by user, then token.
    pub holdings: BTreeMap<Address, BTreeMap<Address, Holding>>,
    /// Market positions by user, then market.
    pub positions: BTreeMap<Address, BTreeMap<MarketId, MarketPosition>>,
}

impl SimulationSnapshot {
    /// Creates an empty snapshot.
    pub fn new(chain_id: ChainId, block: AnchorBlock) -> Self {
        Self {
            chain_id,
            block,
            global: GlobalState::default(),
            markets: BTreeMap::new(),
            users: BTreeMap::new(),
            tokens: BTreeMap::new(),
            vaults: BTreeMap::new(),
            holdings: BTreeMap::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Returns the state of `vault`.
    pub fn vault(&self, vault: Address) -> Option<&VaultInfo> {
        self.vaults.get(&vault)
    }

    /// Returns the holding of `token` by `user`.
    pub fn holding(&self, user: Address, token: Address) -> Option<&Holding> {
        self.holdings.get(&user)?.get(&token)
    }

    /// Records a holding.
    pub fn insert_holding(&mut self, holding: Holding) {
        self.holdings.entry(holding.user).or_default().insert(holding.token, holding);
    }

    /// Records a market position.
    pub fn insert_position(&mut self, user: Address, id: MarketId, position: MarketPosition) {
        self.positions.entry(user).or_default().insert(id, position);
    }
}
