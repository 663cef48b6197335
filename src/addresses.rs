//! Protocol contract addresses per chain.
//!
//! Resolution is a static table lookup. Unknown chains resolve to an [`AddressSet`] with every
//! entry absent, which callers treat as "feature unavailable".

use crate::constants::MAINNET_CHAIN_ID;
use alloy::primitives::{Address, ChainId, address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel address standing for the chain's native asset.
pub const NATIVE_ADDRESS: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Base chain id.
pub const BASE_CHAIN_ID: ChainId = 8453;

const MAINNET_WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
const MAINNET_WSTETH: Address = address!("7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0");
const MAINNET_STETH: Address = address!("ae7ab96520DE3A18E5e111B5EaAb095312D7fE84");
const MAINNET_SDAI: Address = address!("83F20F44975D03b1b09e64809B757c47f942BEeA");
const MAINNET_USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

const BASE_WETH: Address = address!("4200000000000000000000000000000000000006");
const BASE_WSTETH: Address = address!("c1CBa3fCea344f92D9239c08C0568f6F2F0ee452");
const BASE_USDC: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

const MORPHO: Address = address!("BBBBBbbBBb9cC5e90e3b3Af64bdAF62C37EEFFCb");

/// Protocol contract addresses of a chain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSet {
    /// The Morpho Blue singleton.
    pub morpho: Option<Address>,
    /// The bundler contract.
    pub bundler: Option<Address>,
    /// The wrapped native token (eg. WETH).
    pub wrapped_native: Option<Address>,
    /// The wrapped staked ether token (wstETH).
    pub wrapped_staked_ether: Option<Address>,
}

impl AddressSet {
    /// Returns `true` if no address is known, ie. the chain is not supported.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Returns the protocol addresses of the given chain.
///
/// Test forks must be remapped by the caller, see
/// [`ChainContext::effective_chain_id`](crate::context::ChainContext::effective_chain_id).
pub fn resolve(chain_id: ChainId) -> AddressSet {
    match chain_id {
        MAINNET_CHAIN_ID => AddressSet {
            morpho: Some(MORPHO),
            bundler: Some(address!("4095F064B8d3c3548A3bebfd0Bbfd04750E30077")),
            wrapped_native: Some(MAINNET_WETH),
            wrapped_staked_ether: Some(MAINNET_WSTETH),
        },
        BASE_CHAIN_ID => AddressSet {
            morpho: Some(MORPHO),
            bundler: Some(address!("23055618898e202386e6c13955a58D3C68200BFB")),
            wrapped_native: Some(BASE_WETH),
            wrapped_staked_ether: Some(BASE_WSTETH),
        },
        _ => AddressSet::default(),
    }
}

/// Returns the tokens that support a simple EIP-2612 permit on the given chain.
///
/// This is the default permit-signature policy applied when populating a bundle.
pub fn simple_permit_tokens(chain_id: ChainId) -> BTreeSet<Address> {
    match chain_id {
        MAINNET_CHAIN_ID => BTreeSet::from([MAINNET_WSTETH, MAINNET_SDAI, MAINNET_USDC]),
        BASE_CHAIN_ID => BTreeSet::from([BASE_USDC, BASE_WSTETH]),
        _ => BTreeSet::new(),
    }
}

/// Returns the token obtained by unwrapping `token`, if it is a known wrapper.
pub fn unwrapped_token(token: Address, chain_id: ChainId) -> Option<Address> {
    match (chain_id, token) {
        (MAINNET_CHAIN_ID, MAINNET_WETH) | (BASE_CHAIN_ID, BASE_WETH) => Some(NATIVE_ADDRESS),
        (MAINNET_CHAIN_ID, MAINNET_WSTETH) => Some(MAINNET_STETH),
        _ => None,
    }
}
