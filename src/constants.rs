//! Vault kit constants.

use crate::types::MarketId;
use alloy::primitives::{Address, ChainId, U256, address, b256};
use std::time::Duration;

/// The vault targeted when none is given.
pub const DEFAULT_VAULT: Address = address!("2371e134e3455e0593363cBF89d3b6cf53740618");

/// The Morpho GraphQL API endpoint.
pub const DEFAULT_API_URL: &str = "https://blue-api.morpho.org/graphql";

/// The public Ethereum mainnet RPC endpoint used in the default config.
pub const DEFAULT_MAINNET_RPC_URL: &str = "https://eth.llamarpc.com";

/// The local anvil endpoint used in the default config.
pub const DEFAULT_ANVIL_RPC_URL: &str = "http://127.0.0.1:8545";

/// Chain id reported by local test forks (anvil, hardhat).
///
/// Forks are remapped to mainnet for address resolution only.
pub const TEST_FORK_CHAIN_ID: ChainId = 31337;

/// Chain id used when no wallet is connected.
pub const MAINNET_CHAIN_ID: ChainId = 1;

/// Interval between two position or token balance refreshes.
pub const POSITION_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Interval between two latest block lookups.
pub const BLOCK_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Default slippage tolerance applied to vault operations, `0.03%` in WAD.
pub const DEFAULT_SLIPPAGE_TOLERANCE: U256 = U256::from_limbs([300_000_000_000_000, 0, 0, 0]);

/// Markets loaded into every simulation snapshot.
///
/// This is a fixed allow-list, not a resolver: markets outside of it are unknown to the
/// simulation.
pub const SIMULATION_MARKET_IDS: [MarketId; 8] = [
    // wstETH/WETH
    b256!("b8fc70e82bc5bb53e773626fcc6a23f7eefa036918d7ef216ecfb1950a94a85e"),
    // WBTC/WETH
    b256!("138eec0e4a1937eb92ebc70043ed539661dd7ed5a89fb92a720b341650288a40"),
    // wstETH/WETH
    b256!("d0e50cdac92fe2172043f5e0c36532c6369d24947e40968f34a5e8819ca9ec5d"),
    // wstETH/WETH
    b256!("c54d7acf14de29e0e5527cabd7a576506870346a78a11a6762e2cca66322ec41"),
    // rETH/WETH
    b256!("3c83f77bde9541f8d3d82533b19bbc1f97eb2f1098bb991728acbfbede09cc5d"),
    // cbBTC/WETH
    b256!("2cbfb38723a8d9a2ad1607015591a78cfe3a5949561b39bde42c242b22874ec0"),
    // sDAI/WETH
    b256!("1929f8139224cb7d5db8c270addc9ce366d37ad279e1135f73c0adce74b0f936"),
    // sUSDC/WETH
    b256!("58e212060645d18eab6d9b2af3d56fbc906a92ff5667385f616f662c70372284"),
];
