use alloy::{primitives::B256, sol};

/// Identifier of a Morpho Blue market.
///
/// The id is the keccak256 hash of the ABI-encoded market params.
pub type MarketId = B256;

sol! {
    /// The subset of the Morpho Blue singleton interface read by the simulation.
    #[sol(rpc)]
    #[derive(Debug)]
    interface IMorpho {
        function feeRecipient() external view returns (address);
        function isAuthorized(address authorizer, address authorized) external view returns (bool);
        function nonce(address authorizer) external view returns (uint256);
        function idToMarketParams(bytes32 id)
            external
            view
            returns (address loanToken, address collateralToken, address oracle, address irm, uint256 lltv);
        function market(bytes32 id)
            external
            view
            returns (
                uint128 totalSupplyAssets,
                uint128 totalSupplyShares,
                uint128 totalBorrowAssets,
                uint128 totalBorrowShares,
                uint128 lastUpdate,
                uint128 fee
            );
        function position(bytes32 id, address user)
            external
            view
            returns (uint256 supplyShares, uint128 borrowShares, uint128 collateral);
    }
}
