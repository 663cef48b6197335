use alloy::sol;

sol! {
    /// The subset of the MetaMorpho vault interface used by vault kit.
    ///
    /// MetaMorpho vaults are ERC-4626 vaults with a fixed decimals offset.
    #[sol(rpc)]
    #[derive(Debug)]
    interface IMetaMorpho {
        function asset() external view returns (address);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalAssets() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function DECIMALS_OFFSET() external view returns (uint8);
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function redeem(uint256 shares, address receiver, address owner)
            external
            returns (uint256 assets);
    }
}
