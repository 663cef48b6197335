//! On-chain reads of ERC-20, ERC-4626 and Morpho Blue state.

use crate::{
    error::ChainReadError,
    simulation::AnchorBlock,
    types::{IERC20, IMetaMorpho, IMorpho, MarketId},
};
use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, U256},
    providers::Provider,
};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{instrument, trace};

/// Metadata of an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token address.
    pub address: Address,
    /// Token symbol. Some tokens do not implement it.
    pub symbol: Option<String>,
    /// Token decimals.
    pub decimals: u8,
}

/// State of an ERC-4626 vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultInfo {
    /// Vault address.
    pub address: Address,
    /// The underlying asset.
    pub asset: Address,
    /// Vault share symbol.
    pub symbol: String,
    /// Vault share decimals.
    pub decimals: u8,
    /// Total assets managed by the vault.
    pub total_assets: U256,
    /// Total shares outstanding.
    pub total_supply: U256,
    /// Decimals offset between shares and assets.
    pub decimals_offset: u8,
}

/// Parameters of a Morpho Blue market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketParams {
    /// The loan token.
    pub loan_token: Address,
    /// The collateral token.
    pub collateral_token: Address,
    /// The oracle.
    pub oracle: Address,
    /// The interest rate model.
    pub irm: Address,
    /// The liquidation loan-to-value, in WAD.
    pub lltv: U256,
}

/// Totals of a Morpho Blue market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTotals {
    /// Total supplied assets.
    pub total_supply_assets: u128,
    /// Total supply shares.
    pub total_supply_shares: u128,
    /// Total borrowed assets.
    pub total_borrow_assets: u128,
    /// Total borrow shares.
    pub total_borrow_shares: u128,
    /// Timestamp of the last interest accrual.
    pub last_update: u128,
    /// Market fee, in WAD.
    pub fee: u128,
}

/// A user's position in a Morpho Blue market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPosition {
    /// Supply shares.
    pub supply_shares: U256,
    /// Borrow shares.
    pub borrow_shares: u128,
    /// Collateral assets.
    pub collateral: u128,
}

/// Reads used by the position aggregator and the block watcher.
#[async_trait::async_trait]
pub trait ChainReader: Debug + Send + Sync {
    /// Returns the balance of `token` held by `owner`.
    async fn holding(&self, owner: Address, token: Address) -> Result<U256, ChainReadError>;

    /// Returns the state of `vault`.
    async fn vault(&self, vault: Address) -> Result<VaultInfo, ChainReadError>;

    /// Returns the metadata of `token`.
    async fn token(&self, token: Address) -> Result<TokenInfo, ChainReadError>;

    /// Returns the latest block.
    async fn latest_block(&self) -> Result<AnchorBlock, ChainReadError>;
}

/// A [`ChainReader`] backed by an alloy [`Provider`].
///
/// Reads target the latest block unless pinned with [`RpcChainReader::at_block`].
#[derive(Debug, Clone)]
pub struct RpcChainReader<P> {
    provider: P,
    block: BlockId,
}

impl<P> RpcChainReader<P> {
    /// Creates a reader of the latest state.
    pub fn new(provider: P) -> Self {
        Self { provider, block: BlockId::latest() }
    }

    /// Pins every read to the given block number.
    pub fn at_block(mut self, number: u64) -> Self {
        self.block = BlockId::number(number);
        self
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> RpcChainReader<P> {
    /// Returns the amount of `token` that `owner` allows `spender` to transfer.
    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
        token: Address,
    ) -> Result<U256, ChainReadError> {
        IERC20::new(token, &self.provider)
            .allowance(owner, spender)
            .block(self.block)
            .call()
            .await
            .map_err(ChainReadError::contract("allowance", token))
    }

    /// Returns the decimals offset of a vault, zero if the vault does not expose one.
    pub async fn decimals_offset(&self, vault: Address) -> Result<u8, ChainReadError> {
        match IMetaMorpho::new(vault, &self.provider)
            .DECIMALS_OFFSET()
            .block(self.block)
            .call()
            .await
        {
            Ok(offset) => Ok(offset),
            // plain ERC-4626 vaults
            Err(err) if is_rejected_call(&err) => Ok(0),
            Err(err) => Err(ChainReadError::contract("DECIMALS_OFFSET", vault)(err)),
        }
    }

    /// Returns the fee recipient of the Morpho singleton.
    pub async fn fee_recipient(&self, morpho: Address) -> Result<Address, ChainReadError> {
        IMorpho::new(morpho, &self.provider)
            .feeRecipient()
            .block(self.block)
            .call()
            .await
            .map_err(ChainReadError::contract("feeRecipient", morpho))
    }

    /// Returns whether `user` authorized `authorized` to manage its Morpho positions, and the
    /// user's Morpho signature nonce.
    pub async fn authorization(
        &self,
        morpho: Address,
        user: Address,
        authorized: Address,
    ) -> Result<(bool, U256), ChainReadError> {
        let morpho_contract = IMorpho::new(morpho, &self.provider);
        let is_authorized = morpho_contract.isAuthorized(user, authorized).block(self.block);
        let nonce = morpho_contract.nonce(user).block(self.block);

        tokio::try_join!(
            async {
                is_authorized.call().await.map_err(ChainReadError::contract("isAuthorized", morpho))
            },
            async { nonce.call().await.map_err(ChainReadError::contract("nonce", morpho)) },
        )
    }

    /// Returns the parameters and totals of a market.
    pub async fn market(
        &self,
        morpho: Address,
        id: MarketId,
    ) -> Result<(MarketParams, MarketTotals), ChainReadError> {
        let morpho_contract = IMorpho::new(morpho, &self.provider);
        let params = morpho_contract.idToMarketParams(id).block(self.block);
        let totals = morpho_contract.market(id).block(self.block);

        let (params, totals) = tokio::try_join!(
            async {
                params.call().await.map_err(ChainReadError::contract("idToMarketParams", morpho))
            },
            async { totals.call().await.map_err(ChainReadError::contract("market", morpho)) },
        )?;

        Ok((
            MarketParams {
                loan_token: params.loanToken,
                collateral_token: params.collateralToken,
                oracle: params.oracle,
                irm: params.irm,
                lltv: params.lltv,
            },
            MarketTotals {
                total_supply_assets: totals.totalSupplyAssets,
                total_supply_shares: totals.totalSupplyShares,
                total_borrow_assets: totals.totalBorrowAssets,
                total_borrow_shares: totals.totalBorrowShares,
                last_update: totals.lastUpdate,
                fee: totals.fee,
            },
        ))
    }

    /// Returns the position of `user` in a market.
    pub async fn market_position(
        &self,
        morpho: Address,
        id: MarketId,
        user: Address,
    ) -> Result<MarketPosition, ChainReadError> {
        let position = IMorpho::new(morpho, &self.provider)
            .position(id, user)
            .block(self.block)
            .call()
            .await
            .map_err(ChainReadError::contract("position", morpho))?;

        Ok(MarketPosition {
            supply_shares: position.supplyShares,
            borrow_shares: position.borrowShares,
            collateral: position.collateral,
        })
    }
}

/// Returns `true` if the node executed the call and rejected it, or the contract returned nothing
/// decodable. Transport failures are not rejections.
fn is_rejected_call(err: &alloy::contract::Error) -> bool {
    match err {
        alloy::contract::Error::TransportError(err) => err.as_error_resp().is_some(),
        alloy::contract::Error::ZeroData(..) | alloy::contract::Error::AbiError(_) => true,
        _ => false,
    }
}

#[async_trait::async_trait]
impl<P: Provider + Debug> ChainReader for RpcChainReader<P> {
    #[instrument(skip(self))]
    async fn holding(&self, owner: Address, token: Address) -> Result<U256, ChainReadError> {
        let balance = IERC20::new(token, &self.provider)
            .balanceOf(owner)
            .block(self.block)
            .call()
            .await
            .map_err(ChainReadError::contract("balanceOf", token))?;
        trace!(%balance, "Fetched holding");
        Ok(balance)
    }

    #[instrument(skip(self))]
    async fn vault(&self, vault: Address) -> Result<VaultInfo, ChainReadError> {
        let contract = IMetaMorpho::new(vault, &self.provider);
        let asset = contract.asset().block(self.block);
        let symbol = contract.symbol().block(self.block);
        let decimals = contract.decimals().block(self.block);
        let total_assets = contract.totalAssets().block(self.block);
        let total_supply = contract.totalSupply().block(self.block);

        let (asset, symbol, decimals, total_assets, total_supply, decimals_offset) = tokio::try_join!(
            async { asset.call().await.map_err(ChainReadError::contract("asset", vault)) },
            async { symbol.call().await.map_err(ChainReadError::contract("symbol", vault)) },
            async { decimals.call().await.map_err(ChainReadError::contract("decimals", vault)) },
            async {
                total_assets.call().await.map_err(ChainReadError::contract("totalAssets", vault))
            },
            async {
                total_supply.call().await.map_err(ChainReadError::contract("totalSupply", vault))
            },
            self.decimals_offset(vault),
        )?;

        trace!(%total_assets, %total_supply, "Fetched vault");

        Ok(VaultInfo {
            address: vault,
            asset,
            symbol,
            decimals,
            total_assets,
            total_supply,
            decimals_offset,
        })
    }

    #[instrument(skip(self))]
    async fn token(&self, token: Address) -> Result<TokenInfo, ChainReadError> {
        let contract = IERC20::new(token, &self.provider);
        let symbol = contract.symbol().block(self.block);
        let decimals = contract.decimals().block(self.block);

        let (symbol, decimals) = tokio::try_join!(
            async {
                match symbol.call().await {
                    Ok(symbol) => Ok(Some(symbol)),
                    Err(err) if is_rejected_call(&err) => Ok(None),
                    Err(err) => Err(ChainReadError::contract("symbol", token)(err)),
                }
            },
            async { decimals.call().await.map_err(ChainReadError::contract("decimals", token)) },
        )?;

        Ok(TokenInfo { address: token, symbol, decimals })
    }

    async fn latest_block(&self) -> Result<AnchorBlock, ChainReadError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or(ChainReadError::MissingBlock)?;

        Ok(AnchorBlock { number: block.header.number, timestamp: block.header.timestamp })
    }
}
