//! Position aggregation.
//!
//! A [`Position`] combines a holding of vault shares, the vault exchange rate and the underlying
//! token metadata. It is derived on every poll and never stored.

mod poller;
pub use poller::{PollState, Poller};

use crate::{
    error::{MathError, PositionError},
    math::ShareRatio,
    provider::ChainReader,
};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A wallet's position in a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// The vault.
    pub vault: Address,
    /// Vault shares held by the wallet.
    pub deposited_assets: U256,
    /// Underlying assets per share, in WAD.
    pub share_to_underlying: U256,
    /// Vault share symbol.
    pub vault_symbol: String,
    /// Vault share decimals.
    pub vault_decimals: u8,
    /// Underlying asset symbol.
    pub underlying_symbol: Option<String>,
    /// Underlying asset decimals.
    pub underlying_decimals: u8,
    /// Underlying asset address.
    pub underlying_address: Address,
}

impl Position {
    /// Returns the value of the held shares in underlying assets, rounded down.
    pub fn underlying_equivalent(&self) -> Result<U256, MathError> {
        ShareRatio::from_wad(self.share_to_underlying).to_underlying(self.deposited_assets)
    }
}

/// A wallet's balance of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// The token.
    pub address: Address,
    /// The balance.
    pub balance: U256,
    /// Token symbol.
    pub symbol: Option<String>,
    /// Token decimals.
    pub decimals: u8,
}

/// Derives the position of `account` in `vault`.
///
/// Returns `None` without an account. Fails if the vault has no supply.
#[instrument(skip(reader))]
pub async fn derive_position(
    reader: &dyn ChainReader,
    account: Option<Address>,
    vault: Address,
) -> Result<Option<Position>, PositionError> {
    let Some(account) = account else { return Ok(None) };

    let (deposited_assets, vault_info) =
        tokio::try_join!(reader.holding(account, vault), reader.vault(vault))?;

    if vault_info.total_supply.is_zero() {
        return Err(PositionError::EmptyVault(vault));
    }
    let ratio = ShareRatio::from_totals(vault_info.total_assets, vault_info.total_supply)?;

    let underlying = reader.token(vault_info.asset).await?;

    Ok(Some(Position {
        vault,
        deposited_assets,
        share_to_underlying: ratio.wad(),
        vault_symbol: vault_info.symbol,
        vault_decimals: vault_info.decimals,
        underlying_symbol: underlying.symbol,
        underlying_decimals: underlying.decimals,
        underlying_address: underlying.address,
    }))
}

/// Derives the balance of `token` held by `account`.
///
/// Returns `None` without an account.
#[instrument(skip(reader))]
pub async fn derive_token_balance(
    reader: &dyn ChainReader,
    account: Option<Address>,
    token: Address,
) -> Result<Option<TokenBalance>, PositionError> {
    let Some(account) = account else { return Ok(None) };

    let (balance, info) = tokio::try_join!(reader.holding(account, token), reader.token(token))?;

    Ok(Some(TokenBalance { address: token, balance, symbol: info.symbol, decimals: info.decimals }))
}
