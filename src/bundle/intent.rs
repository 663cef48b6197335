use super::{InputOperation, MetaMorphoAction, MetaMorphoOperation};
use crate::{error::InputError, math::to_shares_down, position::Position, provider::VaultInfo};
use alloy::primitives::{
    Address, U256,
    utils::{format_units, parse_units},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A user action on a vault. Consumed once by [`submit`](super::submit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BundleIntent {
    /// Deposit assets into the vault.
    Deposit {
        /// The depositor.
        sender: Address,
        /// The vault.
        vault: Address,
        /// Deposited assets.
        assets: U256,
        /// Slippage tolerance, in WAD.
        slippage: U256,
    },
    /// Redeem vault shares.
    Withdraw {
        /// The share owner.
        sender: Address,
        /// The vault.
        vault: Address,
        /// Redeemed shares.
        shares: U256,
        /// Slippage tolerance, in WAD.
        slippage: U256,
    },
}

impl BundleIntent {
    /// Returns the account the intent acts for.
    pub fn sender(&self) -> Address {
        match self {
            Self::Deposit { sender, .. } | Self::Withdraw { sender, .. } => *sender,
        }
    }

    /// Returns the targeted vault.
    pub fn vault(&self) -> Address {
        match self {
            Self::Deposit { vault, .. } | Self::Withdraw { vault, .. } => *vault,
        }
    }

    /// Returns the operation requested by this intent.
    pub fn into_operation(self) -> InputOperation {
        let (sender, vault, action) = match self {
            Self::Deposit { sender, vault, assets, slippage } => {
                (sender, vault, MetaMorphoAction::Deposit { assets, owner: sender, slippage })
            }
            Self::Withdraw { sender, vault, shares, slippage } => (
                sender,
                vault,
                MetaMorphoAction::Withdraw { shares, owner: sender, receiver: sender, slippage },
            ),
        };
        InputOperation::MetaMorpho(MetaMorphoOperation { sender, vault, action })
    }
}

/// How much to withdraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawAmount {
    /// Every share of the position.
    Full,
    /// The given amount of underlying assets.
    Partial(U256),
}

/// Creates a deposit of `assets` into `vault`.
pub fn deposit_intent(sender: Address, vault: Address, assets: U256, slippage: U256) -> BundleIntent {
    BundleIntent::Deposit { sender, vault, assets, slippage }
}

/// Creates a withdrawal from `vault`.
///
/// A full withdrawal redeems exactly the shares of `position`. A partial one converts the assets to
/// shares, rounding down.
pub fn withdraw_intent(
    sender: Address,
    amount: WithdrawAmount,
    position: Option<&Position>,
    vault: &VaultInfo,
    slippage: U256,
) -> Result<BundleIntent, InputError> {
    let shares = match amount {
        WithdrawAmount::Full => position.ok_or(InputError::MissingPosition)?.deposited_assets,
        WithdrawAmount::Partial(assets) => {
            to_shares_down(assets, vault.total_assets, vault.total_supply, vault.decimals_offset)
                .map_err(|err| InputError::InvalidAmount(err.to_string()))?
        }
    };

    Ok(BundleIntent::Withdraw { sender, vault: vault.address, shares, slippage })
}

/// Parses a user-provided address.
pub fn parse_address(input: &str) -> Result<Address, InputError> {
    Address::from_str(input.trim()).map_err(|_| InputError::InvalidAddress(input.to_string()))
}

/// Parses a user-provided decimal amount into token units.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, InputError> {
    parse_units(input.trim(), decimals)
        .map(Into::into)
        .map_err(|_| InputError::InvalidAmount(input.to_string()))
}

/// Formats token units as a decimal amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    format_units(amount, decimals).unwrap_or_else(|_| amount.to_string())
}
