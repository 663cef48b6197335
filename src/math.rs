//! Fixed-point helpers for vault share accounting.
//!
//! Amounts are raw token units held in [`U256`]. Ratios are WAD fixed-point numbers with 18
//! decimals, so `1.0` is `10^18`. Every helper rounds toward zero.

use alloy::primitives::{U256, U512};

/// One unit in WAD representation (10^18).
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Errors raised by fixed-point arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    /// The denominator is zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The result does not fit in 256 bits.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Computes `x * y / d`, rounding down.
///
/// The product is computed in 512 bits, so only a quotient above [`U256::MAX`] overflows.
pub fn mul_div_down(x: U256, y: U256, d: U256) -> Result<U256, MathError> {
    wide_mul_div_down(U512::from(x), U512::from(y), U512::from(d))
}

fn wide_mul_div_down(x: U512, y: U512, d: U512) -> Result<U256, MathError> {
    if d.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    // both factors hold at most 257 bits, so the product cannot wrap
    U256::checked_from_limbs_slice((x * y / d).as_limbs()).ok_or(MathError::Overflow)
}

/// Returns `10^decimals_offset`, the virtual shares of an ERC-4626 vault.
fn virtual_shares(decimals_offset: u8) -> Result<U512, MathError> {
    U256::from(10)
        .checked_pow(U256::from(decimals_offset))
        .map(U512::from)
        .ok_or(MathError::Overflow)
}

/// Computes `x * WAD / y`, rounding down.
pub fn w_div_down(x: U256, y: U256) -> Result<U256, MathError> {
    mul_div_down(x, WAD, y)
}

/// Computes `x * y / WAD`, rounding down.
pub fn w_mul_down(x: U256, y: U256) -> Result<U256, MathError> {
    mul_div_down(x, y, WAD)
}

/// Converts vault assets to shares, rounding down.
///
/// Follows the virtual shares/assets formula of ERC-4626 vaults with a decimals offset:
/// `assets * (total_supply + 10^offset) / (total_assets + 1)`.
pub fn to_shares_down(
    assets: U256,
    total_assets: U256,
    total_supply: U256,
    decimals_offset: u8,
) -> Result<U256, MathError> {
    wide_mul_div_down(
        U512::from(assets),
        U512::from(total_supply) + virtual_shares(decimals_offset)?,
        U512::from(total_assets) + U512::from(1),
    )
}

/// Converts vault shares to assets, rounding down.
///
/// Inverse of [`to_shares_down`]: `shares * (total_assets + 1) / (total_supply + 10^offset)`.
pub fn to_assets_down(
    shares: U256,
    total_assets: U256,
    total_supply: U256,
    decimals_offset: u8,
) -> Result<U256, MathError> {
    wide_mul_div_down(
        U512::from(shares),
        U512::from(total_assets) + U512::from(1),
        U512::from(total_supply) + virtual_shares(decimals_offset)?,
    )
}

/// Lowers `amount` by a WAD slippage tolerance, rounding down.
pub fn apply_slippage_down(amount: U256, slippage: U256) -> Result<U256, MathError> {
    w_mul_down(amount, WAD.checked_sub(slippage).ok_or(MathError::Overflow)?)
}

/// Ratio of underlying assets per vault share.
///
/// A ratio of `10^18` means one share is worth one unit of the underlying asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareRatio(U256);

impl ShareRatio {
    /// Computes the ratio from vault totals: `total_assets * 10^18 / total_supply`, rounded down.
    pub fn from_totals(total_assets: U256, total_supply: U256) -> Result<Self, MathError> {
        w_div_down(total_assets, total_supply).map(Self)
    }

    /// Wraps a raw WAD ratio.
    pub const fn from_wad(ratio: U256) -> Self {
        Self(ratio)
    }

    /// Returns the ratio in WAD.
    pub const fn wad(self) -> U256 {
        self.0
    }

    /// Converts an amount of shares to its underlying equivalent.
    ///
    /// Formula: `shares * ratio / 10^18`
    pub fn to_underlying(self, shares: U256) -> Result<U256, MathError> {
        w_mul_down(shares, self.0)
    }
}
