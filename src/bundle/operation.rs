use crate::{addresses::unwrapped_token, simulation::SimulationSnapshot, types::MarketId};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An action on the Morpho Blue singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlueAction {
    /// Authorizes or revokes a manager of the sender's positions.
    SetAuthorization {
        /// The manager.
        authorized: Address,
        /// Whether the manager is authorized.
        is_authorized: bool,
    },
    /// Supplies loan assets to a market.
    Supply {
        /// The market.
        market_id: MarketId,
        /// Supplied assets.
        assets: U256,
        /// The position owner.
        on_behalf: Address,
    },
    /// Withdraws loan assets from a market.
    Withdraw {
        /// The market.
        market_id: MarketId,
        /// Withdrawn assets.
        assets: U256,
        /// The recipient.
        receiver: Address,
    },
}

/// An operation on the Morpho Blue singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueOperation {
    /// The account executing the operation.
    pub sender: Address,
    /// The action.
    pub action: BlueAction,
}

/// An action on an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Erc20Action {
    /// Approves `spender` with a transaction.
    Approve {
        /// The spender.
        spender: Address,
        /// The approved amount.
        amount: U256,
    },
    /// Approves `spender` with an EIP-2612 signature.
    Permit {
        /// The spender.
        spender: Address,
        /// The approved amount.
        amount: U256,
        /// Signature expiry, in seconds since the epoch.
        deadline: U256,
    },
    /// Unwraps the token into its underlying asset.
    Unwrap {
        /// The unwrapped amount.
        amount: U256,
        /// The recipient of the underlying asset.
        receiver: Address,
    },
}

/// An operation on an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Operation {
    /// The account executing the operation.
    pub sender: Address,
    /// The token.
    pub token: Address,
    /// The action.
    pub action: Erc20Action,
}

/// An action on a MetaMorpho vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MetaMorphoAction {
    /// Deposits assets in exchange for shares.
    Deposit {
        /// Deposited assets.
        assets: U256,
        /// The receiver of the shares.
        owner: Address,
        /// Slippage tolerance, in WAD.
        slippage: U256,
    },
    /// Redeems shares in exchange for assets.
    Withdraw {
        /// Redeemed shares.
        shares: U256,
        /// The owner of the shares.
        owner: Address,
        /// The receiver of the assets.
        receiver: Address,
        /// Slippage tolerance, in WAD.
        slippage: U256,
    },
}

/// An operation on a MetaMorpho vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaMorphoOperation {
    /// The account executing the operation.
    pub sender: Address,
    /// The vault.
    pub vault: Address,
    /// The action.
    pub action: MetaMorphoAction,
}

/// An operation requested by the user, before the bundler expands it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputOperation {
    /// A Morpho Blue operation.
    Blue(BlueOperation),
    /// A vault operation.
    MetaMorpho(MetaMorphoOperation),
}

/// An operation produced by a bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundlerOperation {
    /// A Morpho Blue operation.
    Blue(BlueOperation),
    /// A token operation.
    Erc20(Erc20Operation),
    /// A vault operation.
    MetaMorpho(MetaMorphoOperation),
}

impl From<InputOperation> for BundlerOperation {
    fn from(operation: InputOperation) -> Self {
        match operation {
            InputOperation::Blue(op) => Self::Blue(op),
            InputOperation::MetaMorpho(op) => Self::MetaMorpho(op),
        }
    }
}

impl BundlerOperation {
    /// Returns the account executing the operation.
    pub fn sender(&self) -> Address {
        match self {
            Self::Blue(op) => op.sender,
            Self::Erc20(op) => op.sender,
            Self::MetaMorpho(op) => op.sender,
        }
    }
}

/// Returns every token touched by `operations`.
///
/// Unknown markets and vaults contribute nothing beyond what the operation names itself.
pub fn involved_tokens(
    operations: &[BundlerOperation],
    snapshot: &SimulationSnapshot,
) -> BTreeSet<Address> {
    let mut tokens = BTreeSet::new();

    for operation in operations {
        match operation {
            BundlerOperation::Blue(op) => {
                let market_id = match &op.action {
                    BlueAction::SetAuthorization { .. } => continue,
                    BlueAction::Supply { market_id, .. } | BlueAction::Withdraw { market_id, .. } => {
                        market_id
                    }
                };
                if let Some(market) = snapshot.markets.get(market_id) {
                    tokens.extend(
                        [market.params.loan_token, market.params.collateral_token]
                            .into_iter()
                            .filter(|token| !token.is_zero()),
                    );
                }
            }
            BundlerOperation::MetaMorpho(op) => {
                tokens.insert(op.vault);
                if let Some(vault) = snapshot.vault(op.vault) {
                    tokens.insert(vault.asset);
                }
            }
            BundlerOperation::Erc20(op) => {
                tokens.insert(op.token);
                if let Some(unwrapped) = unwrapped_token(op.token, snapshot.chain_id) {
                    tokens.insert(unwrapped);
                }
            }
        }
    }

    tokens
}
