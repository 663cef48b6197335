use super::{
    Bundle, BundleRequirements, Bundler, BundlerOperation, BundlingOptions, Erc20Action,
    Erc20Operation, InputOperation, MetaMorphoAction, MetaMorphoOperation, TxRequirement,
};
use crate::{
    error::BundlerError,
    math::{apply_slippage_down, to_assets_down, to_shares_down},
    provider::VaultInfo,
    simulation::SimulationSnapshot,
    types::{IERC20, IMetaMorpho},
};
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use std::collections::BTreeSet;
use tracing::debug;

/// A [`Bundler`] executing vault operations as plain transactions from the user account.
///
/// Missing allowances become `approve` transactions sent ahead of the vault call. Permit
/// signatures, the public allocator and token unwrapping are not supported: the first two are
/// ignored, unwrapping is rejected.
///
/// Slippage is not enforced on-chain. Plain ERC-4626 `deposit` and `redeem` take no minimum, so the
/// slippage-adjusted minimum computed in [`Bundler::finalize`] only rejects operations that would
/// produce nothing at the snapshot's share price.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectBundler;

impl DirectBundler {
    fn vault<'a>(
        snapshot: &'a SimulationSnapshot,
        vault: Address,
    ) -> Result<&'a VaultInfo, BundlerError> {
        snapshot.vault(vault).ok_or(BundlerError::UnknownVault(vault))
    }

    fn ensure_balance(
        snapshot: &SimulationSnapshot,
        user: Address,
        token: Address,
        required: U256,
    ) -> Result<(), BundlerError> {
        let holding =
            snapshot.holding(user, token).ok_or(BundlerError::UnknownHolding { user, token })?;
        if holding.balance < required {
            return Err(BundlerError::InsufficientBalance {
                token,
                required,
                available: holding.balance,
            });
        }
        Ok(())
    }
}

impl Bundler for DirectBundler {
    fn populate(
        &self,
        operations: Vec<InputOperation>,
        snapshot: &SimulationSnapshot,
        options: &BundlingOptions,
    ) -> Result<Vec<BundlerOperation>, BundlerError> {
        let mut populated = Vec::with_capacity(operations.len() * 2);

        for operation in operations {
            let op = match operation {
                InputOperation::MetaMorpho(op) => op,
                InputOperation::Blue(op) => {
                    return Err(BundlerError::Unsupported(format!("{:?}", op.action)));
                }
            };

            match &op.action {
                MetaMorphoAction::Deposit { assets, .. } => {
                    let asset = Self::vault(snapshot, op.vault)?.asset;
                    Self::ensure_balance(snapshot, op.sender, asset, *assets)?;

                    if options.with_simple_permit.contains(&asset) {
                        debug!(%asset, "Simple permit not supported, approving with a transaction");
                    }

                    let allowance = snapshot
                        .holding(op.sender, asset)
                        .map(|holding| holding.allowance(op.vault))
                        .unwrap_or_default();
                    if allowance < *assets {
                        populated.push(BundlerOperation::Erc20(Erc20Operation {
                            sender: op.sender,
                            token: asset,
                            action: Erc20Action::Approve { spender: op.vault, amount: *assets },
                        }));
                    }
                }
                MetaMorphoAction::Withdraw { shares, owner, .. } => {
                    Self::vault(snapshot, op.vault)?;
                    Self::ensure_balance(snapshot, *owner, op.vault, *shares)?;
                }
            }

            populated.push(BundlerOperation::MetaMorpho(op));
        }

        Ok(populated)
    }

    fn finalize(
        &self,
        operations: Vec<BundlerOperation>,
        snapshot: &SimulationSnapshot,
        account: Address,
        unwrap_tokens: &BTreeSet<Address>,
        _unwrap_slippage: U256,
    ) -> Result<Vec<BundlerOperation>, BundlerError> {
        if !unwrap_tokens.is_empty() {
            return Err(BundlerError::Unsupported("token unwrapping".to_string()));
        }

        let mut finalized: Vec<BundlerOperation> = Vec::with_capacity(operations.len());
        for operation in operations {
            if operation.sender() != account {
                return Err(BundlerError::Unsupported(format!(
                    "operation sent by {} in a bundle of {account}",
                    operation.sender()
                )));
            }

            match &operation {
                BundlerOperation::MetaMorpho(op) => {
                    let vault = Self::vault(snapshot, op.vault)?;
                    let minimum = match op.action {
                        MetaMorphoAction::Deposit { assets, slippage, .. } => apply_slippage_down(
                            to_shares_down(
                                assets,
                                vault.total_assets,
                                vault.total_supply,
                                vault.decimals_offset,
                            )?,
                            slippage,
                        )?,
                        MetaMorphoAction::Withdraw { shares, slippage, .. } => apply_slippage_down(
                            to_assets_down(
                                shares,
                                vault.total_assets,
                                vault.total_supply,
                                vault.decimals_offset,
                            )?,
                            slippage,
                        )?,
                    };
                    if minimum.is_zero() {
                        return Err(BundlerError::ZeroOutput(op.vault));
                    }
                    debug!(vault = %op.vault, %minimum, "Finalized vault operation");
                }
                BundlerOperation::Erc20(Erc20Operation {
                    token,
                    action: Erc20Action::Approve { spender, amount },
                    ..
                }) => {
                    // merge approvals of the same token to the same spender
                    let merged = finalized.iter_mut().find_map(|previous| match previous {
                        BundlerOperation::Erc20(Erc20Operation {
                            token: previous_token,
                            action:
                                Erc20Action::Approve { spender: previous_spender, amount: previous_amount },
                            ..
                        }) if previous_token == token && previous_spender == spender => {
                            Some(previous_amount)
                        }
                        _ => None,
                    });
                    if let Some(previous_amount) = merged {
                        *previous_amount = previous_amount.saturating_add(*amount);
                        continue;
                    }
                }
                BundlerOperation::Erc20(_) | BundlerOperation::Blue(_) => {}
            }

            finalized.push(operation);
        }

        Ok(finalized)
    }

    fn encode(
        &self,
        operations: &[BundlerOperation],
        _snapshot: &SimulationSnapshot,
        _supports_signature: bool,
    ) -> Result<Bundle, BundlerError> {
        let mut requirements = BundleRequirements::default();
        let mut main = None;

        for operation in operations {
            match operation {
                BundlerOperation::Erc20(Erc20Operation {
                    token,
                    action: Erc20Action::Approve { spender, amount },
                    ..
                }) => requirements.txs.push(TxRequirement {
                    tx: TransactionRequest::default().with_to(*token).with_input(
                        IERC20::approveCall { spender: *spender, amount: *amount }.abi_encode(),
                    ),
                    description: format!("approve {amount} of {token} to {spender}"),
                }),
                BundlerOperation::MetaMorpho(MetaMorphoOperation { vault, action, .. }) => {
                    if main.is_some() {
                        return Err(BundlerError::Unsupported(
                            "more than one vault operation".to_string(),
                        ));
                    }
                    let input = match *action {
                        MetaMorphoAction::Deposit { assets, owner, .. } => {
                            IMetaMorpho::depositCall { assets, receiver: owner }.abi_encode()
                        }
                        MetaMorphoAction::Withdraw { shares, owner, receiver, .. } => {
                            IMetaMorpho::redeemCall { shares, receiver, owner }.abi_encode()
                        }
                    };
                    main = Some(TransactionRequest::default().with_to(*vault).with_input(input));
                }
                BundlerOperation::Erc20(op) => {
                    return Err(BundlerError::Unsupported(format!("{:?}", op.action)));
                }
                BundlerOperation::Blue(op) => {
                    return Err(BundlerError::Unsupported(format!("{:?}", op.action)));
                }
            }
        }

        let tx = main.ok_or_else(|| BundlerError::Unsupported("empty bundle".to_string()))?;
        Ok(Bundle { requirements, tx })
    }
}
