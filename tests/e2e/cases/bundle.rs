use crate::environment::{MockChain, MockWallet, WETH};
use alloy::{
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use std::sync::Arc;
use vault_kit::{
    bundle::{
        BundleStage, DirectBundler, SubmitOptions, WithdrawAmount, deposit_intent, submit,
        withdraw_intent,
    },
    constants::{DEFAULT_SLIPPAGE_TOLERANCE, DEFAULT_VAULT},
    context::ChainContext,
    error::BundleError,
    math::WAD,
    position::derive_position,
    provider::ChainReader,
    simulation::{SimulationService, SimulationState, SimulationStateBuilder, build_scope},
    types::{IERC20, IMetaMorpho},
    wallet::Wallet,
};

/// Publishes a snapshot for `account` at the current block of `chain`.
async fn simulate(chain: &Arc<MockChain>, account: Address) -> SimulationState {
    let service: Arc<dyn SimulationService> = chain.clone();
    let (mut builder, mut state) = SimulationStateBuilder::new(service);
    let block = chain.latest_block().await.unwrap();
    builder.refresh(build_scope(Some(account), DEFAULT_VAULT, &ChainContext::new(1), Some(block)));
    state.wait_for(|state| !state.is_pending).await.unwrap().clone()
}

fn input(tx: &TransactionRequest) -> &[u8] {
    tx.input.input().expect("calldata is set").as_ref()
}

#[tokio::test]
async fn disconnected_wallet_sends_nothing() {
    let chain = MockChain::mainnet();
    let wallet = MockWallet::disconnected();
    let intent = deposit_intent(Address::ZERO, DEFAULT_VAULT, WAD, DEFAULT_SLIPPAGE_TOLERANCE);

    let err = submit(
        intent,
        &wallet,
        &simulate(&chain, Address::ZERO).await,
        &DirectBundler,
        SubmitOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Please connect your wallet first");
    assert!(err.is_validation());
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn loading_simulation_is_rejected() {
    let wallet = MockWallet::connected(1);
    let account = wallet.account().unwrap();
    let intent = deposit_intent(account, DEFAULT_VAULT, WAD, DEFAULT_SLIPPAGE_TOLERANCE);

    let err = submit(
        intent,
        &wallet,
        &SimulationState::pending(),
        &DirectBundler,
        SubmitOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BundleError::SimulationPending));
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn full_withdraw_redeems_every_share() {
    let chain = MockChain::mainnet();
    let wallet = MockWallet::connected(1);
    let account = wallet.account().unwrap();
    let shares = U256::from(90) * WAD + U256::from(7);
    chain.set_balance(account, DEFAULT_VAULT, shares);

    let position =
        derive_position(chain.as_ref(), Some(account), DEFAULT_VAULT).await.unwrap().unwrap();
    let simulation = simulate(&chain, account).await;
    let vault = simulation.data.as_ref().unwrap().vault(DEFAULT_VAULT).unwrap().clone();

    let intent = withdraw_intent(
        account,
        WithdrawAmount::Full,
        Some(&position),
        &vault,
        DEFAULT_SLIPPAGE_TOLERANCE,
    )
    .unwrap();
    let outcome = submit(intent, &wallet, &simulation, &DirectBundler, SubmitOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.tx_hashes.len(), 1);

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, Some(DEFAULT_VAULT.into()));
    let redeem = IMetaMorpho::redeemCall::abi_decode(input(&sent[0])).unwrap();
    assert_eq!(redeem.shares, shares);
    assert_eq!(redeem.owner, account);
    assert_eq!(redeem.receiver, account);
}

#[tokio::test]
async fn deposit_approves_then_deposits() {
    let chain = MockChain::mainnet();
    let wallet = MockWallet::connected(1);
    let account = wallet.account().unwrap();
    chain.set_balance(account, WETH, U256::from(10) * WAD);
    let assets = U256::from(2) * WAD;

    let simulation = simulate(&chain, account).await;
    let intent = deposit_intent(account, DEFAULT_VAULT, assets, DEFAULT_SLIPPAGE_TOLERANCE);
    let outcome = submit(intent, &wallet, &simulation, &DirectBundler, SubmitOptions::default())
        .await
        .unwrap();
    assert!(outcome.tokens.contains(&WETH));

    let sent = wallet.sent();
    assert_eq!(sent.len(), 2);

    assert_eq!(sent[0].to, Some(WETH.into()));
    let approve = IERC20::approveCall::abi_decode(input(&sent[0])).unwrap();
    assert_eq!(approve.spender, DEFAULT_VAULT);
    assert_eq!(approve.amount, assets);

    assert_eq!(sent[1].to, Some(DEFAULT_VAULT.into()));
    let deposit = IMetaMorpho::depositCall::abi_decode(input(&sent[1])).unwrap();
    assert_eq!(deposit.assets, assets);
    assert_eq!(deposit.receiver, account);
}

#[tokio::test]
async fn existing_allowance_skips_approval() {
    let chain = MockChain::mainnet();
    let wallet = MockWallet::connected(1);
    let account = wallet.account().unwrap();
    chain.set_balance(account, WETH, U256::from(10) * WAD);
    chain.set_allowance(account, WETH, DEFAULT_VAULT, U256::MAX);

    let simulation = simulate(&chain, account).await;
    let intent = deposit_intent(account, DEFAULT_VAULT, WAD, DEFAULT_SLIPPAGE_TOLERANCE);
    submit(intent, &wallet, &simulation, &DirectBundler, SubmitOptions::default()).await.unwrap();

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, Some(DEFAULT_VAULT.into()));
}

#[tokio::test]
async fn deposit_above_balance_fails_while_populating() {
    let chain = MockChain::mainnet();
    let wallet = MockWallet::connected(1);
    let account = wallet.account().unwrap();
    chain.set_balance(account, WETH, WAD);

    let simulation = simulate(&chain, account).await;
    let intent =
        deposit_intent(account, DEFAULT_VAULT, U256::from(2) * WAD, DEFAULT_SLIPPAGE_TOLERANCE);
    let err = submit(intent, &wallet, &simulation, &DirectBundler, SubmitOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(BundleStage::Populating));
    assert!(wallet.sent().is_empty());
}
