use crate::environment::{MockChain, OTHER_VAULT, WETH};
use alloy::primitives::{Address, ChainId, U256, address};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use vault_kit::{
    constants::DEFAULT_VAULT,
    context::{ContextHandle, WalletState},
    math::WAD,
    provider::ChainReader,
    simulation::{
        AnchorBlock, GlobalError, SimulationErrorCategories, SimulationService, SimulationState,
        SimulationStateBuilder,
    },
};

const ACCOUNT: Address = address!("1111111111111111111111111111111111111111");
const BLOCK_INTERVAL: Duration = Duration::from_secs(4);

/// A running context with its block watcher and simulation builder.
struct Session {
    context: Arc<ContextHandle>,
    state: watch::Receiver<SimulationState>,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    fn start(chain: &Arc<MockChain>, chain_id: ChainId) -> Self {
        let wallet = WalletState { account: Some(ACCOUNT), chain_id: Some(chain_id) };
        let context = Arc::new(ContextHandle::new(wallet, DEFAULT_VAULT));

        let service: Arc<dyn SimulationService> = chain.clone();
        let (builder, state) = SimulationStateBuilder::new(service);
        let reader: Arc<dyn ChainReader> = chain.clone();
        let tasks = vec![
            builder.spawn(context.subscribe()),
            context.spawn_block_watcher(reader, BLOCK_INTERVAL),
        ];

        Self { context, state, tasks }
    }

    async fn ready(&mut self) -> SimulationState {
        self.state.wait_for(|state| !state.is_pending).await.unwrap().clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[tokio::test(start_paused = true)]
async fn snapshot_of_connected_account() {
    let chain = MockChain::mainnet();
    chain.set_balance(ACCOUNT, WETH, U256::from(3) * WAD);
    chain.set_allowance(ACCOUNT, WETH, DEFAULT_VAULT, WAD);

    let mut session = Session::start(&chain, 1);
    let state = session.ready().await;

    assert_eq!(state.error, None);
    let snapshot = state.data.expect("a snapshot is published");
    assert_eq!(snapshot.chain_id, 1);
    assert_eq!(snapshot.block.number, 100);
    assert!(snapshot.vault(DEFAULT_VAULT).is_some());

    let holding = snapshot.holding(ACCOUNT, WETH).expect("the account is in scope");
    assert_eq!(holding.balance, U256::from(3) * WAD);
    assert_eq!(holding.allowance(DEFAULT_VAULT), WAD);
}

#[tokio::test(start_paused = true)]
async fn category_errors_surface_only_when_real() {
    let chain = MockChain::mainnet();
    SimulationErrorCategories::record(
        &mut chain.category_errors.lock().unwrap().vaults,
        DEFAULT_VAULT,
        "execution reverted",
    );

    let mut session = Session::start(&chain, 1);
    let state = session.ready().await;
    let error = state.error.expect("a vault failure is reported");
    assert!(error.contains("execution reverted"), "{error}");
    assert!(state.data.is_some());

    // only the fee recipient of the global category counts
    *chain.category_errors.lock().unwrap() = SimulationErrorCategories {
        global: Some(GlobalError { fee_recipient: Some("call failed".to_string()) }),
        ..SimulationErrorCategories::shell()
    };
    chain.set_block(AnchorBlock { number: 101, timestamp: 1_212 });
    let state = session
        .state
        .wait_for(|state| state.data.as_ref().is_some_and(|data| data.block.number == 101))
        .await
        .unwrap()
        .clone();
    assert!(state.error.is_some_and(|error| error.contains("call failed")));
}

#[tokio::test(start_paused = true)]
async fn newer_block_supersedes_slow_fetch() {
    let chain = MockChain::mainnet();
    chain.delay_block(100, Duration::from_secs(10));

    let mut session = Session::start(&chain, 1);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(session.state.borrow().is_pending);

    chain.set_block(AnchorBlock { number: 101, timestamp: 1_212 });
    let state = session.ready().await;
    assert_eq!(state.data.unwrap().block.number, 101);

    // the fetch at block 100 resolves later and is dropped
    tokio::time::sleep(Duration::from_secs(20)).await;
    let state = session.state.borrow().clone();
    assert!(!state.is_pending);
    assert_eq!(state.data.unwrap().block.number, 101);
}

#[tokio::test(start_paused = true)]
async fn vault_switch_rebuilds_scope() {
    let chain = MockChain::mainnet();
    let mut session = Session::start(&chain, 1);
    let first = session.ready().await.data.unwrap();
    assert!(first.vault(OTHER_VAULT).is_none());

    assert!(session.context.set_vault(OTHER_VAULT));
    let snapshot = session
        .state
        .wait_for(|state| state.data.as_ref().is_some_and(|data| data.vault(OTHER_VAULT).is_some()))
        .await
        .unwrap()
        .data
        .clone()
        .unwrap();
    assert_eq!(snapshot.block, first.block);
    assert!(snapshot.vault(OTHER_VAULT).is_some());
    assert!(snapshot.vault(DEFAULT_VAULT).is_none());
}

#[tokio::test(start_paused = true)]
async fn chain_switch_waits_for_new_block() {
    let chain = MockChain::mainnet();
    let mut session = Session::start(&chain, 1);
    session.ready().await;

    let base = WalletState { account: Some(ACCOUNT), chain_id: Some(8453) };
    assert!(session.context.set_wallet(base));
    assert!(!session.context.set_wallet(base));

    let state = session
        .state
        .wait_for(|state| state.data.as_ref().is_some_and(|data| data.chain_id == 8453))
        .await
        .unwrap()
        .clone();
    assert!(!state.is_pending);
    assert_eq!(state.error, None);
}
