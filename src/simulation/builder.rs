use super::{SimulationScope, SimulationService, SimulationSnapshot, build_scope, simulation_error_message};
use crate::{context::ContextSubscriber, types::MarketId};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, trace, warn};

/// The published simulation state.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    /// The latest snapshot. `None` while pending or if the service produced none.
    pub data: Option<Arc<SimulationSnapshot>>,
    /// Whether a snapshot for the current scope is still being fetched.
    pub is_pending: bool,
    /// A diagnostic if the service reported a genuine failure.
    pub error: Option<String>,
}

impl SimulationState {
    /// The state while a snapshot is being fetched.
    pub fn pending() -> Self {
        Self { data: None, is_pending: true, error: None }
    }
}

/// Keeps a [`SimulationState`] in sync with the latest [`SimulationScope`].
///
/// Every new scope invalidates the published snapshot and issues a fetch. Fetches are not
/// cancelled, but a generation counter makes sure only the result of the latest one is
/// published.
#[derive(Debug)]
pub struct SimulationStateBuilder {
    service: Arc<dyn SimulationService>,
    state: Arc<watch::Sender<SimulationState>>,
    generation: Arc<AtomicU64>,
    scope: Option<SimulationScope>,
    market_ids: Option<Vec<MarketId>>,
}

impl SimulationStateBuilder {
    /// Creates a new builder and a receiver of its state.
    pub fn new(service: Arc<dyn SimulationService>) -> (Self, watch::Receiver<SimulationState>) {
        let (state, receiver) = watch::channel(SimulationState::pending());
        let builder = Self {
            service,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            scope: None,
            market_ids: None,
        };
        (builder, receiver)
    }

    /// Overrides the market allow-list of every scope built by [`Self::spawn`].
    pub fn with_market_ids(mut self, market_ids: Vec<MarketId>) -> Self {
        self.market_ids = Some(market_ids);
        self
    }

    /// Returns a new receiver of the state.
    pub fn subscribe(&self) -> watch::Receiver<SimulationState> {
        self.state.subscribe()
    }

    /// Returns the current generation. It is bumped by every new scope.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Applies a new scope.
    ///
    /// Does nothing if the scope did not change. Otherwise the state becomes pending and, if the
    /// anchor block is known, a fetch is spawned.
    pub fn refresh(&mut self, scope: SimulationScope) {
        if self.scope.as_ref() == Some(&scope) {
            trace!("Simulation scope unchanged");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.scope = Some(scope.clone());
        self.state.send_replace(SimulationState::pending());

        let Some(block) = scope.block else {
            debug!(generation, "Waiting for an anchor block");
            return;
        };

        debug!(generation, block = block.number, users = ?scope.users, "Fetching simulation snapshot");

        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        tokio::spawn(async move {
            let response = service.fetch(&scope).await;
            let error = response.error.as_ref().and_then(simulation_error_message);

            state.send_if_modified(|state| {
                // checked under the channel lock so a newer pending state is never overwritten
                if current.load(Ordering::SeqCst) != generation {
                    debug!(generation, block = block.number, "Dropping superseded simulation result");
                    return false;
                }
                if let Some(error) = &error {
                    warn!(block = block.number, %error, "Simulation failed");
                }
                *state = SimulationState {
                    data: response.data.map(Arc::new),
                    is_pending: false,
                    error,
                };
                true
            });
        });
    }

    /// Spawns a task rebuilding the scope on every wallet, block or vault target change.
    pub fn spawn(mut self, mut context: ContextSubscriber) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let wallet = *context.wallet.borrow_and_update();
                let block = *context.block.borrow_and_update();
                let vault = *context.vault.borrow_and_update();

                let mut scope = build_scope(wallet.account, vault, &wallet.chain(), block);
                if let Some(market_ids) = &self.market_ids {
                    scope = scope.with_market_ids(market_ids.clone());
                }
                self.refresh(scope);

                let changed = tokio::select! {
                    changed = context.wallet.changed() => changed,
                    changed = context.block.changed() => changed,
                    changed = context.vault.changed() => changed,
                };
                if changed.is_err() {
                    debug!("Context closed, stopping simulation builder");
                    break;
                }
            }
        })
    }
}
