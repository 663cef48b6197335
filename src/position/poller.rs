use std::{
    fmt::{Debug, Display},
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, trace, warn};

/// The published state of a [`Poller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState<T> {
    /// The latest value. Discarded when a fetch fails.
    pub value: Option<T>,
    /// Whether the first fetch for the current target is still running.
    pub is_loading: bool,
    /// The error of the latest fetch, if it failed.
    pub error: Option<String>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self { value: None, is_loading: false, error: None }
    }
}

/// Polls a fetch function on a fixed interval and publishes its result.
///
/// Each call to [`Poller::watch`] replaces the target: the previous interval task is aborted and
/// the generation is bumped, so nothing fetched for an older target is ever published.
#[derive(Debug)]
pub struct Poller<T> {
    state: Arc<watch::Sender<PollState<T>>>,
    generation: Arc<AtomicU64>,
    every: Duration,
    task: Option<JoinHandle<()>>,
}

impl<T> Poller<T>
where
    T: Debug + Send + Sync + 'static,
{
    /// Creates an idle poller and a receiver of its state.
    pub fn new(every: Duration) -> (Self, watch::Receiver<PollState<T>>) {
        let (state, receiver) = watch::channel(PollState::default());
        let poller = Self {
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            every,
            task: None,
        };
        (poller, receiver)
    }

    /// Returns a new receiver of the state.
    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.state.subscribe()
    }

    /// Starts polling `fetch`, once immediately and then every interval.
    ///
    /// Replaces the previous target, if any.
    pub fn watch<F, Fut, E>(&mut self, fetch: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.stop();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(PollState { value: None, is_loading: true, error: None });

        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let every = self.every;
        self.task = Some(tokio::spawn(async move {
            let mut clock = interval(every);
            clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                clock.tick().await;
                let result = fetch().await;

                state.send_if_modified(|state| {
                    if current.load(Ordering::SeqCst) != generation {
                        debug!(generation, "Dropping result of a replaced poll target");
                        return false;
                    }
                    match result {
                        Ok(value) => {
                            trace!(?value, "Polled");
                            *state = PollState { value, is_loading: false, error: None };
                        }
                        Err(err) => {
                            warn!(%err, "Poll failed");
                            *state = PollState {
                                value: None,
                                is_loading: false,
                                error: Some(err.to_string()),
                            };
                        }
                    }
                    true
                });
            }
        }));
    }

    /// Stops polling. The last published state is kept.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
