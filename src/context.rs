//! Chain context and change notification.
//!
//! The connected wallet, the latest block and the targeted vault are published on
//! [`tokio::sync::watch`] channels. Components take a [`ContextSubscriber`] and react to changes
//! explicitly instead of being re-invoked implicitly.

use crate::{
    addresses::{self, AddressSet},
    constants::{MAINNET_CHAIN_ID, TEST_FORK_CHAIN_ID},
    provider::ChainReader,
    simulation::AnchorBlock,
};
use alloy::primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::interval};
use tracing::{debug, warn};

/// The chain an interaction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainContext {
    /// The chain id reported by the wallet.
    pub chain_id: ChainId,
    /// Whether the chain is a local test fork of mainnet.
    pub is_test_fork: bool,
}

impl ChainContext {
    /// Creates the context of the given chain.
    pub const fn new(chain_id: ChainId) -> Self {
        Self { chain_id, is_test_fork: chain_id == TEST_FORK_CHAIN_ID }
    }

    /// Creates the context from the chain reported by the wallet, defaulting to mainnet when no
    /// wallet is connected.
    pub fn from_wallet(chain_id: Option<ChainId>) -> Self {
        Self::new(chain_id.unwrap_or(MAINNET_CHAIN_ID))
    }

    /// Returns the chain id used for address resolution.
    ///
    /// Test forks resolve to mainnet addresses.
    pub const fn effective_chain_id(&self) -> ChainId {
        if self.is_test_fork { MAINNET_CHAIN_ID } else { self.chain_id }
    }

    /// Returns the protocol addresses of this chain.
    pub fn addresses(&self) -> AddressSet {
        addresses::resolve(self.effective_chain_id())
    }
}

/// What the connected wallet reports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalletState {
    /// The connected account, if any.
    pub account: Option<Address>,
    /// The chain the wallet is connected to, if any.
    pub chain_id: Option<ChainId>,
}

impl WalletState {
    /// Returns the chain context derived from this wallet.
    pub fn chain(&self) -> ChainContext {
        ChainContext::from_wallet(self.chain_id)
    }
}

/// Publishing side of the context channels.
#[derive(Debug)]
pub struct ContextHandle {
    wallet: watch::Sender<WalletState>,
    block: watch::Sender<Option<AnchorBlock>>,
    vault: watch::Sender<Address>,
}

impl ContextHandle {
    /// Creates the channels with an initial wallet and vault target. No block is known yet.
    pub fn new(wallet: WalletState, vault: Address) -> Self {
        Self {
            wallet: watch::channel(wallet).0,
            block: watch::channel(None).0,
            vault: watch::channel(vault).0,
        }
    }

    /// Returns a new set of receivers.
    pub fn subscribe(&self) -> ContextSubscriber {
        ContextSubscriber {
            wallet: self.wallet.subscribe(),
            block: self.block.subscribe(),
            vault: self.vault.subscribe(),
        }
    }

    /// Publishes a wallet change. Returns `true` if the wallet state changed.
    ///
    /// A chain switch forgets the current block until the next one is observed on the new chain.
    pub fn set_wallet(&self, wallet: WalletState) -> bool {
        let mut chain_changed = false;
        let modified = self.wallet.send_if_modified(|current| {
            if *current == wallet {
                return false;
            }
            chain_changed = current.chain_id != wallet.chain_id;
            *current = wallet;
            true
        });
        if chain_changed {
            self.block.send_replace(None);
        }
        modified
    }

    /// Publishes a new vault target. Returns `true` if the target changed.
    pub fn set_vault(&self, vault: Address) -> bool {
        self.vault.send_if_modified(|current| {
            let modified = *current != vault;
            *current = vault;
            modified
        })
    }

    /// Publishes `block` if it is newer than the current one. Returns `true` if it was published.
    pub fn advance_block(&self, block: AnchorBlock) -> bool {
        self.block.send_if_modified(|current| {
            if current.is_some_and(|known| known.number >= block.number) {
                return false;
            }
            *current = Some(block);
            true
        })
    }

    /// Spawns a task publishing the latest block of `reader` every `every`.
    pub fn spawn_block_watcher(
        self: &Arc<Self>,
        reader: Arc<dyn ChainReader>,
        every: Duration,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut clock = interval(every);
            loop {
                clock.tick().await;
                match reader.latest_block().await {
                    Ok(block) => {
                        if this.advance_block(block) {
                            debug!(number = block.number, timestamp = block.timestamp, "New block");
                        }
                    }
                    Err(err) => warn!(%err, "Failed to fetch the latest block"),
                }
            }
        })
    }
}

/// Receiving side of the context channels.
#[derive(Debug, Clone)]
pub struct ContextSubscriber {
    /// Wallet changes.
    pub wallet: watch::Receiver<WalletState>,
    /// Block changes.
    pub block: watch::Receiver<Option<AnchorBlock>>,
    /// Vault target changes.
    pub vault: watch::Receiver<Address>,
}
