//! In-memory chain, simulation service and wallet.

use alloy::{
    primitives::{Address, B256, ChainId, Signature, TxHash, U256, address, keccak256},
    rpc::types::TransactionRequest,
    signers::{Signer, local::PrivateKeySigner},
    transports::TransportErrorKind,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use vault_kit::{
    constants::DEFAULT_VAULT,
    error::{ChainReadError, WalletError},
    math::WAD,
    provider::{ChainReader, TokenInfo, VaultInfo},
    simulation::{
        AnchorBlock, Holding, SimulationError, SimulationErrorCategories, SimulationResponse,
        SimulationScope, SimulationService, SimulationSnapshot,
    },
    wallet::Wallet,
};

pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const OTHER_VAULT: Address = address!("BEEF01735c132Ada46AA9aA4c54623cAA92A64CB");

/// On-chain state served by [`MockChain`].
#[derive(Debug)]
pub struct ChainState {
    pub block: AnchorBlock,
    pub balances: HashMap<(Address, Address), U256>,
    pub allowances: HashMap<(Address, Address, Address), U256>,
    pub vaults: HashMap<Address, VaultInfo>,
    pub tokens: HashMap<Address, TokenInfo>,
}

/// A chain whose state is edited by the test.
#[derive(Debug)]
pub struct MockChain {
    pub state: Mutex<ChainState>,
    /// Delay applied to reads of a vault.
    pub vault_delays: Mutex<HashMap<Address, Duration>>,
    /// Delay applied to snapshots anchored at a block.
    pub block_delays: Mutex<HashMap<u64, Duration>>,
    /// Category errors reported with every snapshot.
    pub category_errors: Mutex<SimulationErrorCategories>,
    pub vault_reads: AtomicUsize,
}

impl MockChain {
    /// The `0x2371…0618` vault with 1000 WETH of assets for 900 shares.
    pub fn mainnet() -> Arc<Self> {
        let vault = |address, symbol: &str| VaultInfo {
            address,
            asset: WETH,
            symbol: symbol.to_string(),
            decimals: 18,
            total_assets: U256::from(1000) * WAD,
            total_supply: U256::from(900) * WAD,
            decimals_offset: 0,
        };

        Arc::new(Self {
            state: Mutex::new(ChainState {
                block: AnchorBlock { number: 100, timestamp: 1_200 },
                balances: HashMap::new(),
                allowances: HashMap::new(),
                vaults: HashMap::from([
                    (DEFAULT_VAULT, vault(DEFAULT_VAULT, "mWETH")),
                    (OTHER_VAULT, vault(OTHER_VAULT, "oWETH")),
                ]),
                tokens: HashMap::from([(
                    WETH,
                    TokenInfo { address: WETH, symbol: Some("WETH".to_string()), decimals: 18 },
                )]),
            }),
            vault_delays: Default::default(),
            block_delays: Default::default(),
            category_errors: Mutex::new(SimulationErrorCategories::shell()),
            vault_reads: AtomicUsize::new(0),
        })
    }

    pub fn set_balance(&self, owner: Address, token: Address, balance: U256) {
        self.state.lock().unwrap().balances.insert((owner, token), balance);
    }

    pub fn set_allowance(&self, owner: Address, token: Address, spender: Address, amount: U256) {
        self.state.lock().unwrap().allowances.insert((owner, token, spender), amount);
    }

    pub fn set_block(&self, block: AnchorBlock) {
        self.state.lock().unwrap().block = block;
    }

    pub fn delay_vault(&self, vault: Address, delay: Duration) {
        self.vault_delays.lock().unwrap().insert(vault, delay);
    }

    pub fn delay_block(&self, number: u64, delay: Duration) {
        self.block_delays.lock().unwrap().insert(number, delay);
    }

    fn snapshot(&self, scope: &SimulationScope, block: AnchorBlock) -> SimulationSnapshot {
        let state = self.state.lock().unwrap();
        let mut snapshot = SimulationSnapshot::new(scope.chain.chain_id, block);

        for vault in &scope.vaults {
            if let Some(info) = state.vaults.get(vault) {
                snapshot.vaults.insert(*vault, info.clone());
                snapshot.tokens.insert(
                    *vault,
                    TokenInfo {
                        address: *vault,
                        symbol: Some(info.symbol.clone()),
                        decimals: info.decimals,
                    },
                );
            }
        }
        for (address, token) in &state.tokens {
            snapshot.tokens.insert(*address, token.clone());
        }

        let tokens = snapshot.tokens.keys().copied().collect::<Vec<_>>();
        for user in &scope.users {
            for token in &tokens {
                let allowances = scope
                    .vaults
                    .iter()
                    .map(|spender| {
                        let amount = state
                            .allowances
                            .get(&(*user, *token, *spender))
                            .copied()
                            .unwrap_or_default();
                        (*spender, amount)
                    })
                    .collect();
                snapshot.insert_holding(Holding {
                    user: *user,
                    token: *token,
                    balance: state.balances.get(&(*user, *token)).copied().unwrap_or_default(),
                    allowances,
                });
            }
        }

        snapshot
    }
}

#[async_trait::async_trait]
impl ChainReader for MockChain {
    async fn holding(&self, owner: Address, token: Address) -> Result<U256, ChainReadError> {
        Ok(self.state.lock().unwrap().balances.get(&(owner, token)).copied().unwrap_or_default())
    }

    async fn vault(&self, vault: Address) -> Result<VaultInfo, ChainReadError> {
        self.vault_reads.fetch_add(1, Ordering::SeqCst);
        let delay = self.vault_delays.lock().unwrap().get(&vault).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .unwrap()
            .vaults
            .get(&vault)
            .cloned()
            .ok_or_else(|| ChainReadError::from(TransportErrorKind::custom_str("execution reverted")))
    }

    async fn token(&self, token: Address) -> Result<TokenInfo, ChainReadError> {
        Ok(self.state.lock().unwrap().tokens.get(&token).cloned().unwrap_or(TokenInfo {
            address: token,
            symbol: None,
            decimals: 18,
        }))
    }

    async fn latest_block(&self) -> Result<AnchorBlock, ChainReadError> {
        Ok(self.state.lock().unwrap().block)
    }
}

#[async_trait::async_trait]
impl SimulationService for MockChain {
    async fn fetch(&self, scope: &SimulationScope) -> SimulationResponse {
        let Some(block) = scope.block else {
            return SimulationResponse::fatal("no anchor block");
        };
        let delay = self.block_delays.lock().unwrap().get(&block.number).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let errors = self.category_errors.lock().unwrap().clone();
        SimulationResponse {
            data: Some(self.snapshot(scope, block)),
            error: Some(SimulationError::Categories(Box::new(errors))),
        }
    }
}

/// A wallet recording every transaction it is asked to send.
#[derive(Debug)]
pub struct MockWallet {
    pub signer: Option<PrivateKeySigner>,
    pub chain_id: ChainId,
    pub sent: Mutex<Vec<TransactionRequest>>,
}

impl MockWallet {
    pub fn connected(chain_id: ChainId) -> Self {
        Self { signer: Some(PrivateKeySigner::random()), chain_id, sent: Default::default() }
    }

    pub fn disconnected() -> Self {
        Self { signer: None, chain_id: 1, sent: Default::default() }
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Wallet for MockWallet {
    fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        self.account().ok_or(WalletError::NoAccount)?;
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        Ok(keccak256(sent.len().to_be_bytes()))
    }

    async fn sign_hash(&self, hash: B256) -> Result<Signature, WalletError> {
        let signer = self.signer.as_ref().ok_or(WalletError::NoAccount)?;
        Ok(signer.sign_hash(&hash).await?)
    }
}
