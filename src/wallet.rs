//! The connected wallet.

use crate::{context::WalletState, error::WalletError};
use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, B256, ChainId, Signature, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::ClientBuilder, types::TransactionRequest},
    signers::{Signer, local::PrivateKeySigner},
    transports::layers::RetryBackoffLayer,
};
use std::{fmt::Debug, str::FromStr};
use tracing::{debug, info, instrument};
use url::Url;

/// [`RetryBackoffLayer`] used for chain providers.
///
/// We are allowing max 10 retries with a backoff of 800ms. The CU/s is set to max value to avoid
/// any throttling.
const RETRY_LAYER: RetryBackoffLayer = RetryBackoffLayer::new(10, 800, u64::MAX);

/// A wallet able to send transactions and sign hashes on behalf of its account.
#[async_trait::async_trait]
pub trait Wallet: Debug + Send + Sync {
    /// Returns the connected account, if any.
    fn account(&self) -> Option<Address>;

    /// Returns the chain the wallet is connected to.
    fn chain_id(&self) -> ChainId;

    /// Sends a transaction from the connected account and waits for it to be mined.
    ///
    /// Returns [`WalletError::Reverted`] if the transaction was mined but failed.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError>;

    /// Signs a hash with the connected account.
    async fn sign_hash(&self, hash: B256) -> Result<Signature, WalletError>;

    /// Returns what the wallet reports to the chain context.
    fn state(&self) -> WalletState {
        WalletState { account: self.account(), chain_id: Some(self.chain_id()) }
    }
}

/// A [`Wallet`] holding a local private key.
///
/// Without a key, the wallet is read-only and reports no account.
#[derive(Debug, Clone)]
pub struct LocalWallet {
    provider: DynProvider,
    signer: Option<PrivateKeySigner>,
    chain_id: ChainId,
}

impl LocalWallet {
    /// Connects to `endpoint`, optionally with a hex-encoded private key.
    #[instrument(skip(private_key))]
    pub async fn connect(endpoint: &Url, private_key: Option<&str>) -> Result<Self, WalletError> {
        let signer = private_key.map(PrivateKeySigner::from_str).transpose()?;

        let client = ClientBuilder::default()
            .layer(RETRY_LAYER.clone())
            .connect(endpoint.as_str())
            .await?;

        let provider = match &signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer.clone()))
                .connect_client(client)
                .erased(),
            None => ProviderBuilder::new().connect_client(client).erased(),
        };

        let chain_id = provider.get_chain_id().await?;
        info!(chain_id, account = ?signer.as_ref().map(|s| s.address()), "Connected wallet");

        Ok(Self { provider, signer, chain_id })
    }

    /// Returns the provider of the wallet.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait::async_trait]
impl Wallet for LocalWallet {
    fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    #[instrument(skip_all, fields(to = ?tx.to))]
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, WalletError> {
        let account = self.account().ok_or(WalletError::NoAccount)?;

        let pending = self.provider.send_transaction(tx.with_from(account)).await?;
        debug!(tx_hash = %pending.tx_hash(), "Sent transaction");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(WalletError::Reverted(receipt.transaction_hash));
        }

        Ok(receipt.transaction_hash)
    }

    async fn sign_hash(&self, hash: B256) -> Result<Signature, WalletError> {
        let signer = self.signer.as_ref().ok_or(WalletError::NoAccount)?;
        Ok(signer.sign_hash(&hash).await?)
    }
}
