//! Bundle orchestration.
//!
//! [`submit`] turns a [`BundleIntent`] into transactions against a simulation snapshot:
//! `Validating → Populating → Finalizing → Encoding → Signing → Sending → Done`. Nothing is
//! retried and nothing is rolled back: a failure while sending leaves earlier transactions
//! on-chain.

mod bundler;
pub use bundler::{
    Bundle, BundleRequirements, Bundler, BundlingOptions, PublicAllocatorOptions,
    SignatureRequirement, TxRequirement,
};

mod direct;
pub use direct::DirectBundler;

mod intent;
pub use intent::{
    BundleIntent, WithdrawAmount, deposit_intent, format_amount, parse_address, parse_amount,
    withdraw_intent,
};

mod operation;
pub use operation::{
    BlueAction, BlueOperation, BundlerOperation, Erc20Action, Erc20Operation, InputOperation,
    MetaMorphoAction, MetaMorphoOperation, involved_tokens,
};

use crate::{
    addresses::simple_permit_tokens,
    constants::DEFAULT_SLIPPAGE_TOLERANCE,
    context::ChainContext,
    error::BundleError,
    simulation::SimulationState,
    wallet::Wallet,
};
use alloy::primitives::{Address, Signature, TxHash, U256};
use std::{collections::BTreeSet, fmt};
use tracing::{debug, info, instrument};

/// A stage of a bundle submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleStage {
    /// Checking the wallet and the simulation state.
    Validating,
    /// Expanding the intent into operations.
    Populating,
    /// Resolving final amounts and addresses.
    Finalizing,
    /// Encoding the bundle.
    Encoding,
    /// Satisfying signature requirements.
    Signing,
    /// Sending the transactions.
    Sending,
    /// Every transaction was sent.
    Done,
}

impl fmt::Display for BundleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Populating => "populating",
            Self::Finalizing => "finalizing",
            Self::Encoding => "encoding",
            Self::Signing => "signing",
            Self::Sending => "sending",
            Self::Done => "done",
        })
    }
}

/// Caller options of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Whether the wallet can sign off-chain messages.
    pub supports_signature: bool,
    /// Tokens permitted with a simple signature, on top of the chain defaults.
    pub with_simple_permit: BTreeSet<Address>,
    /// Tokens to unwrap at the end of the bundle.
    pub unwrap_tokens: BTreeSet<Address>,
    /// Slippage tolerance of unwrapping, in WAD.
    pub unwrap_slippage: U256,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            supports_signature: true,
            with_simple_permit: BTreeSet::new(),
            unwrap_tokens: BTreeSet::new(),
            unwrap_slippage: DEFAULT_SLIPPAGE_TOLERANCE,
        }
    }
}

/// The result of a successful submission.
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    /// The finalized operations.
    pub operations: Vec<BundlerOperation>,
    /// The encoded bundle.
    pub bundle: Bundle,
    /// Every token touched by the bundle.
    pub tokens: BTreeSet<Address>,
    /// Signatures, in requirement order.
    pub signatures: Vec<Signature>,
    /// Hashes of the sent transactions, requirements first.
    pub tx_hashes: Vec<TxHash>,
}

fn failed<E: fmt::Display>(stage: BundleStage) -> impl FnOnce(E) -> BundleError {
    move |err| BundleError::Stage { stage, message: err.to_string() }
}

/// Submits `intent` through `bundler`, signing and sending with `wallet`.
///
/// Fails without calling the bundler if no account is connected, the simulation is still loading,
/// or the simulation reported a genuine failure.
#[instrument(skip_all, fields(vault = %intent.vault(), sender = %intent.sender()))]
pub async fn submit(
    intent: BundleIntent,
    wallet: &dyn Wallet,
    simulation: &SimulationState,
    bundler: &dyn Bundler,
    options: SubmitOptions,
) -> Result<BundleOutcome, BundleError> {
    let account = wallet.account().ok_or(BundleError::NoAccount)?;
    if simulation.is_pending {
        return Err(BundleError::SimulationPending);
    }
    if let Some(error) = &simulation.error {
        return Err(BundleError::SimulationFailed(error.clone()));
    }
    let snapshot = simulation.data.as_deref().ok_or(BundleError::SimulationPending)?;
    debug!(block = snapshot.block.number, "Validated submission");

    let chain = ChainContext::new(snapshot.chain_id);
    let mut with_simple_permit = simple_permit_tokens(chain.effective_chain_id());
    with_simple_permit.extend(options.with_simple_permit);
    let bundling = BundlingOptions {
        with_simple_permit,
        public_allocator: PublicAllocatorOptions { enabled: true },
    };

    let operations = bundler
        .populate(vec![intent.into_operation()], snapshot, &bundling)
        .map_err(failed(BundleStage::Populating))?;
    let operations = bundler
        .finalize(operations, snapshot, account, &options.unwrap_tokens, options.unwrap_slippage)
        .map_err(failed(BundleStage::Finalizing))?;
    let bundle = bundler
        .encode(&operations, snapshot, options.supports_signature)
        .map_err(failed(BundleStage::Encoding))?;
    let tokens = involved_tokens(&operations, snapshot);
    debug!(operations = operations.len(), ?tokens, "Encoded bundle");

    let mut signatures = Vec::with_capacity(bundle.requirements.signatures.len());
    for requirement in &bundle.requirements.signatures {
        debug!(description = %requirement.description, "Signing requirement");
        signatures.push(requirement.sign(wallet).await.map_err(failed(BundleStage::Signing))?);
    }

    let mut tx_hashes = Vec::with_capacity(bundle.requirements.txs.len() + 1);
    for tx in bundle.requirements.txs.iter().map(|requirement| &requirement.tx).chain([&bundle.tx])
    {
        let tx_hash =
            wallet.send_transaction(tx.clone()).await.map_err(failed(BundleStage::Sending))?;
        debug!(%tx_hash, "Transaction mined");
        tx_hashes.push(tx_hash);
    }

    info!(stage = %BundleStage::Done, txs = tx_hashes.len(), "Bundle submitted");

    Ok(BundleOutcome { operations, bundle, tokens, signatures, tx_hashes })
}
