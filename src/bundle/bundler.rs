use super::{BundlerOperation, InputOperation};
use crate::{
    error::{BundlerError, WalletError},
    simulation::SimulationSnapshot,
    wallet::Wallet,
};
use alloy::{
    primitives::{Address, B256, Signature, U256},
    rpc::types::TransactionRequest,
};
use std::{collections::BTreeSet, fmt::Debug};

/// Public allocator settings applied when populating a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicAllocatorOptions {
    /// Whether liquidity may be reallocated through the public allocator.
    pub enabled: bool,
}

/// Options applied when populating a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlingOptions {
    /// Tokens approved with a simple permit signature instead of a transaction.
    pub with_simple_permit: BTreeSet<Address>,
    /// Public allocator settings.
    pub public_allocator: PublicAllocatorOptions,
}

/// An off-chain signature the bundle needs before it can be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequirement {
    /// The hash to sign.
    pub hash: B256,
    /// What the signature authorizes.
    pub description: String,
}

impl SignatureRequirement {
    /// Signs the requirement with the connected account of `wallet`.
    pub async fn sign(&self, wallet: &dyn Wallet) -> Result<Signature, WalletError> {
        wallet.sign_hash(self.hash).await
    }
}

/// A transaction to send before the bundle transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRequirement {
    /// The transaction.
    pub tx: TransactionRequest,
    /// What the transaction does.
    pub description: String,
}

/// What must happen before the bundle transaction is sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleRequirements {
    /// Signatures, satisfied in order.
    pub signatures: Vec<SignatureRequirement>,
    /// Transactions, sent in order.
    pub txs: Vec<TxRequirement>,
}

/// An encoded bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// Requirements of the bundle.
    pub requirements: BundleRequirements,
    /// The bundle transaction.
    pub tx: TransactionRequest,
}

/// Turns operations into a signable, sendable bundle.
///
/// The three steps are pure: they only read the snapshot.
pub trait Bundler: Debug + Send + Sync {
    /// Expands input operations into the operations needed to execute them.
    fn populate(
        &self,
        operations: Vec<InputOperation>,
        snapshot: &SimulationSnapshot,
        options: &BundlingOptions,
    ) -> Result<Vec<BundlerOperation>, BundlerError>;

    /// Resolves the final amounts and addresses of the operations executed by `account`.
    fn finalize(
        &self,
        operations: Vec<BundlerOperation>,
        snapshot: &SimulationSnapshot,
        account: Address,
        unwrap_tokens: &BTreeSet<Address>,
        unwrap_slippage: U256,
    ) -> Result<Vec<BundlerOperation>, BundlerError>;

    /// Encodes the operations.
    fn encode(
        &self,
        operations: &[BundlerOperation],
        snapshot: &SimulationSnapshot,
        supports_signature: bool,
    ) -> Result<Bundle, BundlerError>;
}
