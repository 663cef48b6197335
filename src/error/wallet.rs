use alloy::primitives::TxHash;
use thiserror::Error;

/// Errors related to the connected wallet.
#[derive(Debug, Error)]
pub enum WalletError {
    /// No account is connected.
    #[error("no account connected")]
    NoAccount,
    /// The private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[from] alloy::signers::local::LocalSignerError),
    /// Signing failed.
    #[error(transparent)]
    Signer(#[from] alloy::signers::Error),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),
    /// Waiting for the transaction receipt failed.
    #[error(transparent)]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),
    /// The transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
}
