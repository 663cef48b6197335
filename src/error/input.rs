use thiserror::Error;

/// Errors caused by user input.
///
/// The messages are meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The input is not a valid address.
    #[error("Please enter a valid address.")]
    InvalidAddress(String),
    /// The input is not a valid token amount.
    #[error("Please enter a valid amount.")]
    InvalidAmount(String),
    /// A withdrawal was requested without a known position.
    #[error("Position data not available")]
    MissingPosition,
}
