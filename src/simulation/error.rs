//! Simulation error types and normalization.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

/// Errors of a category, keyed by the failing item. A `None` entry is a filler, not a failure.
pub type CategoryErrors = BTreeMap<String, Option<String>>;

/// Errors reported by a simulation service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// The snapshot could not be produced at all.
    #[error("{0}")]
    Fatal(String),
    /// Per-category errors. May hold only fillers, see [`simulation_error_message`].
    #[error("simulation reported category errors")]
    Categories(Box<SimulationErrorCategories>),
}

/// Protocol-wide errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalError {
    /// Failure to read the fee recipient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_recipient: Option<String>,
}

/// Structured errors, one entry per category.
///
/// Services fill this structure on every fetch, including successful ones: the global category
/// is always present and the other categories may be empty maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationErrorCategories {
    /// Protocol-wide errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalError>,
    /// Errors by market id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markets: Option<CategoryErrors>,
    /// Errors by user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<CategoryErrors>,
    /// Errors by token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<CategoryErrors>,
    /// Errors by vault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vaults: Option<CategoryErrors>,
    /// Errors by user and market.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<CategoryErrors>,
    /// Errors by user and token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdings: Option<CategoryErrors>,
    /// Errors by vault and market.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_market_configs: Option<CategoryErrors>,
    /// Errors by vault and user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_users: Option<CategoryErrors>,
}

impl SimulationErrorCategories {
    /// Returns the shell reported on success: an empty global error and empty categories.
    pub fn shell() -> Self {
        Self {
            global: Some(GlobalError::default()),
            markets: Some(CategoryErrors::new()),
            users: Some(CategoryErrors::new()),
            tokens: Some(CategoryErrors::new()),
            vaults: Some(CategoryErrors::new()),
            positions: Some(CategoryErrors::new()),
            holdings: Some(CategoryErrors::new()),
            vault_market_configs: Some(CategoryErrors::new()),
            vault_users: Some(CategoryErrors::new()),
        }
    }

    /// Records the failure of `key` in `category`.
    pub fn record(category: &mut Option<CategoryErrors>, key: impl Display, error: impl Display) {
        category.get_or_insert_default().insert(key.to_string(), Some(error.to_string()));
    }

    /// Returns `true` if at least one category carries a genuine failure.
    ///
    /// The global category counts only through its fee recipient.
    pub fn has_real_error(&self) -> bool {
        let global = self.global.as_ref().is_some_and(|global| global.fee_recipient.is_some());

        global
            || [
                &self.markets,
                &self.users,
                &self.tokens,
                &self.vaults,
                &self.positions,
                &self.holdings,
                &self.vault_market_configs,
                &self.vault_users,
            ]
            .into_iter()
            .flatten()
            .any(|errors| errors.values().any(Option::is_some))
    }
}

/// Collapses a simulation error into a diagnostic, or `None` if it holds no genuine failure.
///
/// This relies on the shape of the filler errors reported on success (see
/// [`SimulationErrorCategories::shell`]). A service reporting fillers differently would be
/// misread as failing.
pub fn simulation_error_message(error: &SimulationError) -> Option<String> {
    match error {
        SimulationError::Fatal(message) => Some(message.clone()),
        SimulationError::Categories(categories) => categories.has_real_error().then(|| {
            serde_json::to_string_pretty(categories).unwrap_or_else(|_| format!("{categories:?}"))
        }),
    }
}
