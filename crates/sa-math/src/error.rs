//! Error types for hypothesis tests.

use thiserror::Error;

/// Result type for hypothesis tests.
pub type Result<T> = std::result::Result<T, HypothesisError>;

/// Inputs a test cannot be computed on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HypothesisError {
    /// The contingency table has no observations.
    #[error("contingency table is empty")]
    EmptyTable,

    /// Contingency rows differ in length.
    #[error("contingency table is ragged: row {row} has {found} columns, expected {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Some expected frequency is zero, so the statistic is undefined.
    #[error("contingency table has a zero expected frequency")]
    ZeroExpected,

    /// A test needs more groups than were supplied.
    #[error("at least {needed} groups required, got {got}")]
    TooFewGroups { needed: usize, got: usize },
}
