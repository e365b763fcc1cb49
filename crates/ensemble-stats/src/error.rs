//! Error types for distribution construction and evaluation.

/// Errors that can occur when building or evaluating a distribution.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// The shape has no entries.
    #[error("distribution shape is empty")]
    EmptyShape,

    /// The index lists the same label twice.
    #[error("duplicate index label {0}")]
    DuplicateIndex(String),

    /// A distribution parameter is outside its domain.
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A quantile was requested outside the open unit interval.
    #[error("quantile {0} is outside (0, 1)")]
    QuantileOutOfRange(f64),

    /// An ensemble of zero realizations was requested.
    #[error("ensemble size must be positive")]
    ZeroEnsembleSize,
}
