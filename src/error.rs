//! Error types for valuation requests

use thiserror::Error;

/// Structural problems with a valuation request.
///
/// These are the only conditions that stop a valuation. Missing or degraded
/// fundamentals never produce one of these; they become warnings instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The request carried no scenarios.
    #[error("at least one scenario is required")]
    NoScenarios,

    /// Forecast horizon outside the supported range.
    #[error("forecast horizon must be between 1 and {max} years, got {years}")]
    ForecastYearsOutOfRange { years: u32, max: u32 },

    /// Discount rate at or below -100% (or not a number).
    #[error("discount rate must be a finite number greater than -1, got {0}")]
    InvalidDiscountRate(f64),

    /// Margin of safety is not a number.
    #[error("margin of safety must be a finite number, got {0}")]
    InvalidMarginOfSafety(f64),

    /// Terminal multiple negative or not a number.
    #[error("scenario '{name}': terminal multiple must be a finite non-negative number, got {value}")]
    InvalidTerminalMultiple { name: String, value: f64 },

    /// Probability weight negative or not a number.
    #[error("scenario '{name}': probability weight must be a finite non-negative number, got {value}")]
    InvalidProbabilityWeight { name: String, value: f64 },
}

/// Failure for one ticker inside a batch run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// The provider has no fundamentals for the ticker.
    #[error("no fundamentals available for ticker {0}")]
    UnknownTicker(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
