//! Budget error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Budget-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// An amount field is negative.
    #[error("{field} cannot be negative")]
    NegativeAmount {
        /// Offending field.
        field: &'static str,
    },

    /// An amount has sub-cent precision or too many integer digits.
    #[error("{field} must have at most two decimal places and thirteen integer digits")]
    AmountPrecision {
        /// Offending field.
        field: &'static str,
    },

    /// Period ends before it starts.
    #[error("Period end ({end}) is before period start ({start})")]
    InvalidPeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Spend increments must be positive.
    #[error("Spend increment must be greater than zero")]
    InvalidIncrement,
}

impl BudgetError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount { .. } => "negative_amount",
            Self::AmountPrecision { .. } => "amount_precision",
            Self::InvalidPeriod { .. } => "invalid_period",
            Self::InvalidIncrement => "invalid_increment",
        }
    }
}
