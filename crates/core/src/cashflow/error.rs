//! Cash-flow error types.

use thiserror::Error;

/// Cash-flow projection errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CashFlowError {
    /// Month outside 1..=12.
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    /// Year outside the supported range.
    #[error("Year {0} is out of range")]
    InvalidYear(i32),

    /// Income/expense figures cannot be negative.
    #[error("{field} cannot be negative")]
    NegativeAmount {
        /// Offending field.
        field: &'static str,
    },

    /// A figure has sub-cent precision or too many integer digits.
    #[error("{field} must have at most two decimal places and thirteen integer digits")]
    AmountPrecision {
        /// Offending field.
        field: &'static str,
    },
}

impl CashFlowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMonth(_) => "invalid_month",
            Self::InvalidYear(_) => "invalid_year",
            Self::NegativeAmount { .. } => "negative_amount",
            Self::AmountPrecision { .. } => "amount_precision",
        }
    }
}
