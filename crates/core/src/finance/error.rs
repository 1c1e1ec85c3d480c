//! Finance error types.
//!
//! Every variant here aborts the operation with no effect. The non-fatal
//! budget rollup failure is a warning and lives in `rollup`.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A validation message attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as sent by the client.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the reconciliation rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinanceError {
    /// Settlement amount must be positive and in whole cents.
    #[error("Settlement amount must be greater than zero with at most two decimal places")]
    InvalidAmount,

    /// Settlement would exceed the outstanding balance.
    #[error("Amount exceeds the outstanding balance; at most {max_allowed} can be applied")]
    Overpayment {
        /// Outstanding balance (`total - accumulated`).
        max_allowed: Decimal,
    },

    /// A record cannot become settled without a payment method.
    #[error("A payment method is required to settle the record")]
    MissingPaymentMethod,

    /// State and amounts disagree.
    #[error("State is inconsistent with amounts: {}", .reasons.join("; "))]
    StateMismatch {
        /// One reason per violated rule.
        reasons: Vec<String>,
    },

    /// Cancelled records accept no settlements.
    #[error("Record is cancelled")]
    RecordCancelled,

    /// Field-level input errors.
    #[error("Invalid input: {} field error(s)", .errors.len())]
    Validation {
        /// Field errors, in field order.
        errors: Vec<FieldError>,
    },
}

impl FinanceError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount | Self::MissingPaymentMethod | Self::Validation { .. } => 400,
            Self::Overpayment { .. } | Self::StateMismatch { .. } | Self::RecordCancelled => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::Overpayment { .. } => "overpayment",
            Self::MissingPaymentMethod => "missing_payment_method",
            Self::StateMismatch { .. } => "state_mismatch",
            Self::RecordCancelled => "record_cancelled",
            Self::Validation { .. } => "validation_error",
        }
    }

    /// Returns the input field the error should be shown against, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidAmount | Self::Overpayment { .. } => Some("amount"),
            Self::MissingPaymentMethod => Some("payment_method"),
            Self::StateMismatch { .. } => Some("state"),
            Self::RecordCancelled | Self::Validation { .. } => None,
        }
    }
}
