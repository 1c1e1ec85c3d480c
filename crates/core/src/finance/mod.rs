//! Income and expense reconciliation.
//!
//! Both record kinds share one shape ([`FinancialRecord`]) and one set of
//! rules:
//!
//! - `validation` - state/amount consistency and form-level field checks
//! - `settlement` - partial-settlement accumulation and state derivation
//! - `overdue` - late classification against a fixed "today"
//! - `rollup` - propagation of expense settlements into budget lines
//!
//! Everything here is pure. The transactional wrapper lives in the db crate.

pub mod error;
pub mod overdue;
pub mod rollup;
pub mod settlement;
pub mod types;
pub mod validation;

#[cfg(test)]
mod settlement_props;
#[cfg(test)]
mod validation_props;

pub use error::{FieldError, FinanceError};
pub use overdue::{OPEN_STATES, OverdueClassifier, OverdueStatus, classify_overdue};
pub use rollup::{BudgetRollup, BudgetRollupFailed, RollupFailureReason, plan_rollup};
pub use settlement::{SettlementOutcome, SettlementRequest, apply_settlement, mark_fully_settled};
pub use types::{
    ExpenseType, FinancialRecord, IncomeType, PaymentMethod, RecordKind, SettlementState,
};
pub use validation::{
    ExpenseForm, IncomeForm, RecordForm, StateViolation, state_violations, validate_expense_form,
    validate_income_form, validate_state,
};
