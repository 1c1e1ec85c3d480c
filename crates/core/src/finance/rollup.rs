//! Budget rollup of expense settlements.
//!
//! A settled expense amount is charged to the linked budget line's spent
//! amount. Failing to apply the charge never undoes the settlement; it is
//! reported as a [`BudgetRollupFailed`] warning instead.

use obra_shared::types::BudgetLineId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::settlement::SettlementOutcome;
use super::types::RecordKind;

/// Increment to apply to a budget line's spent amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRollup {
    /// Line to charge.
    pub budget_line_id: BudgetLineId,
    /// Amount to add to `spent_amount`.
    pub increment: Decimal,
}

/// Returns the rollup a settlement requires, if any.
///
/// Only expenses linked to a budget line that actually gained accumulated
/// amount produce a rollup.
#[must_use]
pub fn plan_rollup(outcome: &SettlementOutcome) -> Option<BudgetRollup> {
    if outcome.record.kind != RecordKind::Expense || outcome.applied <= Decimal::ZERO {
        return None;
    }
    outcome
        .record
        .linked_budget_line
        .map(|budget_line_id| BudgetRollup {
            budget_line_id,
            increment: outcome.applied,
        })
}

/// Why a rollup could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RollupFailureReason {
    /// The line no longer exists in the expense's project.
    LineMissing,
    /// The update itself failed.
    Database(String),
}

impl std::fmt::Display for RollupFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineMissing => f.write_str("budget line not found in project"),
            Self::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

/// Non-fatal warning returned alongside a committed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetRollupFailed {
    /// Line that should have been charged.
    pub budget_line_id: BudgetLineId,
    /// Amount that was not applied.
    pub increment: Decimal,
    /// Cause.
    pub reason: RollupFailureReason,
}

impl BudgetRollupFailed {
    /// Builds the warning for a rollup that could not be applied.
    #[must_use]
    pub fn new(rollup: BudgetRollup, reason: RollupFailureReason) -> Self {
        Self {
            budget_line_id: rollup.budget_line_id,
            increment: rollup.increment,
            reason,
        }
    }

    /// Returns the rollup to retry.
    #[must_use]
    pub fn rollup(&self) -> BudgetRollup {
        BudgetRollup {
            budget_line_id: self.budget_line_id,
            increment: self.increment,
        }
    }
}

impl std::fmt::Display for BudgetRollupFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "budget line {} was not charged {}: {}",
            self.budget_line_id, self.increment, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::settlement::{SettlementRequest, apply_settlement};
    use crate::finance::types::{FinancialRecord, PaymentMethod};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal) -> SettlementRequest {
        SettlementRequest {
            amount,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            method: Some(PaymentMethod::Transfer),
        }
    }

    #[test]
    fn test_linked_expense_rolls_up_applied_amount() {
        let line = BudgetLineId::new();
        let expense = FinancialRecord::new_expense(dec!(500), None, Some(line));
        let outcome = apply_settlement(&expense, &request(dec!(500))).unwrap();

        let rollup = plan_rollup(&outcome).unwrap();
        assert_eq!(rollup.budget_line_id, line);
        assert_eq!(rollup.increment, dec!(500));
    }

    #[test]
    fn test_unlinked_expense_has_no_rollup() {
        let expense = FinancialRecord::new_expense(dec!(500), None, None);
        let outcome = apply_settlement(&expense, &request(dec!(200))).unwrap();
        assert!(plan_rollup(&outcome).is_none());
    }

    #[test]
    fn test_income_never_rolls_up() {
        let mut income = FinancialRecord::new_income(dec!(500), None);
        income.linked_budget_line = Some(BudgetLineId::new());
        let outcome = apply_settlement(&income, &request(dec!(200))).unwrap();
        assert!(plan_rollup(&outcome).is_none());
    }

    #[test]
    fn test_failure_warning_keeps_rollup() {
        let rollup = BudgetRollup {
            budget_line_id: BudgetLineId::new(),
            increment: dec!(120.25),
        };
        let warning = BudgetRollupFailed::new(rollup, RollupFailureReason::LineMissing);
        assert_eq!(warning.rollup(), rollup);
        assert!(warning.to_string().contains("120.25"));
        assert!(warning.to_string().contains("not found"));
    }

    #[test]
    fn test_failure_reason_serializes_tagged() {
        let json = serde_json::to_value(RollupFailureReason::Database("timeout".into())).unwrap();
        assert_eq!(json["kind"], "database");
        assert_eq!(json["detail"], "timeout");
    }
}
