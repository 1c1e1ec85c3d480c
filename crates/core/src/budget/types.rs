//! Budget data types.

use chrono::NaiveDate;
use obra_shared::types::BudgetLineId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::finance::types::wire_enum;

wire_enum! {
    /// Cost category a budget line plans for.
    pub enum BudgetCategory {
        /// Construction materials.
        Materials => "materials",
        /// Labor.
        Labor => "labor",
        /// Equipment and machinery.
        Equipment => "equipment",
        /// Subcontracted work.
        Subcontracts => "subcontracts",
        /// Administrative overhead.
        Administrative => "administrative",
        /// Indirect costs.
        Indirect => "indirect",
        /// Contingency reserve.
        Contingency => "contingency",
        /// Anything else.
        Other => "other",
    }
}

/// A budget line of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Line ID.
    pub id: BudgetLineId,
    /// Cost category.
    pub category: BudgetCategory,
    /// Free-form subcategory.
    pub subcategory: String,
    /// Description.
    pub description: String,
    /// Planned amount.
    pub planned_amount: Decimal,
    /// Amount committed (ordered but not yet paid).
    pub committed_amount: Decimal,
    /// Amount actually paid against this line.
    pub spent_amount: Decimal,
    /// First day of the budgeted period.
    pub period_start: NaiveDate,
    /// Last day of the budgeted period.
    pub period_end: NaiveDate,
}

impl BudgetLine {
    /// Creates an empty line with nothing committed or spent.
    #[must_use]
    pub fn new(
        category: BudgetCategory,
        planned_amount: Decimal,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Self {
        Self {
            id: BudgetLineId::new(),
            category,
            subcategory: String::new(),
            description: String::new(),
            planned_amount,
            committed_amount: Decimal::ZERO,
            spent_amount: Decimal::ZERO,
            period_start,
            period_end,
        }
    }

    /// `planned - committed - spent`. Negative when overrun.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.planned_amount - self.committed_amount - self.spent_amount
    }

    /// `spent / planned`, 0 when nothing is planned.
    #[must_use]
    pub fn usage_ratio(&self) -> Decimal {
        if self.planned_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.spent_amount / self.planned_amount
        }
    }

    /// Usage as a percentage rounded to 2 decimal places.
    #[must_use]
    pub fn usage_percent(&self) -> Decimal {
        (self.usage_ratio() * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Returns true when more was spent than planned.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.spent_amount > self.planned_amount
    }

    /// Charges a settled expense amount to the line.
    pub fn record_spend(&mut self, increment: Decimal) {
        self.spent_amount += increment;
    }
}

/// Input for creating or replacing a budget line.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetLineInput {
    /// Cost category.
    pub category: BudgetCategory,
    /// Free-form subcategory.
    #[serde(default)]
    pub subcategory: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Planned amount.
    pub planned_amount: Decimal,
    /// Committed amount.
    #[serde(default)]
    pub committed_amount: Decimal,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
}

/// Planned versus spent comparison for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarianceResult {
    /// Planned amount.
    pub planned: Decimal,
    /// Spent amount.
    pub spent: Decimal,
    /// `planned - spent`.
    pub variance: Decimal,
    /// Variance as a percentage of planned.
    pub variance_percent: Decimal,
    /// Classification.
    pub status: VarianceStatus,
}

/// Variance status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Under budget.
    Favorable,
    /// Over budget.
    Unfavorable,
    /// Exactly on budget.
    OnBudget,
}

/// Totals across the budget lines of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    /// Sum of planned amounts.
    pub total_planned: Decimal,
    /// Sum of committed amounts.
    pub total_committed: Decimal,
    /// Sum of spent amounts.
    pub total_spent: Decimal,
    /// Sum of available amounts.
    pub total_available: Decimal,
    /// Overall usage percentage.
    pub usage_percent: Decimal,
    /// Number of lines spent beyond plan.
    pub over_budget_lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(planned: Decimal, committed: Decimal, spent: Decimal) -> BudgetLine {
        BudgetLine {
            committed_amount: committed,
            spent_amount: spent,
            ..BudgetLine::new(
                BudgetCategory::Materials,
                planned,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            )
        }
    }

    #[test]
    fn test_available_amount() {
        assert_eq!(line(dec!(10000), dec!(2500), dec!(3000)).available(), dec!(4500));
        assert_eq!(line(dec!(1000), dec!(0), dec!(1200)).available(), dec!(-200));
    }

    #[test]
    fn test_usage_percent() {
        assert_eq!(line(dec!(3000), dec!(0), dec!(1000)).usage_percent(), dec!(33.33));
        assert_eq!(line(dec!(1000), dec!(0), dec!(1000)).usage_percent(), dec!(100));
    }

    #[test]
    fn test_zero_planned_has_zero_usage() {
        let l = line(dec!(0), dec!(0), dec!(50));
        assert_eq!(l.usage_ratio(), Decimal::ZERO);
        assert!(l.is_over_budget());
    }

    #[test]
    fn test_record_spend() {
        let mut l = line(dec!(10000), dec!(0), dec!(200));
        l.record_spend(dec!(500));
        assert_eq!(l.spent_amount, dec!(700));
        assert!(!l.is_over_budget());
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(BudgetCategory::Subcontracts.as_str(), "subcontracts");
        assert_eq!(BudgetCategory::parse("Contingency"), Some(BudgetCategory::Contingency));
        assert_eq!(BudgetCategory::ALL.len(), 8);
    }
}
