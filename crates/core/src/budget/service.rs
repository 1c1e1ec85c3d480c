//! Budget service for validation, variance and summaries.

use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::{BudgetLine, BudgetLineInput, BudgetSummary, VarianceResult, VarianceStatus};
use crate::money::fits_amount;

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Validates a budget line input.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAmount` for a negative planned or
    /// committed amount, `BudgetError::AmountPrecision` for one that does not
    /// fit in whole cents, `BudgetError::InvalidPeriod` if the period ends
    /// before it starts.
    pub fn validate_line(input: &BudgetLineInput) -> Result<(), BudgetError> {
        for (field, amount) in [
            ("planned_amount", input.planned_amount),
            ("committed_amount", input.committed_amount),
        ] {
            if amount < Decimal::ZERO {
                return Err(BudgetError::NegativeAmount { field });
            }
            if !fits_amount(amount) {
                return Err(BudgetError::AmountPrecision { field });
            }
        }
        if input.period_end < input.period_start {
            return Err(BudgetError::InvalidPeriod {
                start: input.period_start,
                end: input.period_end,
            });
        }
        Ok(())
    }

    /// Validates a manual spend increment.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidIncrement` unless the increment is positive,
    /// `BudgetError::AmountPrecision` if it is finer than a cent.
    pub fn validate_increment(increment: Decimal) -> Result<(), BudgetError> {
        if increment <= Decimal::ZERO {
            return Err(BudgetError::InvalidIncrement);
        }
        if !fits_amount(increment) {
            return Err(BudgetError::AmountPrecision { field: "increment" });
        }
        Ok(())
    }

    /// Compares planned against spent.
    ///
    /// Positive variance (under budget) is favorable, negative is
    /// unfavorable.
    #[must_use]
    pub fn calculate_variance(planned: Decimal, spent: Decimal) -> VarianceResult {
        let variance = planned - spent;

        let status = match variance.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => VarianceStatus::Favorable,
            std::cmp::Ordering::Less => VarianceStatus::Unfavorable,
            std::cmp::Ordering::Equal => VarianceStatus::OnBudget,
        };

        let variance_percent = if planned.is_zero() {
            Decimal::ZERO
        } else {
            (variance / planned * Decimal::ONE_HUNDRED).round_dp(2)
        };

        VarianceResult {
            planned,
            spent,
            variance,
            variance_percent,
            status,
        }
    }

    /// Sums the lines of a project.
    #[must_use]
    pub fn summarize(lines: &[BudgetLine]) -> BudgetSummary {
        let total_planned: Decimal = lines.iter().map(|l| l.planned_amount).sum();
        let total_committed: Decimal = lines.iter().map(|l| l.committed_amount).sum();
        let total_spent: Decimal = lines.iter().map(|l| l.spent_amount).sum();

        let usage_percent = if total_planned.is_zero() {
            Decimal::ZERO
        } else {
            (total_spent / total_planned * Decimal::ONE_HUNDRED).round_dp(2)
        };

        BudgetSummary {
            total_planned,
            total_committed,
            total_spent,
            total_available: lines.iter().map(BudgetLine::available).sum(),
            usage_percent,
            over_budget_lines: lines.iter().filter(|l| l.is_over_budget()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::types::BudgetCategory;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn input(planned: Decimal, committed: Decimal) -> BudgetLineInput {
        BudgetLineInput {
            category: BudgetCategory::Labor,
            subcategory: "Cuadrilla estructura".to_string(),
            description: String::new(),
            planned_amount: planned,
            committed_amount: committed,
            period_start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
        }
    }

    fn line(planned: Decimal, spent: Decimal) -> BudgetLine {
        let i = input(planned, dec!(0));
        BudgetLine {
            spent_amount: spent,
            ..BudgetLine::new(i.category, i.planned_amount, i.period_start, i.period_end)
        }
    }

    #[test]
    fn test_validate_line() {
        assert!(BudgetService::validate_line(&input(dec!(5000), dec!(100))).is_ok());
        assert_eq!(
            BudgetService::validate_line(&input(dec!(-1), dec!(0))),
            Err(BudgetError::NegativeAmount {
                field: "planned_amount"
            })
        );
        assert_eq!(
            BudgetService::validate_line(&input(dec!(1), dec!(-1))),
            Err(BudgetError::NegativeAmount {
                field: "committed_amount"
            })
        );
    }

    #[test]
    fn test_validate_line_rejects_sub_cent_amounts() {
        assert_eq!(
            BudgetService::validate_line(&input(dec!(5000.005), dec!(0))),
            Err(BudgetError::AmountPrecision {
                field: "planned_amount"
            })
        );
        assert_eq!(
            BudgetService::validate_increment(dec!(0.001)),
            Err(BudgetError::AmountPrecision { field: "increment" })
        );
    }

    #[test]
    fn test_validate_line_period() {
        let mut i = input(dec!(5000), dec!(0));
        i.period_end = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert!(matches!(
            BudgetService::validate_line(&i),
            Err(BudgetError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_validate_increment() {
        assert!(BudgetService::validate_increment(dec!(0.01)).is_ok());
        assert_eq!(
            BudgetService::validate_increment(dec!(0)),
            Err(BudgetError::InvalidIncrement)
        );
    }

    #[test]
    fn test_variance_favorable() {
        let result = BudgetService::calculate_variance(dec!(1000), dec!(800));
        assert_eq!(result.variance, dec!(200));
        assert_eq!(result.variance_percent, dec!(20.00));
        assert_eq!(result.status, VarianceStatus::Favorable);
    }

    #[test]
    fn test_variance_unfavorable() {
        let result = BudgetService::calculate_variance(dec!(1000), dec!(1200));
        assert_eq!(result.variance, dec!(-200));
        assert_eq!(result.variance_percent, dec!(-20.00));
        assert_eq!(result.status, VarianceStatus::Unfavorable);
    }

    #[test]
    fn test_variance_zero_planned() {
        let result = BudgetService::calculate_variance(dec!(0), dec!(500));
        assert_eq!(result.variance_percent, dec!(0));
        assert_eq!(result.status, VarianceStatus::Unfavorable);
    }

    #[test]
    fn test_summarize() {
        let lines = vec![line(dec!(1000), dec!(1200)), line(dec!(3000), dec!(800))];
        let summary = BudgetService::summarize(&lines);
        assert_eq!(summary.total_planned, dec!(4000));
        assert_eq!(summary.total_spent, dec!(2000));
        assert_eq!(summary.total_available, dec!(2000));
        assert_eq!(summary.usage_percent, dec!(50.00));
        assert_eq!(summary.over_budget_lines, 1);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = BudgetService::summarize(&[]);
        assert_eq!(summary.total_planned, Decimal::ZERO);
        assert_eq!(summary.usage_percent, Decimal::ZERO);
        assert_eq!(summary.over_budget_lines, 0);
    }
}
