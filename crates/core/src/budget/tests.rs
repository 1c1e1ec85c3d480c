//! Property-based tests for budget module.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::BudgetService;
use super::types::{BudgetCategory, BudgetLine, VarianceStatus};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn make_line(planned: Decimal, committed: Decimal, spent: Decimal) -> BudgetLine {
    BudgetLine {
        committed_amount: committed,
        spent_amount: spent,
        ..BudgetLine::new(
            BudgetCategory::Other,
            planned,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        )
    }
}

proptest! {
    /// Available amount is planned minus committed minus spent.
    #[test]
    fn prop_available_identity(
        planned in arb_amount(),
        committed in arb_amount(),
        spent in arb_amount(),
    ) {
        let line = make_line(planned, committed, spent);
        prop_assert_eq!(line.available() + committed + spent, planned);
    }

    /// Over budget exactly when spent exceeds planned, and then the variance
    /// is unfavorable.
    #[test]
    fn prop_over_budget_matches_variance(
        planned in arb_amount(),
        spent in arb_amount(),
    ) {
        let line = make_line(planned, Decimal::ZERO, spent);
        let variance = BudgetService::calculate_variance(planned, spent);
        prop_assert_eq!(line.is_over_budget(), spent > planned);
        prop_assert_eq!(
            line.is_over_budget(),
            variance.status == VarianceStatus::Unfavorable
        );
    }

    /// Spend increments accumulate exactly.
    #[test]
    fn prop_record_spend_is_additive(
        planned in arb_amount(),
        increments in prop::collection::vec(1i64..10_000_000i64, 0..10),
    ) {
        let mut line = make_line(planned, Decimal::ZERO, Decimal::ZERO);
        let mut expected = Decimal::ZERO;
        for cents in increments {
            let inc = Decimal::new(cents, 2);
            line.record_spend(inc);
            expected += inc;
        }
        prop_assert_eq!(line.spent_amount, expected);
    }

    /// Summary totals equal the per-line sums.
    #[test]
    fn prop_summary_totals(
        amounts in prop::collection::vec((arb_amount(), arb_amount(), arb_amount()), 0..12),
    ) {
        let lines: Vec<BudgetLine> = amounts
            .iter()
            .map(|(p, c, s)| make_line(*p, *c, *s))
            .collect();
        let summary = BudgetService::summarize(&lines);
        prop_assert_eq!(
            summary.total_available,
            summary.total_planned - summary.total_committed - summary.total_spent
        );
        prop_assert_eq!(
            summary.over_budget_lines,
            lines.iter().filter(|l| l.spent_amount > l.planned_amount).count()
        );
    }
}
