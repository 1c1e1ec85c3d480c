//! Cash-flow validation and aggregation.

use rust_decimal::Decimal;

use super::error::CashFlowError;
use super::types::{CashFlowInput, CashFlowPeriod, CashFlowProjection, CashFlowSummary};
use crate::money::fits_amount;

/// Earliest year accepted for a projection.
pub const MIN_YEAR: i32 = 2000;
/// Latest year accepted for a projection.
pub const MAX_YEAR: i32 = 2100;

/// Cash-flow service for business logic.
pub struct CashFlowService;

impl CashFlowService {
    /// Validates a projection period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth` or `InvalidYear`.
    pub fn validate_period(year: i32, month: u32) -> Result<CashFlowPeriod, CashFlowError> {
        if !(1..=12).contains(&month) {
            return Err(CashFlowError::InvalidMonth(month));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(CashFlowError::InvalidYear(year));
        }
        Ok(CashFlowPeriod { year, month })
    }

    /// Validates the figures of a projection. Balances may be negative.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` for the first negative income/expense field,
    /// `AmountPrecision` for the first figure that does not fit in whole cents.
    pub fn validate_input(input: &CashFlowInput) -> Result<(), CashFlowError> {
        let fields = [
            ("projected_income", input.projected_income),
            ("projected_expense", input.projected_expense),
            ("actual_income", input.actual_income),
            ("actual_expense", input.actual_expense),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(CashFlowError::NegativeAmount { field: *field });
        }

        let balances = [
            ("opening_balance", Some(input.opening_balance)),
            ("closing_balance", input.closing_balance),
        ];
        let all = fields
            .iter()
            .map(|(f, v)| (*f, Some(*v)))
            .chain(balances);
        for (field, value) in all {
            if value.is_some_and(|v| !fits_amount(v)) {
                return Err(CashFlowError::AmountPrecision { field });
            }
        }
        Ok(())
    }

    /// Aggregates projections. The closing balance is taken from the latest
    /// period.
    #[must_use]
    pub fn summarize(projections: &[CashFlowProjection]) -> CashFlowSummary {
        let projected_income: Decimal = projections.iter().map(|p| p.projected_income).sum();
        let projected_expense: Decimal = projections.iter().map(|p| p.projected_expense).sum();
        let actual_income: Decimal = projections.iter().map(|p| p.actual_income).sum();
        let actual_expense: Decimal = projections.iter().map(|p| p.actual_expense).sum();
        let projected_net = projected_income - projected_expense;
        let actual_net = actual_income - actual_expense;

        CashFlowSummary {
            months: projections.len(),
            projected_income,
            projected_expense,
            actual_income,
            actual_expense,
            projected_net,
            actual_net,
            variance: actual_net - projected_net,
            closing_balance: projections
                .iter()
                .max_by_key(|p| p.period)
                .map(|p| p.closing_balance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obra_shared::types::CashFlowProjectionId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn month(m: u32, projected: Decimal, actual: Decimal, closing: Decimal) -> CashFlowProjection {
        CashFlowProjection {
            id: CashFlowProjectionId::new(),
            period: CashFlowPeriod { year: 2025, month: m },
            projected_income: projected,
            projected_expense: Decimal::ZERO,
            actual_income: actual,
            actual_expense: Decimal::ZERO,
            opening_balance: Decimal::ZERO,
            closing_balance: closing,
            notes: String::new(),
        }
    }

    #[test]
    fn test_validate_period() {
        assert_eq!(
            CashFlowService::validate_period(2025, 12),
            Ok(CashFlowPeriod { year: 2025, month: 12 })
        );
        assert_eq!(
            CashFlowService::validate_period(2025, 0),
            Err(CashFlowError::InvalidMonth(0))
        );
        assert_eq!(
            CashFlowService::validate_period(2025, 13),
            Err(CashFlowError::InvalidMonth(13))
        );
        assert_eq!(
            CashFlowService::validate_period(1999, 1),
            Err(CashFlowError::InvalidYear(1999))
        );
    }

    #[test]
    fn test_validate_input_rejects_negative_figures() {
        let input = CashFlowInput {
            actual_expense: dec!(-1),
            opening_balance: dec!(-5000),
            ..CashFlowInput::default()
        };
        assert_eq!(
            CashFlowService::validate_input(&input),
            Err(CashFlowError::NegativeAmount {
                field: "actual_expense"
            })
        );

        let overdraft = CashFlowInput {
            opening_balance: dec!(-5000),
            ..CashFlowInput::default()
        };
        assert!(CashFlowService::validate_input(&overdraft).is_ok());
    }

    #[test]
    fn test_validate_input_rejects_sub_cent_figures() {
        let input = CashFlowInput {
            projected_income: dec!(1500.125),
            ..CashFlowInput::default()
        };
        assert_eq!(
            CashFlowService::validate_input(&input),
            Err(CashFlowError::AmountPrecision {
                field: "projected_income"
            })
        );

        let closing = CashFlowInput {
            closing_balance: Some(dec!(-0.001)),
            ..CashFlowInput::default()
        };
        assert_eq!(
            CashFlowService::validate_input(&closing),
            Err(CashFlowError::AmountPrecision {
                field: "closing_balance"
            })
        );
    }

    #[test]
    fn test_summarize_takes_latest_closing_balance() {
        let months = vec![
            month(3, dec!(100), dec!(90), dec!(30)),
            month(1, dec!(100), dec!(110), dec!(10)),
        ];
        let summary = CashFlowService::summarize(&months);
        assert_eq!(summary.months, 2);
        assert_eq!(summary.projected_net, dec!(200));
        assert_eq!(summary.actual_net, dec!(200));
        assert_eq!(summary.variance, dec!(0));
        assert_eq!(summary.closing_balance, Some(dec!(30)));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = CashFlowService::summarize(&[]);
        assert_eq!(summary.months, 0);
        assert_eq!(summary.closing_balance, None);
    }

    proptest! {
        #[test]
        fn prop_summary_variance_is_sum_of_monthly_variances(
            figures in prop::collection::vec((0i64..1_000_000, 0i64..1_000_000), 1..12),
        ) {
            let months: Vec<CashFlowProjection> = figures
                .iter()
                .zip(1u32..)
                .map(|((p, a), m)| month(m, Decimal::new(*p, 2), Decimal::new(*a, 2), Decimal::ZERO))
                .collect();
            let summary = CashFlowService::summarize(&months);
            let expected: Decimal = months.iter().map(CashFlowProjection::variance).sum();
            prop_assert_eq!(summary.variance, expected);
        }
    }
}
