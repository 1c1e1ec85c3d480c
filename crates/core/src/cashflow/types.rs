//! Cash-flow projection types.

use obra_shared::types::CashFlowProjectionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calendar month a projection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CashFlowPeriod {
    /// Year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
}

impl std::fmt::Display for CashFlowPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Projected and actual figures for one month of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    /// Projection ID.
    pub id: CashFlowProjectionId,
    /// Month covered.
    pub period: CashFlowPeriod,
    /// Income expected in the month.
    pub projected_income: Decimal,
    /// Expense expected in the month.
    pub projected_expense: Decimal,
    /// Income actually received.
    pub actual_income: Decimal,
    /// Expense actually paid.
    pub actual_expense: Decimal,
    /// Balance at the start of the month.
    pub opening_balance: Decimal,
    /// Balance at the end of the month.
    pub closing_balance: Decimal,
    /// Notes.
    pub notes: String,
}

impl CashFlowProjection {
    /// `projected_income - projected_expense`.
    #[must_use]
    pub fn projected_net(&self) -> Decimal {
        self.projected_income - self.projected_expense
    }

    /// `actual_income - actual_expense`.
    #[must_use]
    pub fn actual_net(&self) -> Decimal {
        self.actual_income - self.actual_expense
    }

    /// `actual_net - projected_net`.
    #[must_use]
    pub fn variance(&self) -> Decimal {
        self.actual_net() - self.projected_net()
    }
}

/// Input for upserting a month.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CashFlowInput {
    /// Income expected in the month.
    pub projected_income: Decimal,
    /// Expense expected in the month.
    pub projected_expense: Decimal,
    /// Income actually received.
    pub actual_income: Decimal,
    /// Expense actually paid.
    pub actual_expense: Decimal,
    /// Balance at the start of the month.
    pub opening_balance: Decimal,
    /// Balance at the end of the month. Defaults to opening plus actual net.
    pub closing_balance: Option<Decimal>,
    /// Notes.
    pub notes: String,
}

impl CashFlowInput {
    /// The closing balance to store.
    #[must_use]
    pub fn resolved_closing_balance(&self) -> Decimal {
        self.closing_balance
            .unwrap_or_else(|| self.opening_balance + self.actual_income - self.actual_expense)
    }
}

/// Totals over a range of months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowSummary {
    /// Number of months included.
    pub months: usize,
    /// Sum of projected income.
    pub projected_income: Decimal,
    /// Sum of projected expense.
    pub projected_expense: Decimal,
    /// Sum of actual income.
    pub actual_income: Decimal,
    /// Sum of actual expense.
    pub actual_expense: Decimal,
    /// Projected net over the range.
    pub projected_net: Decimal,
    /// Actual net over the range.
    pub actual_net: Decimal,
    /// `actual_net - projected_net`.
    pub variance: Decimal,
    /// Closing balance of the latest month, if any.
    pub closing_balance: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_nets_and_variance() {
        let p = CashFlowProjection {
            id: CashFlowProjectionId::new(),
            period: CashFlowPeriod { year: 2025, month: 4 },
            projected_income: dec!(50000),
            projected_expense: dec!(42000),
            actual_income: dec!(45000),
            actual_expense: dec!(43500),
            opening_balance: dec!(12000),
            closing_balance: dec!(13500),
            notes: String::new(),
        };
        assert_eq!(p.projected_net(), dec!(8000));
        assert_eq!(p.actual_net(), dec!(1500));
        assert_eq!(p.variance(), dec!(-6500));
    }

    #[test]
    fn test_closing_balance_defaults_to_opening_plus_net() {
        let input = CashFlowInput {
            actual_income: dec!(1000),
            actual_expense: dec!(300),
            opening_balance: dec!(200),
            ..CashFlowInput::default()
        };
        assert_eq!(input.resolved_closing_balance(), dec!(900));

        let explicit = CashFlowInput {
            closing_balance: Some(dec!(5)),
            ..input
        };
        assert_eq!(explicit.resolved_closing_balance(), dec!(5));
    }

    #[test]
    fn test_period_ordering_and_display() {
        let a = CashFlowPeriod { year: 2024, month: 12 };
        let b = CashFlowPeriod { year: 2025, month: 1 };
        assert!(a < b);
        assert_eq!(b.to_string(), "01/2025");
    }
}
