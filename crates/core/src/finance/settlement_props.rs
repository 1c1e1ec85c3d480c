//! Property-based tests for the settlement accumulator.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::FinanceError;
use super::rollup::plan_rollup;
use super::settlement::{SettlementRequest, apply_settlement, mark_fully_settled};
use super::types::{FinancialRecord, PaymentMethod, SettlementState};
use super::validation::validate_state;
use crate::budget::{BudgetCategory, BudgetLine};

/// Strategy for positive amounts from 0.01 to 1,000,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_method() -> impl Strategy<Value = PaymentMethod> {
    prop::sample::select(PaymentMethod::ALL.to_vec())
}

fn settle_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn request(amount: Decimal, method: Option<PaymentMethod>) -> SettlementRequest {
    SettlementRequest {
        amount,
        date: settle_date(),
        method,
    }
}

/// A total together with a sequence of deltas whose sum stays below it.
fn arb_partial_sequence() -> impl Strategy<Value = (Decimal, Vec<Decimal>)> {
    prop::collection::vec(1i64..1_000_000i64, 1..8).prop_flat_map(|cents| {
        let sum: i64 = cents.iter().sum();
        let deltas: Vec<Decimal> = cents.iter().map(|c| Decimal::new(*c, 2)).collect();
        (sum + 1..sum + 1_000_000).prop_map(move |total| (Decimal::new(total, 2), deltas.clone()))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Sequential settlements accumulate exactly their sum, and every
    /// intermediate record passes the state check.
    #[test]
    fn prop_sequential_settlements_are_additive(
        (total, deltas) in arb_partial_sequence(),
    ) {
        let mut record = FinancialRecord::new_income(total, None);
        let mut expected = Decimal::ZERO;

        for delta in &deltas {
            let outcome = apply_settlement(&record, &request(*delta, None)).unwrap();
            expected += *delta;
            prop_assert_eq!(outcome.applied, *delta);
            prop_assert_eq!(outcome.record.accumulated_amount, expected);
            prop_assert_eq!(outcome.record.state, SettlementState::Partial);
            prop_assert!(validate_state(
                outcome.record.state,
                outcome.record.accumulated_amount,
                outcome.record.total_amount,
            ).is_ok());
            record = outcome.record;
        }
    }

    /// Settling exactly the outstanding balance always closes the record.
    #[test]
    fn prop_exact_balance_settles(
        total in arb_amount(),
        paid_cents in 0i64..100,
        method in arb_method(),
    ) {
        // Paid share in percent of total, rounded to cents.
        let accumulated = (total * Decimal::new(paid_cents, 2)).round_dp(2).min(total);
        let record = FinancialRecord {
            accumulated_amount: accumulated,
            state: SettlementState::derive(SettlementState::Pending, accumulated, total),
            ..FinancialRecord::new_income(total, None)
        };
        prop_assume!(record.pending_amount() > Decimal::ZERO);

        let outcome = apply_settlement(&record, &request(record.pending_amount(), Some(method))).unwrap();
        prop_assert_eq!(outcome.record.state, SettlementState::Settled);
        prop_assert_eq!(outcome.record.accumulated_amount, total);
        prop_assert_eq!(outcome.record.payment_method, Some(method));

        let full = mark_fully_settled(&record, settle_date(), Some(method)).unwrap();
        prop_assert_eq!(full, outcome);
    }

    /// One cent over the balance always fails and reports the balance.
    #[test]
    fn prop_one_cent_over_fails(
        total in arb_amount(),
        paid_cents in 0i64..100,
    ) {
        let accumulated = (total * Decimal::new(paid_cents, 2)).round_dp(2).min(total);
        let record = FinancialRecord {
            accumulated_amount: accumulated,
            state: SettlementState::derive(SettlementState::Pending, accumulated, total),
            ..FinancialRecord::new_expense(total, None, None)
        };
        let remaining = record.pending_amount();

        let result = apply_settlement(&record, &request(remaining + dec!(0.01), Some(PaymentMethod::Cash)));
        prop_assert_eq!(result, Err(FinanceError::Overpayment { max_allowed: remaining }));
    }

    /// Amounts finer than a cent are rejected even when they fit the balance.
    #[test]
    fn prop_sub_cent_amount_is_invalid(
        total in arb_amount(),
        mills in 1i64..10,
    ) {
        let record = FinancialRecord::new_income(total + dec!(1), None);
        let amount = total + Decimal::new(mills, 3);
        prop_assert_eq!(
            apply_settlement(&record, &request(amount, None)),
            Err(FinanceError::InvalidAmount)
        );
    }

    /// A failed settlement never touches the record it was given.
    #[test]
    fn prop_failed_settlement_has_no_effect(
        total in arb_amount(),
        extra in arb_amount(),
    ) {
        let record = FinancialRecord::new_income(total, None);
        let before = record.clone();
        prop_assert!(apply_settlement(&record, &request(total + extra, None)).is_err());
        prop_assert_eq!(record, before);
    }
}

#[test]
fn scenario_first_receipt_is_partial() {
    let record = FinancialRecord::new_income(dec!(1000), None);
    let outcome = apply_settlement(&record, &request(dec!(400), None)).unwrap();
    assert_eq!(outcome.record.accumulated_amount, dec!(400));
    assert_eq!(outcome.record.state, SettlementState::Partial);
}

#[test]
fn scenario_balance_by_transfer_settles() {
    let record = FinancialRecord {
        accumulated_amount: dec!(400),
        state: SettlementState::Partial,
        ..FinancialRecord::new_income(dec!(1000), None)
    };
    let outcome = apply_settlement(&record, &request(dec!(600), Some(PaymentMethod::Transfer))).unwrap();
    assert_eq!(outcome.record.accumulated_amount, dec!(1000));
    assert_eq!(outcome.record.state, SettlementState::Settled);
    assert_eq!(outcome.record.payment_method, Some(PaymentMethod::Transfer));
}

#[test]
fn scenario_overpayment_is_rejected() {
    let record = FinancialRecord {
        accumulated_amount: dec!(400),
        state: SettlementState::Partial,
        ..FinancialRecord::new_income(dec!(1000), None)
    };
    assert_eq!(
        apply_settlement(&record, &request(dec!(700), None)),
        Err(FinanceError::Overpayment {
            max_allowed: dec!(600)
        })
    );
}

#[test]
fn scenario_linked_expense_charges_budget_line() {
    let mut line = BudgetLine::new(
        BudgetCategory::Materials,
        dec!(10000),
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
    );
    line.spent_amount = dec!(200);

    let expense = FinancialRecord::new_expense(dec!(500), None, Some(line.id));
    let outcome = apply_settlement(&expense, &request(dec!(500), Some(PaymentMethod::Transfer))).unwrap();
    let rollup = plan_rollup(&outcome).unwrap();
    assert_eq!(rollup.budget_line_id, line.id);

    line.record_spend(rollup.increment);
    assert_eq!(line.spent_amount, dec!(700));
}
