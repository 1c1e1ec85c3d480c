//! Property-based tests for the state consistency check.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::FinanceError;
use super::types::SettlementState;
use super::validation::{
    IncomeForm, RecordForm, StateViolation, state_violations, validate_income_form, validate_state,
};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_state() -> impl Strategy<Value = SettlementState> {
    prop::sample::select(SettlementState::ALL.to_vec())
}

/// Amounts with a non-zero third decimal, from 0.001 to 1,000,000.000.
fn arb_sub_cent_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64)
        .prop_filter("needs a sub-cent digit", |mills| mills % 10 != 0)
        .prop_map(|mills| Decimal::new(mills, 3))
}

fn pending_form(total: Decimal) -> IncomeForm {
    IncomeForm {
        record: RecordForm {
            concept: "Anticipo".to_string(),
            total_amount: total,
            accumulated_amount: Decimal::ZERO,
            state: SettlementState::Pending,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 31),
            settlement_date: None,
            payment_method: None,
        },
        tied_to_progress: false,
        progress_percent: None,
    }
}

/// The three mismatch rules, written independently of the implementation.
fn mismatches(state: SettlementState, accumulated: Decimal, total: Decimal) -> bool {
    (state == SettlementState::Settled && accumulated < total)
        || (state == SettlementState::Partial && (accumulated.is_zero() || accumulated >= total))
        || (state == SettlementState::Pending && accumulated > Decimal::ZERO)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Validation fails exactly when one of the mismatch rules holds.
    #[test]
    fn prop_mismatch_iff_rule_holds(
        state in arb_state(),
        accumulated in arb_amount(),
        total in arb_amount(),
    ) {
        let result = validate_state(state, accumulated, total);
        prop_assert_eq!(result.is_err(), mismatches(state, accumulated, total));
    }

    /// One reason per violated rule.
    #[test]
    fn prop_reasons_match_violations(
        state in arb_state(),
        accumulated in arb_amount(),
        total in arb_amount(),
    ) {
        let violations = state_violations(state, accumulated, total);
        match validate_state(state, accumulated, total) {
            Ok(()) => prop_assert!(violations.is_empty()),
            Err(FinanceError::StateMismatch { reasons }) => {
                prop_assert_eq!(reasons.len(), violations.len());
                let expected: Vec<String> = violations.iter().map(StateViolation::to_string).collect();
                prop_assert_eq!(reasons, expected);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// The state derived from the amounts is always consistent with them.
    #[test]
    fn prop_derived_state_is_consistent(
        accumulated in arb_amount(),
        extra in arb_amount(),
    ) {
        let total = accumulated + extra;
        let state = SettlementState::derive(SettlementState::Pending, accumulated, total);
        prop_assert!(validate_state(state, accumulated, total).is_ok());
    }

    /// Cancelled records are consistent whatever their amounts.
    #[test]
    fn prop_cancelled_never_mismatches(
        accumulated in arb_amount(),
        total in arb_amount(),
    ) {
        prop_assert!(validate_state(SettlementState::Cancelled, accumulated, total).is_ok());
    }

    /// A total with sub-cent precision is always a `total_amount` field error.
    #[test]
    fn prop_sub_cent_total_is_rejected(total in arb_sub_cent_amount()) {
        match validate_income_form(&pending_form(total)) {
            Err(FinanceError::Validation { errors }) => {
                prop_assert!(errors.iter().any(|e| e.field == "total_amount"));
            }
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }

    /// Whole-cent totals pass the field checks.
    #[test]
    fn prop_cent_total_is_accepted(total in arb_amount()) {
        prop_assume!(total > Decimal::ZERO);
        prop_assert!(validate_income_form(&pending_form(total)).is_ok());
    }
}
