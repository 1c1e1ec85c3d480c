//! Partial-settlement accumulator.
//!
//! Applies a received (income) or paid (expense) amount to a record and
//! derives the resulting state. Pure: the caller owns persistence and
//! locking.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::FinanceError;
use super::types::{FinancialRecord, PaymentMethod, SettlementState};
use crate::money::fits_amount;

/// A single settlement to apply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettlementRequest {
    /// Amount received or paid.
    pub amount: Decimal,
    /// Date the money moved.
    pub date: NaiveDate,
    /// Channel used, if known.
    #[serde(default)]
    pub method: Option<PaymentMethod>,
}

/// Result of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// The record after the settlement.
    pub record: FinancialRecord,
    /// Amount actually added to `accumulated_amount`.
    pub applied: Decimal,
    /// State before the settlement.
    pub previous_state: SettlementState,
}

impl SettlementOutcome {
    /// Returns true when this settlement closed the record.
    #[must_use]
    pub fn became_settled(&self) -> bool {
        self.previous_state != SettlementState::Settled
            && self.record.state == SettlementState::Settled
    }
}

/// Applies a settlement of `request.amount` to `record`.
///
/// The method recorded is the supplied one, or the record's existing method
/// when none is supplied. Settling fully requires one of the two.
///
/// # Errors
///
/// - `RecordCancelled` if the record is cancelled
/// - `InvalidAmount` if the amount is not positive or has sub-cent precision
/// - `Overpayment` if the amount exceeds the outstanding balance
/// - `MissingPaymentMethod` if the record would become settled without a method
pub fn apply_settlement(
    record: &FinancialRecord,
    request: &SettlementRequest,
) -> Result<SettlementOutcome, FinanceError> {
    if record.state == SettlementState::Cancelled {
        return Err(FinanceError::RecordCancelled);
    }
    if request.amount <= Decimal::ZERO || !fits_amount(request.amount) {
        return Err(FinanceError::InvalidAmount);
    }

    let max_allowed = record.pending_amount().max(Decimal::ZERO);
    if request.amount > max_allowed {
        return Err(FinanceError::Overpayment { max_allowed });
    }

    let accumulated = record.accumulated_amount + request.amount;
    let state = SettlementState::derive(record.state, accumulated, record.total_amount);
    let payment_method = request.method.or(record.payment_method);

    if state == SettlementState::Settled && payment_method.is_none() {
        return Err(FinanceError::MissingPaymentMethod);
    }

    let updated = FinancialRecord {
        accumulated_amount: accumulated,
        settlement_date: Some(request.date),
        state,
        payment_method,
        ..record.clone()
    };

    Ok(SettlementOutcome {
        record: updated,
        applied: request.amount,
        previous_state: record.state,
    })
}

/// Settles the whole outstanding balance.
///
/// # Errors
///
/// Same as [`apply_settlement`]. A record with nothing outstanding fails
/// with `InvalidAmount`.
pub fn mark_fully_settled(
    record: &FinancialRecord,
    date: NaiveDate,
    method: Option<PaymentMethod>,
) -> Result<SettlementOutcome, FinanceError> {
    let request = SettlementRequest {
        amount: record.pending_amount(),
        date,
        method,
    };
    apply_settlement(record, &request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn income(total: Decimal, accumulated: Decimal, state: SettlementState) -> FinancialRecord {
        FinancialRecord {
            accumulated_amount: accumulated,
            state,
            ..FinancialRecord::new_income(total, Some(today()))
        }
    }

    fn request(amount: Decimal, method: Option<PaymentMethod>) -> SettlementRequest {
        SettlementRequest {
            amount,
            date: today(),
            method,
        }
    }

    #[test]
    fn test_first_partial_receipt() {
        let record = income(dec!(1000), dec!(0), SettlementState::Pending);
        let outcome = apply_settlement(&record, &request(dec!(400), None)).unwrap();

        assert_eq!(outcome.record.accumulated_amount, dec!(400));
        assert_eq!(outcome.record.state, SettlementState::Partial);
        assert_eq!(outcome.record.settlement_date, Some(today()));
        assert_eq!(outcome.applied, dec!(400));
        assert_eq!(outcome.previous_state, SettlementState::Pending);
        assert!(!outcome.became_settled());
    }

    #[test]
    fn test_completing_receipt_with_method() {
        let record = income(dec!(1000), dec!(400), SettlementState::Partial);
        let outcome =
            apply_settlement(&record, &request(dec!(600), Some(PaymentMethod::Transfer))).unwrap();

        assert_eq!(outcome.record.accumulated_amount, dec!(1000));
        assert_eq!(outcome.record.state, SettlementState::Settled);
        assert_eq!(outcome.record.payment_method, Some(PaymentMethod::Transfer));
        assert!(outcome.became_settled());
    }

    #[test]
    fn test_overpayment_reports_balance() {
        let record = income(dec!(1000), dec!(400), SettlementState::Partial);
        let err = apply_settlement(&record, &request(dec!(700), None)).unwrap_err();
        assert_eq!(
            err,
            FinanceError::Overpayment {
                max_allowed: dec!(600)
            }
        );
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let record = income(dec!(1000), dec!(0), SettlementState::Pending);
        assert_eq!(
            apply_settlement(&record, &request(dec!(0), None)),
            Err(FinanceError::InvalidAmount)
        );
        assert_eq!(
            apply_settlement(&record, &request(dec!(-5), None)),
            Err(FinanceError::InvalidAmount)
        );
    }

    #[test]
    fn test_sub_cent_amount_rejected() {
        let record = income(dec!(1000), dec!(999.99), SettlementState::Partial);
        assert_eq!(
            apply_settlement(&record, &request(dec!(0.005), Some(PaymentMethod::Cash))),
            Err(FinanceError::InvalidAmount)
        );
    }

    #[test]
    fn test_trailing_zeros_are_accepted() {
        let record = income(dec!(1000), dec!(0), SettlementState::Pending);
        let outcome = apply_settlement(&record, &request(dec!(400.000), None)).unwrap();
        assert_eq!(outcome.record.accumulated_amount, dec!(400));
    }

    #[test]
    fn test_cancelled_record_rejected_before_amount_checks() {
        let record = income(dec!(1000), dec!(0), SettlementState::Cancelled);
        assert_eq!(
            apply_settlement(&record, &request(dec!(0), None)),
            Err(FinanceError::RecordCancelled)
        );
    }

    #[test]
    fn test_settling_without_any_method_fails() {
        let record = income(dec!(1000), dec!(400), SettlementState::Partial);
        assert_eq!(
            apply_settlement(&record, &request(dec!(600), None)),
            Err(FinanceError::MissingPaymentMethod)
        );
    }

    #[test]
    fn test_existing_method_satisfies_settlement() {
        let mut record = income(dec!(1000), dec!(400), SettlementState::Partial);
        record.payment_method = Some(PaymentMethod::Check);
        let outcome = apply_settlement(&record, &request(dec!(600), None)).unwrap();
        assert_eq!(outcome.record.payment_method, Some(PaymentMethod::Check));
        assert_eq!(outcome.record.state, SettlementState::Settled);
    }

    #[test]
    fn test_settled_record_has_nothing_to_apply() {
        let record = income(dec!(1000), dec!(1000), SettlementState::Settled);
        assert_eq!(
            apply_settlement(&record, &request(dec!(0.01), Some(PaymentMethod::Cash))),
            Err(FinanceError::Overpayment {
                max_allowed: dec!(0)
            })
        );
    }

    #[test]
    fn test_mark_fully_settled() {
        let record = income(dec!(1000), dec!(250.50), SettlementState::Partial);
        let outcome =
            mark_fully_settled(&record, today(), Some(PaymentMethod::Transfer)).unwrap();
        assert_eq!(outcome.applied, dec!(749.50));
        assert_eq!(outcome.record.state, SettlementState::Settled);
        assert_eq!(outcome.record.pending_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_mark_fully_settled_on_settled_record() {
        let record = income(dec!(1000), dec!(1000), SettlementState::Settled);
        assert_eq!(
            mark_fully_settled(&record, today(), Some(PaymentMethod::Transfer)),
            Err(FinanceError::InvalidAmount)
        );
    }

    #[test]
    fn test_input_record_is_untouched() {
        let record = income(dec!(1000), dec!(0), SettlementState::Pending);
        let before = record.clone();
        let _ = apply_settlement(&record, &request(dec!(100), None)).unwrap();
        assert_eq!(record, before);
    }
}
