//! State consistency and form validation for financial records.
//!
//! [`validate_state`] is the invariant check for a caller-supplied
//! `(state, accumulated, total)` triple. The form validators run the field
//! checks first and only then the state check, so a client sees either the
//! field errors or the state mismatch, never a mix.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::{FieldError, FinanceError};
use super::types::{PaymentMethod, SettlementState};
use crate::money::{amount_limit_message, fits_amount};

/// Maximum length of a record concept.
pub const CONCEPT_MAX_LEN: usize = 200;

/// A violated state/amount rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateViolation {
    /// `settled` while money is still outstanding.
    SettledWithBalance,
    /// `partial` with nothing accumulated.
    PartialWithoutAmount,
    /// `partial` although the total is covered.
    PartialFullyCovered,
    /// `pending` although something was accumulated.
    PendingWithAmount,
}

impl fmt::Display for StateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::SettledWithBalance => {
                "state cannot be settled while the accumulated amount is below the total; use partial"
            }
            Self::PartialWithoutAmount => {
                "state partial requires an accumulated amount greater than 0"
            }
            Self::PartialFullyCovered => {
                "state partial requires an accumulated amount below the total; use settled"
            }
            Self::PendingWithAmount => {
                "state cannot be pending once an amount has been accumulated; use partial"
            }
        };
        f.write_str(msg)
    }
}

/// Lists every rule the triple violates. Empty means consistent.
#[must_use]
pub fn state_violations(
    state: SettlementState,
    accumulated: Decimal,
    total: Decimal,
) -> Vec<StateViolation> {
    let mut violations = Vec::new();
    match state {
        SettlementState::Settled if accumulated < total => {
            violations.push(StateViolation::SettledWithBalance);
        }
        SettlementState::Partial => {
            if accumulated.is_zero() {
                violations.push(StateViolation::PartialWithoutAmount);
            }
            if accumulated >= total {
                violations.push(StateViolation::PartialFullyCovered);
            }
        }
        SettlementState::Pending if accumulated > Decimal::ZERO => {
            violations.push(StateViolation::PendingWithAmount);
        }
        _ => {}
    }
    violations
}

/// Checks that the state agrees with the amounts.
///
/// # Errors
///
/// Returns `FinanceError::StateMismatch` with one reason per violated rule.
pub fn validate_state(
    state: SettlementState,
    accumulated: Decimal,
    total: Decimal,
) -> Result<(), FinanceError> {
    let violations = state_violations(state, accumulated, total);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(FinanceError::StateMismatch {
            reasons: violations.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Fields shared by the income and expense edit forms.
#[derive(Debug, Clone)]
pub struct RecordForm {
    /// Short description.
    pub concept: String,
    /// Contractual/invoiced amount.
    pub total_amount: Decimal,
    /// Received/paid to date.
    pub accumulated_amount: Decimal,
    /// Claimed state.
    pub state: SettlementState,
    /// Expected/due date.
    pub due_date: Option<NaiveDate>,
    /// Date of the latest settlement.
    pub settlement_date: Option<NaiveDate>,
    /// Channel of the latest settlement.
    pub payment_method: Option<PaymentMethod>,
}

/// Income edit form.
#[derive(Debug, Clone)]
pub struct IncomeForm {
    /// Common fields.
    pub record: RecordForm,
    /// Whether the income is tied to certified construction progress.
    pub tied_to_progress: bool,
    /// Progress percentage the income corresponds to.
    pub progress_percent: Option<Decimal>,
}

/// Expense edit form.
#[derive(Debug, Clone)]
pub struct ExpenseForm {
    /// Common fields.
    pub record: RecordForm,
    /// Supplier or beneficiary.
    pub supplier: String,
    /// VAT withheld.
    pub vat_withholding: Decimal,
    /// Income tax withheld.
    pub income_tax_withholding: Decimal,
}

/// Pushes a field error when `amount` does not fit an amount column.
fn check_fits(field: &str, amount: Decimal, errors: &mut Vec<FieldError>) {
    if !fits_amount(amount) {
        errors.push(FieldError::new(field, amount_limit_message()));
    }
}

fn check_record(form: &RecordForm, errors: &mut Vec<FieldError>) {
    let concept = form.concept.trim();
    if concept.is_empty() {
        errors.push(FieldError::new("concept", "Concept is required"));
    } else if concept.chars().count() > CONCEPT_MAX_LEN {
        errors.push(FieldError::new(
            "concept",
            format!("Concept cannot exceed {CONCEPT_MAX_LEN} characters"),
        ));
    }

    if form.total_amount <= Decimal::ZERO {
        errors.push(FieldError::new(
            "total_amount",
            "Total amount must be greater than 0",
        ));
    } else {
        check_fits("total_amount", form.total_amount, errors);
    }

    if form.accumulated_amount < Decimal::ZERO {
        errors.push(FieldError::new(
            "accumulated_amount",
            "Accumulated amount cannot be negative",
        ));
    } else if form.total_amount > Decimal::ZERO && form.accumulated_amount > form.total_amount {
        errors.push(FieldError::new(
            "accumulated_amount",
            format!(
                "Accumulated amount ({}) cannot exceed the total amount ({})",
                form.accumulated_amount, form.total_amount
            ),
        ));
    } else {
        check_fits("accumulated_amount", form.accumulated_amount, errors);
    }

    if form.due_date.is_none() {
        errors.push(FieldError::new("due_date", "Due date is required"));
    }

    if matches!(
        form.state,
        SettlementState::Partial | SettlementState::Settled
    ) && form.settlement_date.is_none()
    {
        errors.push(FieldError::new(
            "settlement_date",
            "Settlement date is required when the state is partial or settled",
        ));
    }

    if form.state == SettlementState::Settled && form.payment_method.is_none() {
        errors.push(FieldError::new(
            "payment_method",
            "Payment method is required when the state is settled",
        ));
    }
}

fn finish(form: &RecordForm, errors: Vec<FieldError>) -> Result<(), FinanceError> {
    if !errors.is_empty() {
        return Err(FinanceError::Validation { errors });
    }
    validate_state(form.state, form.accumulated_amount, form.total_amount)
}

/// Validates an income edit form.
///
/// # Errors
///
/// Returns `FinanceError::Validation` with every field error, or
/// `FinanceError::StateMismatch` when the fields are valid but disagree.
pub fn validate_income_form(form: &IncomeForm) -> Result<(), FinanceError> {
    let mut errors = Vec::new();
    check_record(&form.record, &mut errors);

    match form.progress_percent {
        None if form.tied_to_progress => errors.push(FieldError::new(
            "progress_percent",
            "Progress percentage is required when the income is tied to progress",
        )),
        Some(p) if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED => errors.push(
            FieldError::new("progress_percent", "Percentage must be between 0 and 100"),
        ),
        Some(p) if p.normalize().scale() > 2 => errors.push(FieldError::new(
            "progress_percent",
            "Percentage must have at most 2 decimal places",
        )),
        _ => {}
    }

    finish(&form.record, errors)
}

/// Validates an expense edit form.
///
/// # Errors
///
/// Returns `FinanceError::Validation` with every field error, or
/// `FinanceError::StateMismatch` when the fields are valid but disagree.
pub fn validate_expense_form(form: &ExpenseForm) -> Result<(), FinanceError> {
    let mut errors = Vec::new();
    check_record(&form.record, &mut errors);

    if form.supplier.trim().is_empty() {
        errors.push(FieldError::new("supplier", "Supplier is required"));
    }
    for (field, amount) in [
        ("vat_withholding", form.vat_withholding),
        ("income_tax_withholding", form.income_tax_withholding),
    ] {
        if amount < Decimal::ZERO {
            errors.push(FieldError::new(field, "Withholding cannot be negative"));
        } else {
            check_fits(field, amount, errors);
        }
    }

    finish(&form.record, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record_form(state: SettlementState, accumulated: Decimal) -> RecordForm {
        RecordForm {
            concept: "Pago de avance - corte mayo".to_string(),
            total_amount: dec!(1000),
            accumulated_amount: accumulated,
            state,
            due_date: Some(date(2025, 5, 31)),
            settlement_date: Some(date(2025, 6, 2)),
            payment_method: Some(PaymentMethod::Transfer),
        }
    }

    fn field_names(err: FinanceError) -> Vec<String> {
        match err {
            FinanceError::Validation { errors } => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_settled_with_balance_is_mismatch() {
        let result = validate_state(SettlementState::Settled, dec!(999.99), dec!(1000));
        let Err(FinanceError::StateMismatch { reasons }) = result else {
            panic!("expected mismatch");
        };
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("settled"));
    }

    #[test]
    fn test_partial_rules() {
        assert_eq!(
            state_violations(SettlementState::Partial, dec!(0), dec!(1000)),
            vec![StateViolation::PartialWithoutAmount]
        );
        assert_eq!(
            state_violations(SettlementState::Partial, dec!(1000), dec!(1000)),
            vec![StateViolation::PartialFullyCovered]
        );
        assert!(state_violations(SettlementState::Partial, dec!(1), dec!(1000)).is_empty());
    }

    #[test]
    fn test_partial_on_zero_total_reports_both_rules() {
        assert_eq!(
            state_violations(SettlementState::Partial, dec!(0), dec!(0)),
            vec![
                StateViolation::PartialWithoutAmount,
                StateViolation::PartialFullyCovered
            ]
        );
    }

    #[test]
    fn test_pending_with_amount_is_mismatch() {
        assert!(validate_state(SettlementState::Pending, dec!(0.01), dec!(1000)).is_err());
        assert!(validate_state(SettlementState::Pending, dec!(0), dec!(1000)).is_ok());
    }

    #[test]
    fn test_cancelled_is_always_consistent() {
        assert!(validate_state(SettlementState::Cancelled, dec!(0), dec!(1000)).is_ok());
        assert!(validate_state(SettlementState::Cancelled, dec!(500), dec!(1000)).is_ok());
    }

    #[test]
    fn test_valid_income_form() {
        let form = IncomeForm {
            record: record_form(SettlementState::Partial, dec!(400)),
            tied_to_progress: true,
            progress_percent: Some(dec!(35)),
        };
        assert!(validate_income_form(&form).is_ok());
    }

    #[test]
    fn test_income_form_collects_all_field_errors() {
        let mut record = record_form(SettlementState::Settled, dec!(0));
        record.concept = "  ".to_string();
        record.total_amount = dec!(0);
        record.settlement_date = None;
        record.payment_method = None;
        let form = IncomeForm {
            record,
            tied_to_progress: true,
            progress_percent: None,
        };

        let fields = field_names(validate_income_form(&form).unwrap_err());
        assert_eq!(
            fields,
            vec![
                "concept",
                "total_amount",
                "settlement_date",
                "payment_method",
                "progress_percent"
            ]
        );
    }

    #[test]
    fn test_accumulated_above_total_is_field_error() {
        let form = IncomeForm {
            record: record_form(SettlementState::Partial, dec!(1200)),
            tied_to_progress: false,
            progress_percent: None,
        };
        assert_eq!(
            field_names(validate_income_form(&form).unwrap_err()),
            vec!["accumulated_amount"]
        );
    }

    #[test]
    fn test_sub_cent_amounts_are_field_errors() {
        let mut record = record_form(SettlementState::Partial, dec!(400.005));
        record.total_amount = dec!(1000.005);
        let form = IncomeForm {
            record,
            tied_to_progress: false,
            progress_percent: None,
        };
        assert_eq!(
            field_names(validate_income_form(&form).unwrap_err()),
            vec!["total_amount", "accumulated_amount"]
        );
    }

    #[test]
    fn test_amount_beyond_thirteen_integer_digits_is_field_error() {
        let mut record = record_form(SettlementState::Pending, dec!(0));
        record.total_amount = dec!(10000000000000);
        let form = ExpenseForm {
            record,
            supplier: "Concretos del Valle".to_string(),
            vat_withholding: dec!(0.001),
            income_tax_withholding: dec!(0),
        };
        assert_eq!(
            field_names(validate_expense_form(&form).unwrap_err()),
            vec!["total_amount", "vat_withholding"]
        );
    }

    #[test]
    fn test_progress_percent_out_of_range() {
        let form = IncomeForm {
            record: record_form(SettlementState::Pending, dec!(0)),
            tied_to_progress: false,
            progress_percent: Some(dec!(100.01)),
        };
        assert_eq!(
            field_names(validate_income_form(&form).unwrap_err()),
            vec!["progress_percent"]
        );
    }

    #[test]
    fn test_field_errors_take_precedence_over_state_mismatch() {
        let mut record = record_form(SettlementState::Pending, dec!(400));
        record.due_date = None;
        let form = ExpenseForm {
            record,
            supplier: "Ferretería El Constructor".to_string(),
            vat_withholding: dec!(0),
            income_tax_withholding: dec!(0),
        };
        assert_eq!(
            field_names(validate_expense_form(&form).unwrap_err()),
            vec!["due_date"]
        );
    }

    #[test]
    fn test_expense_form_state_mismatch_after_fields_pass() {
        let form = ExpenseForm {
            record: record_form(SettlementState::Pending, dec!(400)),
            supplier: "Concretos del Valle".to_string(),
            vat_withholding: dec!(19),
            income_tax_withholding: dec!(25),
        };
        assert!(matches!(
            validate_expense_form(&form),
            Err(FinanceError::StateMismatch { .. })
        ));
    }

    #[test]
    fn test_expense_form_requires_supplier_and_non_negative_withholdings() {
        let form = ExpenseForm {
            record: record_form(SettlementState::Pending, dec!(0)),
            supplier: String::new(),
            vat_withholding: dec!(-1),
            income_tax_withholding: dec!(-1),
        };
        assert_eq!(
            field_names(validate_expense_form(&form).unwrap_err()),
            vec!["supplier", "vat_withholding", "income_tax_withholding"]
        );
    }
}
