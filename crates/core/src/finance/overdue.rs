//! Overdue classification.

use chrono::NaiveDate;
use serde::Serialize;

use super::types::{FinancialRecord, SettlementState};

/// States that can still become overdue.
pub const OPEN_STATES: [SettlementState; 2] = [SettlementState::Pending, SettlementState::Partial];

/// Overdue flag and age of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OverdueStatus {
    /// Whether the due date has passed with money still outstanding.
    pub is_overdue: bool,
    /// Whole days past the due date, 0 when not overdue.
    pub days_overdue: i64,
}

/// Classifies a record as overdue relative to `today`.
///
/// Settled and cancelled records are never overdue, nor are records
/// without a due date. A record due today is not yet overdue.
#[must_use]
pub fn classify_overdue(
    state: SettlementState,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> OverdueStatus {
    let Some(due) = due_date else {
        return OverdueStatus::default();
    };
    if !state.is_open() || due >= today {
        return OverdueStatus::default();
    }
    OverdueStatus {
        is_overdue: true,
        days_overdue: (today - due).num_days(),
    }
}

/// Classifier bound to a single reference date.
///
/// Built once per request so every record in a listing is judged against
/// the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverdueClassifier {
    today: NaiveDate,
}

impl OverdueClassifier {
    /// Creates a classifier for the given reference date.
    #[must_use]
    pub const fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// The reference date.
    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Classifies a record.
    #[must_use]
    pub fn classify(&self, record: &FinancialRecord) -> OverdueStatus {
        classify_overdue(record.state, record.due_date, self.today)
    }
}
