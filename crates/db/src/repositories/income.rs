//! Income repository: record CRUD and locked settlements.

use chrono::{NaiveDate, Utc};
use obra_core::finance::{
    FieldError, FinanceError, FinancialRecord, IncomeForm, IncomeType, OPEN_STATES,
    OverdueClassifier, PaymentMethod, RecordForm, SettlementOutcome, SettlementRequest,
    SettlementState, apply_settlement, mark_fully_settled, validate_income_form,
};
use obra_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::incomes;
use crate::entities::sea_orm_active_enums::{
    IncomeType as DbIncomeType, SettlementState as DbSettlementState,
};

/// Error types for income operations.
#[derive(Debug, thiserror::Error)]
pub enum IncomeError {
    /// Income not found in the project.
    #[error("Income not found: {0}")]
    NotFound(Uuid),

    /// The income changed since the client read it.
    #[error("Income was modified by another request; current version is {current}")]
    VersionConflict {
        /// Version now stored.
        current: i64,
    },

    /// Business rule violation.
    #[error(transparent)]
    Finance(#[from] FinanceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

const fn default_state() -> SettlementState {
    SettlementState::Pending
}

/// Writable income fields, used for both create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomeInput {
    /// Short description.
    pub concept: String,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Classification.
    pub income_type: IncomeType,
    /// Expected amount.
    pub total_amount: Decimal,
    /// Received to date.
    #[serde(default)]
    pub accumulated_amount: Decimal,
    /// Claimed state.
    #[serde(default = "default_state")]
    pub state: SettlementState,
    /// Expected date.
    pub due_date: Option<NaiveDate>,
    /// Date of the latest receipt.
    #[serde(default)]
    pub settlement_date: Option<NaiveDate>,
    /// Channel of the latest receipt.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Invoice or transfer reference.
    #[serde(default)]
    pub reference_number: String,
    /// Receiving account.
    #[serde(default)]
    pub bank_account: String,
    /// Whether the income is tied to certified progress.
    #[serde(default)]
    pub tied_to_progress: bool,
    /// Progress percentage certified.
    #[serde(default)]
    pub progress_percent: Option<Decimal>,
    /// Free text.
    #[serde(default)]
    pub notes: String,
    /// Version the client last read. Required on update, ignored on create.
    #[serde(default)]
    pub version: Option<i64>,
}

impl IncomeInput {
    /// The fields subject to form validation.
    #[must_use]
    pub fn form(&self) -> IncomeForm {
        IncomeForm {
            record: RecordForm {
                concept: self.concept.clone(),
                total_amount: self.total_amount,
                accumulated_amount: self.accumulated_amount,
                state: self.state,
                due_date: self.due_date,
                settlement_date: self.settlement_date,
                payment_method: self.payment_method,
            },
            tied_to_progress: self.tied_to_progress,
            progress_percent: self.progress_percent,
        }
    }
}

/// Income listing filter.
#[derive(Debug, Clone, Default)]
pub struct IncomeFilter {
    /// Only this state.
    pub state: Option<SettlementState>,
    /// Only this type.
    pub income_type: Option<IncomeType>,
    /// Due on or after.
    pub from: Option<NaiveDate>,
    /// Due on or before.
    pub to: Option<NaiveDate>,
    /// Only records the classifier would mark overdue.
    pub overdue_only: bool,
}

/// A committed income settlement.
#[derive(Debug, Clone)]
pub struct IncomeSettlement {
    /// Row after the settlement.
    pub income: incomes::Model,
    /// Amount added by this settlement.
    pub applied: Decimal,
    /// State before the settlement.
    pub previous_state: SettlementState,
}

/// Income repository.
#[derive(Debug, Clone)]
pub struct IncomeRepository {
    db: DatabaseConnection,
}

impl IncomeRepository {
    /// Creates a new income repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and stores a new income.
    ///
    /// # Errors
    ///
    /// Returns `Finance(Validation | StateMismatch)` for invalid input.
    pub async fn create_income(
        &self,
        project_id: Uuid,
        input: IncomeInput,
        created_by: Uuid,
    ) -> Result<incomes::Model, IncomeError> {
        validate_income_form(&input.form())?;
        let due_date = required_due_date(input.due_date)?;
        let now = Utc::now().into();

        let income = incomes::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            concept: Set(input.concept.trim().to_string()),
            description: Set(input.description),
            income_type: Set(input.income_type.into()),
            total_amount: Set(input.total_amount),
            accumulated_amount: Set(input.accumulated_amount),
            due_date: Set(due_date),
            settlement_date: Set(input.settlement_date),
            state: Set(input.state.into()),
            payment_method: Set(input.payment_method.map(Into::into)),
            reference_number: Set(input.reference_number),
            bank_account: Set(input.bank_account),
            tied_to_progress: Set(input.tied_to_progress),
            progress_percent: Set(input.progress_percent),
            notes: Set(input.notes),
            created_by: Set(Some(created_by)),
            approved_by: Set(None),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(record_id = %income.id, %project_id, "Income created");
        Ok(income)
    }

    /// Replaces the writable fields of an income after validating the
    /// whole form. The write only happens if the stored version still
    /// equals `input.version`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `VersionConflict` or a `Finance` validation error.
    pub async fn update_income(
        &self,
        project_id: Uuid,
        income_id: Uuid,
        input: IncomeInput,
    ) -> Result<incomes::Model, IncomeError> {
        validate_income_form(&input.form())?;
        let due_date = required_due_date(input.due_date)?;
        let expected = required_version(input.version)?;

        let txn = self.db.begin().await?;
        let income = incomes::Entity::find_by_id(income_id)
            .filter(incomes::Column::ProjectId.eq(project_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(IncomeError::NotFound(income_id))?;
        if income.version != expected {
            return Err(IncomeError::VersionConflict {
                current: income.version,
            });
        }
        let version = income.version;

        let mut active: incomes::ActiveModel = income.into();
        active.concept = Set(input.concept.trim().to_string());
        active.description = Set(input.description);
        active.income_type = Set(input.income_type.into());
        active.total_amount = Set(input.total_amount);
        active.accumulated_amount = Set(input.accumulated_amount);
        active.due_date = Set(due_date);
        active.settlement_date = Set(input.settlement_date);
        active.state = Set(input.state.into());
        active.payment_method = Set(input.payment_method.map(Into::into));
        active.reference_number = Set(input.reference_number);
        active.bank_account = Set(input.bank_account);
        active.tied_to_progress = Set(input.tied_to_progress);
        active.progress_percent = Set(input.progress_percent);
        active.notes = Set(input.notes);
        active.version = Set(version + 1);
        active.updated_at = Set(Utc::now().into());
        let income = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(record_id = %income.id, version = income.version, "Income updated");
        Ok(income)
    }

    /// Gets an income, scoped to its project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the income does not exist in the project.
    pub async fn get_income(
        &self,
        project_id: Uuid,
        income_id: Uuid,
    ) -> Result<incomes::Model, IncomeError> {
        incomes::Entity::find_by_id(income_id)
            .filter(incomes::Column::ProjectId.eq(project_id))
            .one(&self.db)
            .await?
            .ok_or(IncomeError::NotFound(income_id))
    }

    /// Lists the incomes of a project, earliest due first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_incomes(
        &self,
        project_id: Uuid,
        filter: &IncomeFilter,
        classifier: OverdueClassifier,
        page: &PageRequest,
    ) -> Result<PageResponse<incomes::Model>, IncomeError> {
        let mut query = incomes::Entity::find()
            .filter(incomes::Column::ProjectId.eq(project_id))
            .order_by_asc(incomes::Column::DueDate)
            .order_by_asc(incomes::Column::CreatedAt);

        if let Some(state) = filter.state {
            query = query.filter(incomes::Column::State.eq(DbSettlementState::from(state)));
        }
        if let Some(income_type) = filter.income_type {
            query = query.filter(incomes::Column::IncomeType.eq(DbIncomeType::from(income_type)));
        }
        if let Some(from) = filter.from {
            query = query.filter(incomes::Column::DueDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(incomes::Column::DueDate.lte(to));
        }
        if filter.overdue_only {
            query = query
                .filter(incomes::Column::State.is_in(open_states()))
                .filter(incomes::Column::DueDate.lt(classifier.today()));
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.page_index()).await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Registers a receipt of `request.amount`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or the accumulator's `Finance` error. Nothing is
    /// written on error.
    pub async fn settle_income(
        &self,
        project_id: Uuid,
        income_id: Uuid,
        request: &SettlementRequest,
        approved_by: Uuid,
    ) -> Result<IncomeSettlement, IncomeError> {
        self.settle_with(project_id, income_id, approved_by, |record| {
            apply_settlement(record, request)
        })
        .await
    }

    /// Receives the whole outstanding balance.
    ///
    /// # Errors
    ///
    /// Same as [`Self::settle_income`].
    pub async fn settle_income_fully(
        &self,
        project_id: Uuid,
        income_id: Uuid,
        date: NaiveDate,
        method: Option<PaymentMethod>,
        approved_by: Uuid,
    ) -> Result<IncomeSettlement, IncomeError> {
        self.settle_with(project_id, income_id, approved_by, |record| {
            mark_fully_settled(record, date, method)
        })
        .await
    }

    async fn settle_with<F>(
        &self,
        project_id: Uuid,
        income_id: Uuid,
        approved_by: Uuid,
        settle: F,
    ) -> Result<IncomeSettlement, IncomeError>
    where
        F: FnOnce(&FinancialRecord) -> Result<SettlementOutcome, FinanceError>,
    {
        let txn = self.db.begin().await?;

        let income = incomes::Entity::find_by_id(income_id)
            .filter(incomes::Column::ProjectId.eq(project_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(IncomeError::NotFound(income_id))?;

        let outcome = settle(&income.to_record())?;
        let version = income.version;

        let mut active: incomes::ActiveModel = income.into();
        active.accumulated_amount = Set(outcome.record.accumulated_amount);
        active.state = Set(outcome.record.state.into());
        active.settlement_date = Set(outcome.record.settlement_date);
        active.payment_method = Set(outcome.record.payment_method.map(Into::into));
        active.approved_by = Set(Some(approved_by));
        active.version = Set(version + 1);
        active.updated_at = Set(Utc::now().into());
        let income = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            record_id = %income.id,
            delta = %outcome.applied,
            state = outcome.record.state.as_str(),
            "Income settled"
        );

        Ok(IncomeSettlement {
            income,
            applied: outcome.applied,
            previous_state: outcome.previous_state,
        })
    }
}

/// Unwraps a due date that form validation has already required.
pub(crate) fn required_due_date(due_date: Option<NaiveDate>) -> Result<NaiveDate, FinanceError> {
    due_date.ok_or_else(|| FinanceError::Validation {
        errors: vec![FieldError::new("due_date", "Due date is required")],
    })
}

pub(crate) fn required_version(version: Option<i64>) -> Result<i64, FinanceError> {
    version.ok_or_else(|| FinanceError::Validation {
        errors: vec![FieldError::new(
            "version",
            "Version is required when updating a record",
        )],
    })
}

pub(crate) fn open_states() -> Vec<DbSettlementState> {
    OPEN_STATES
        .iter()
        .map(|s| DbSettlementState::from(*s))
        .collect()
}
