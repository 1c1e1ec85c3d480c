//! Expense repository: record CRUD, locked settlements and budget rollup.
//!
//! An expense settlement and its budget rollup commit together, but the
//! rollup runs inside a savepoint: if the linked line is gone or the update
//! fails, only the savepoint is rolled back and the settlement still commits
//! with a [`BudgetRollupFailed`] warning.
//!
//! `rolled_up_amount` records how much of the paid amount has reached the
//! line. It moves in the same savepoint as the line, so a retry can only
//! charge what is still missing.

use chrono::{NaiveDate, Utc};
use obra_core::budget::{BudgetError, BudgetService};
use obra_core::finance::{
    BudgetRollup, BudgetRollupFailed, ExpenseForm, ExpenseType, FinanceError, FinancialRecord,
    OverdueClassifier, PaymentMethod, RecordForm, RollupFailureReason, SettlementOutcome,
    SettlementRequest, SettlementState, apply_settlement, mark_fully_settled, plan_rollup,
    validate_expense_form,
};
use obra_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use super::budget_line::add_spent;
use super::income::{open_states, required_due_date, required_version};
use crate::entities::sea_orm_active_enums::{
    ExpenseType as DbExpenseType, SettlementState as DbSettlementState,
};
use crate::entities::{budget_lines, expenses};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found in the project.
    #[error("Expense not found: {0}")]
    NotFound(Uuid),

    /// Budget line not found in the project, or not the expense's line.
    #[error("Budget line not found: {0}")]
    BudgetLineNotFound(Uuid),

    /// A rollup retry asked for more than the paid amount not yet charged.
    #[error("Increment exceeds the paid amount not yet charged; at most {max_allowed} can be charged")]
    IncrementExceedsPaid {
        /// Paid amount not yet charged to the line.
        max_allowed: Decimal,
    },

    /// The expense changed since the client read it.
    #[error("Expense was modified by another request; current version is {current}")]
    VersionConflict {
        /// Version now stored.
        current: i64,
    },

    /// Business rule violation.
    #[error(transparent)]
    Finance(#[from] FinanceError),

    /// Invalid budget increment.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

const fn default_state() -> SettlementState {
    SettlementState::Pending
}

/// Writable expense fields, used for both create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    /// Line the expense is charged to.
    #[serde(default)]
    pub budget_line_id: Option<Uuid>,
    /// Short description.
    pub concept: String,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// Classification.
    pub expense_type: ExpenseType,
    /// Supplier or beneficiary.
    pub supplier: String,
    /// Supplier tax identifier.
    #[serde(default)]
    pub supplier_tax_id: String,
    /// Invoiced amount.
    pub total_amount: Decimal,
    /// Paid to date.
    #[serde(default)]
    pub accumulated_amount: Decimal,
    /// Claimed state.
    #[serde(default = "default_state")]
    pub state: SettlementState,
    /// Invoice date.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Date of the latest payment.
    #[serde(default)]
    pub settlement_date: Option<NaiveDate>,
    /// Channel of the latest payment.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Supplier invoice number.
    #[serde(default)]
    pub invoice_number: String,
    /// Purchase order number.
    #[serde(default)]
    pub purchase_order_number: String,
    /// Paying account.
    #[serde(default)]
    pub bank_account: String,
    /// VAT withheld.
    #[serde(default)]
    pub vat_withholding: Decimal,
    /// Income tax withheld.
    #[serde(default)]
    pub income_tax_withholding: Decimal,
    /// Free text.
    #[serde(default)]
    pub notes: String,
    /// Version the client last read. Required on update, ignored on create.
    #[serde(default)]
    pub version: Option<i64>,
}

impl ExpenseInput {
    /// The fields subject to form validation.
    #[must_use]
    pub fn form(&self) -> ExpenseForm {
        ExpenseForm {
            record: RecordForm {
                concept: self.concept.clone(),
                total_amount: self.total_amount,
                accumulated_amount: self.accumulated_amount,
                state: self.state,
                due_date: self.due_date,
                settlement_date: self.settlement_date,
                payment_method: self.payment_method,
            },
            supplier: self.supplier.clone(),
            vat_withholding: self.vat_withholding,
            income_tax_withholding: self.income_tax_withholding,
        }
    }
}

/// Expense listing filter.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Only this state.
    pub state: Option<SettlementState>,
    /// Only this type.
    pub expense_type: Option<ExpenseType>,
    /// Only expenses charged to this line.
    pub budget_line_id: Option<Uuid>,
    /// Due on or after.
    pub from: Option<NaiveDate>,
    /// Due on or before.
    pub to: Option<NaiveDate>,
    /// Only records the classifier would mark overdue.
    pub overdue_only: bool,
}

/// A committed expense settlement.
#[derive(Debug, Clone)]
pub struct ExpenseSettlement {
    /// Row after the settlement.
    pub expense: expenses::Model,
    /// Amount added by this settlement.
    pub applied: Decimal,
    /// State before the settlement.
    pub previous_state: SettlementState,
    /// Set when the budget line could not be charged.
    pub warning: Option<BudgetRollupFailed>,
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and stores a new expense.
    ///
    /// # Errors
    ///
    /// Returns a `Finance` validation error, or `BudgetLineNotFound` if the
    /// line is not in the project.
    pub async fn create_expense(
        &self,
        project_id: Uuid,
        input: ExpenseInput,
        created_by: Uuid,
    ) -> Result<expenses::Model, ExpenseError> {
        validate_expense_form(&input.form())?;
        let due_date = required_due_date(input.due_date)?;
        if let Some(line_id) = input.budget_line_id {
            self.ensure_line_in_project(project_id, line_id).await?;
        }
        let now = Utc::now().into();

        let expense = expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            budget_line_id: Set(input.budget_line_id),
            concept: Set(input.concept.trim().to_string()),
            description: Set(input.description),
            expense_type: Set(input.expense_type.into()),
            supplier: Set(input.supplier.trim().to_string()),
            supplier_tax_id: Set(input.supplier_tax_id),
            total_amount: Set(input.total_amount),
            accumulated_amount: Set(input.accumulated_amount),
            rolled_up_amount: Set(Decimal::ZERO),
            issue_date: Set(input.issue_date),
            due_date: Set(due_date),
            settlement_date: Set(input.settlement_date),
            state: Set(input.state.into()),
            payment_method: Set(input.payment_method.map(Into::into)),
            invoice_number: Set(input.invoice_number),
            purchase_order_number: Set(input.purchase_order_number),
            bank_account: Set(input.bank_account),
            vat_withholding: Set(input.vat_withholding),
            income_tax_withholding: Set(input.income_tax_withholding),
            notes: Set(input.notes),
            created_by: Set(Some(created_by)),
            approved_by: Set(None),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(record_id = %expense.id, %project_id, "Expense created");
        Ok(expense)
    }

    /// Replaces the writable fields of an expense after validating the
    /// whole form. Editing amounts here does not touch the budget line.
    /// The write only happens if the stored version still equals
    /// `input.version`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `BudgetLineNotFound`, `VersionConflict` or a
    /// `Finance` validation error.
    pub async fn update_expense(
        &self,
        project_id: Uuid,
        expense_id: Uuid,
        input: ExpenseInput,
    ) -> Result<expenses::Model, ExpenseError> {
        validate_expense_form(&input.form())?;
        let due_date = required_due_date(input.due_date)?;
        let expected = required_version(input.version)?;
        if let Some(line_id) = input.budget_line_id {
            self.ensure_line_in_project(project_id, line_id).await?;
        }

        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, project_id, expense_id).await?;
        if expense.version != expected {
            return Err(ExpenseError::VersionConflict {
                current: expense.version,
            });
        }
        let version = expense.version;

        let mut active: expenses::ActiveModel = expense.into();
        active.budget_line_id = Set(input.budget_line_id);
        active.concept = Set(input.concept.trim().to_string());
        active.description = Set(input.description);
        active.expense_type = Set(input.expense_type.into());
        active.supplier = Set(input.supplier.trim().to_string());
        active.supplier_tax_id = Set(input.supplier_tax_id);
        active.total_amount = Set(input.total_amount);
        active.accumulated_amount = Set(input.accumulated_amount);
        active.issue_date = Set(input.issue_date);
        active.due_date = Set(due_date);
        active.settlement_date = Set(input.settlement_date);
        active.state = Set(input.state.into());
        active.payment_method = Set(input.payment_method.map(Into::into));
        active.invoice_number = Set(input.invoice_number);
        active.purchase_order_number = Set(input.purchase_order_number);
        active.bank_account = Set(input.bank_account);
        active.vat_withholding = Set(input.vat_withholding);
        active.income_tax_withholding = Set(input.income_tax_withholding);
        active.notes = Set(input.notes);
        active.version = Set(version + 1);
        active.updated_at = Set(Utc::now().into());
        let expense = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(record_id = %expense.id, version = expense.version, "Expense updated");
        Ok(expense)
    }

    /// Gets an expense, scoped to its project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the expense does not exist in the project.
    pub async fn get_expense(
        &self,
        project_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, ExpenseError> {
        expenses::Entity::find_by_id(expense_id)
            .filter(expenses::Column::ProjectId.eq(project_id))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))
    }

    /// Lists the expenses of a project, earliest due first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_expenses(
        &self,
        project_id: Uuid,
        filter: &ExpenseFilter,
        classifier: OverdueClassifier,
        page: &PageRequest,
    ) -> Result<PageResponse<expenses::Model>, ExpenseError> {
        let mut query = expenses::Entity::find()
            .filter(expenses::Column::ProjectId.eq(project_id))
            .order_by_asc(expenses::Column::DueDate)
            .order_by_asc(expenses::Column::CreatedAt);

        if let Some(state) = filter.state {
            query = query.filter(expenses::Column::State.eq(DbSettlementState::from(state)));
        }
        if let Some(expense_type) = filter.expense_type {
            query =
                query.filter(expenses::Column::ExpenseType.eq(DbExpenseType::from(expense_type)));
        }
        if let Some(line_id) = filter.budget_line_id {
            query = query.filter(expenses::Column::BudgetLineId.eq(line_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(expenses::Column::DueDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenses::Column::DueDate.lte(to));
        }
        if filter.overdue_only {
            query = query
                .filter(expenses::Column::State.is_in(open_states()))
                .filter(expenses::Column::DueDate.lt(classifier.today()));
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(page.page_index()).await?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Registers a payment of `request.amount` and charges the linked line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or the accumulator's `Finance` error. Nothing is
    /// written on error. A failed rollup is not an error; see
    /// [`ExpenseSettlement::warning`].
    pub async fn settle_expense(
        &self,
        project_id: Uuid,
        expense_id: Uuid,
        request: &SettlementRequest,
        approved_by: Uuid,
    ) -> Result<ExpenseSettlement, ExpenseError> {
        self.settle_with(project_id, expense_id, approved_by, |record| {
            apply_settlement(record, request)
        })
        .await
    }

    /// Pays the whole outstanding balance.
    ///
    /// # Errors
    ///
    /// Same as [`Self::settle_expense`].
    pub async fn settle_expense_fully(
        &self,
        project_id: Uuid,
        expense_id: Uuid,
        date: NaiveDate,
        method: Option<PaymentMethod>,
        approved_by: Uuid,
    ) -> Result<ExpenseSettlement, ExpenseError> {
        self.settle_with(project_id, expense_id, approved_by, |record| {
            mark_fully_settled(record, date, method)
        })
        .await
    }

    /// Re-applies a rollup that previously failed.
    ///
    /// The line must be the one the expense is linked to and the increment
    /// cannot exceed the paid amount that has not reached the line yet, so
    /// repeating a successful retry charges nothing twice.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `BudgetLineNotFound`, `Budget(InvalidIncrement)`
    /// or `IncrementExceedsPaid`.
    pub async fn retry_budget_rollup(
        &self,
        project_id: Uuid,
        expense_id: Uuid,
        rollup: BudgetRollup,
    ) -> Result<(), ExpenseError> {
        BudgetService::validate_increment(rollup.increment)?;

        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, project_id, expense_id).await?;
        let line_id = rollup.budget_line_id.into_inner();
        if expense.budget_line_id != Some(line_id) {
            return Err(ExpenseError::BudgetLineNotFound(line_id));
        }
        let outstanding = expense.unrolled_amount();
        if rollup.increment > outstanding {
            return Err(ExpenseError::IncrementExceedsPaid {
                max_allowed: outstanding,
            });
        }

        if add_spent(&txn, project_id, line_id, rollup.increment).await? == 0 {
            return Err(ExpenseError::BudgetLineNotFound(line_id));
        }
        add_rolled_up(&txn, expense_id, rollup.increment).await?;
        txn.commit().await?;

        tracing::info!(
            record_id = %expense_id,
            budget_line_id = %line_id,
            delta = %rollup.increment,
            "Budget rollup re-applied"
        );
        Ok(())
    }

    async fn settle_with<F>(
        &self,
        project_id: Uuid,
        expense_id: Uuid,
        approved_by: Uuid,
        settle: F,
    ) -> Result<ExpenseSettlement, ExpenseError>
    where
        F: FnOnce(&FinancialRecord) -> Result<SettlementOutcome, FinanceError>,
    {
        let txn = self.db.begin().await?;
        let expense = lock_expense(&txn, project_id, expense_id).await?;

        let outcome = settle(&expense.to_record())?;
        let version = expense.version;

        let mut active: expenses::ActiveModel = expense.into();
        active.accumulated_amount = Set(outcome.record.accumulated_amount);
        active.state = Set(outcome.record.state.into());
        active.settlement_date = Set(outcome.record.settlement_date);
        active.payment_method = Set(outcome.record.payment_method.map(Into::into));
        active.approved_by = Set(Some(approved_by));
        active.version = Set(version + 1);
        active.updated_at = Set(Utc::now().into());
        let mut expense = active.update(&txn).await?;

        let warning = match plan_rollup(&outcome) {
            Some(rollup) => match apply_rollup(&txn, project_id, expense.id, rollup).await {
                Ok(()) => {
                    expense.rolled_up_amount += rollup.increment;
                    None
                }
                Err(failed) => Some(failed),
            },
            None => None,
        };

        txn.commit().await?;

        tracing::info!(
            record_id = %expense.id,
            delta = %outcome.applied,
            state = outcome.record.state.as_str(),
            "Expense settled"
        );
        if let Some(failed) = &warning {
            tracing::warn!(
                record_id = %expense.id,
                budget_line_id = %failed.budget_line_id,
                delta = %failed.increment,
                reason = %failed.reason,
                "Budget rollup failed"
            );
        }

        Ok(ExpenseSettlement {
            expense,
            applied: outcome.applied,
            previous_state: outcome.previous_state,
            warning,
        })
    }

    async fn ensure_line_in_project(
        &self,
        project_id: Uuid,
        line_id: Uuid,
    ) -> Result<(), ExpenseError> {
        let exists = budget_lines::Entity::find_by_id(line_id)
            .filter(budget_lines::Column::ProjectId.eq(project_id))
            .count(&self.db)
            .await?
            > 0;
        if exists {
            Ok(())
        } else {
            Err(ExpenseError::BudgetLineNotFound(line_id))
        }
    }
}

async fn lock_expense(
    txn: &DatabaseTransaction,
    project_id: Uuid,
    expense_id: Uuid,
) -> Result<expenses::Model, ExpenseError> {
    expenses::Entity::find_by_id(expense_id)
        .filter(expenses::Column::ProjectId.eq(project_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(ExpenseError::NotFound(expense_id))
}

/// Adds `increment` to the expense's `rolled_up_amount`.
async fn add_rolled_up<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
    increment: Decimal,
) -> Result<(), DbErr> {
    expenses::Entity::update_many()
        .col_expr(
            expenses::Column::RolledUpAmount,
            Expr::col(expenses::Column::RolledUpAmount).add(increment),
        )
        .filter(expenses::Column::Id.eq(expense_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Charges the line and records the charge on the expense, inside a
/// savepoint of `txn`.
async fn apply_rollup(
    txn: &DatabaseTransaction,
    project_id: Uuid,
    expense_id: Uuid,
    rollup: BudgetRollup,
) -> Result<(), BudgetRollupFailed> {
    let failed = |reason| BudgetRollupFailed::new(rollup, reason);
    let db_failed = |e: DbErr| failed(RollupFailureReason::Database(e.to_string()));

    let savepoint = txn.begin().await.map_err(db_failed)?;
    let line_id = rollup.budget_line_id.into_inner();

    let charged = match add_spent(&savepoint, project_id, line_id, rollup.increment).await {
        Ok(0) => Err(failed(RollupFailureReason::LineMissing)),
        Ok(_) => add_rolled_up(&savepoint, expense_id, rollup.increment)
            .await
            .map_err(db_failed),
        Err(e) => Err(db_failed(e)),
    };

    match charged {
        Ok(()) => savepoint.commit().await.map_err(db_failed),
        Err(warning) => {
            savepoint.rollback().await.map_err(db_failed)?;
            Err(warning)
        }
    }
}
