//! Budget line repository.

use chrono::Utc;
use obra_core::budget::{BudgetLineInput, BudgetSummary, BudgetService};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::budget_lines;

/// Error types for budget line operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetLineError {
    /// Budget line not found in the project.
    #[error("Budget line not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Budget lines with their derived figures.
#[derive(Debug, Clone)]
pub struct BudgetOverview {
    /// Lines ordered by category then subcategory.
    pub lines: Vec<budget_lines::Model>,
    /// Totals over `lines`.
    pub summary: BudgetSummary,
}

/// Budget line repository.
#[derive(Debug, Clone)]
pub struct BudgetLineRepository {
    db: DatabaseConnection,
}

impl BudgetLineRepository {
    /// Creates a new budget line repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget line. The input must already be validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_line(
        &self,
        project_id: Uuid,
        input: BudgetLineInput,
        created_by: Uuid,
    ) -> Result<budget_lines::Model, BudgetLineError> {
        let now = Utc::now().into();
        let line = budget_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            project_id: Set(project_id),
            category: Set(input.category.into()),
            subcategory: Set(input.subcategory.trim().to_string()),
            description: Set(input.description),
            planned_amount: Set(input.planned_amount),
            committed_amount: Set(input.committed_amount),
            spent_amount: Set(Decimal::ZERO),
            period_start: Set(input.period_start),
            period_end: Set(input.period_end),
            created_by: Set(Some(created_by)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(%project_id, line_id = %line.id, "Budget line created");
        Ok(line)
    }

    /// Gets a line, scoped to its project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist in the project.
    pub async fn get_line(
        &self,
        project_id: Uuid,
        line_id: Uuid,
    ) -> Result<budget_lines::Model, BudgetLineError> {
        budget_lines::Entity::find_by_id(line_id)
            .filter(budget_lines::Column::ProjectId.eq(project_id))
            .one(&self.db)
            .await?
            .ok_or(BudgetLineError::NotFound(line_id))
    }

    /// Lists the lines of a project with totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_lines(&self, project_id: Uuid) -> Result<BudgetOverview, BudgetLineError> {
        let lines = budget_lines::Entity::find()
            .filter(budget_lines::Column::ProjectId.eq(project_id))
            .order_by_asc(budget_lines::Column::Category)
            .order_by_asc(budget_lines::Column::Subcategory)
            .all(&self.db)
            .await?;

        let domain: Vec<_> = lines.iter().map(budget_lines::Model::to_domain).collect();
        let summary = BudgetService::summarize(&domain);

        Ok(BudgetOverview { lines, summary })
    }

    /// Updates the editable fields of a line. `spent_amount` is only moved
    /// by expense settlements.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist in the project.
    pub async fn update_line(
        &self,
        project_id: Uuid,
        line_id: Uuid,
        input: BudgetLineInput,
    ) -> Result<budget_lines::Model, BudgetLineError> {
        let line = self.get_line(project_id, line_id).await?;

        let mut active: budget_lines::ActiveModel = line.into();
        active.category = Set(input.category.into());
        active.subcategory = Set(input.subcategory.trim().to_string());
        active.description = Set(input.description);
        active.planned_amount = Set(input.planned_amount);
        active.committed_amount = Set(input.committed_amount);
        active.period_start = Set(input.period_start);
        active.period_end = Set(input.period_end);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a line. Expenses pointing at it lose the link.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist in the project.
    pub async fn delete_line(&self, project_id: Uuid, line_id: Uuid) -> Result<(), BudgetLineError> {
        let result = budget_lines::Entity::delete_many()
            .filter(budget_lines::Column::Id.eq(line_id))
            .filter(budget_lines::Column::ProjectId.eq(project_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(BudgetLineError::NotFound(line_id));
        }
        Ok(())
    }
}

/// Adds `increment` to the spent amount of a line in a single statement.
///
/// Returns the number of rows touched; zero means the line is gone or
/// belongs to another project.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn add_spent<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
    line_id: Uuid,
    increment: Decimal,
) -> Result<u64, DbErr> {
    let result = budget_lines::Entity::update_many()
        .col_expr(
            budget_lines::Column::SpentAmount,
            Expr::col(budget_lines::Column::SpentAmount).add(increment),
        )
        .col_expr(budget_lines::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(budget_lines::Column::Id.eq(line_id))
        .filter(budget_lines::Column::ProjectId.eq(project_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}
