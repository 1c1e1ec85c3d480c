//! Cash-flow projection repository.

use chrono::Utc;
use obra_core::cashflow::{CashFlowInput, CashFlowPeriod, CashFlowService, CashFlowSummary};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::cash_flow_projections;

/// Error types for cash-flow operations.
#[derive(Debug, thiserror::Error)]
pub enum CashFlowRepoError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Projections of a project with totals.
#[derive(Debug, Clone)]
pub struct CashFlowOverview {
    /// Projections in chronological order.
    pub projections: Vec<cash_flow_projections::Model>,
    /// Totals over `projections`.
    pub summary: CashFlowSummary,
}

/// Cash-flow projection repository.
#[derive(Debug, Clone)]
pub struct CashFlowRepository {
    db: DatabaseConnection,
}

impl CashFlowRepository {
    /// Creates a new cash-flow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the projections of a project in chronological order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_projections(
        &self,
        project_id: Uuid,
    ) -> Result<CashFlowOverview, CashFlowRepoError> {
        let projections = cash_flow_projections::Entity::find()
            .filter(cash_flow_projections::Column::ProjectId.eq(project_id))
            .order_by_asc(cash_flow_projections::Column::Year)
            .order_by_asc(cash_flow_projections::Column::Month)
            .all(&self.db)
            .await?;

        let domain: Vec<_> = projections
            .iter()
            .map(cash_flow_projections::Model::to_domain)
            .collect();
        let summary = CashFlowService::summarize(&domain);

        Ok(CashFlowOverview {
            projections,
            summary,
        })
    }

    /// Creates or replaces the projection for one month.
    ///
    /// The period and input must already be validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or write fails.
    pub async fn upsert_projection(
        &self,
        project_id: Uuid,
        period: CashFlowPeriod,
        input: CashFlowInput,
    ) -> Result<cash_flow_projections::Model, CashFlowRepoError> {
        let month = i32::try_from(period.month).unwrap_or_default();
        let closing_balance = input.resolved_closing_balance();
        let now = Utc::now().into();

        let existing = cash_flow_projections::Entity::find()
            .filter(cash_flow_projections::Column::ProjectId.eq(project_id))
            .filter(cash_flow_projections::Column::Year.eq(period.year))
            .filter(cash_flow_projections::Column::Month.eq(month))
            .one(&self.db)
            .await?;

        let model = if let Some(row) = existing {
            let mut active: cash_flow_projections::ActiveModel = row.into();
            active.projected_income = Set(input.projected_income);
            active.projected_expense = Set(input.projected_expense);
            active.actual_income = Set(input.actual_income);
            active.actual_expense = Set(input.actual_expense);
            active.opening_balance = Set(input.opening_balance);
            active.closing_balance = Set(closing_balance);
            active.notes = Set(input.notes);
            active.updated_at = Set(now);
            active.update(&self.db).await?
        } else {
            cash_flow_projections::ActiveModel {
                id: Set(Uuid::now_v7()),
                project_id: Set(project_id),
                year: Set(period.year),
                month: Set(month),
                projected_income: Set(input.projected_income),
                projected_expense: Set(input.projected_expense),
                actual_income: Set(input.actual_income),
                actual_expense: Set(input.actual_expense),
                opening_balance: Set(input.opening_balance),
                closing_balance: Set(closing_balance),
                notes: Set(input.notes),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await?
        };

        tracing::debug!(%project_id, %period, "Cash-flow projection saved");
        Ok(model)
    }
}
