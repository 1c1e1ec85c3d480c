//! Budget line routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use obra_core::budget::{BudgetLineInput, BudgetService, BudgetSummary, VarianceResult};
use obra_core::project::ProjectPermission;
use obra_db::BudgetLineRepository;
use obra_db::entities::budget_lines;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::authorize;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the budget line routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/budget-lines",
            get(list_lines).post(create_line),
        )
        .route(
            "/projects/{project_id}/budget-lines/{line_id}",
            get(get_line).put(update_line).delete(delete_line),
        )
}

/// Budget line with derived figures.
#[derive(Debug, Serialize)]
pub struct BudgetLineResponse {
    /// Stored fields.
    #[serde(flatten)]
    pub line: budget_lines::Model,
    /// `planned - committed - spent`.
    pub available: Decimal,
    /// Spent as a percentage of planned.
    pub usage_percent: Decimal,
    /// Spent exceeds planned.
    pub is_over_budget: bool,
    /// Planned versus spent.
    pub variance: VarianceResult,
}

impl From<budget_lines::Model> for BudgetLineResponse {
    fn from(line: budget_lines::Model) -> Self {
        let domain = line.to_domain();
        Self {
            available: domain.available(),
            usage_percent: domain.usage_percent(),
            is_over_budget: domain.is_over_budget(),
            variance: BudgetService::calculate_variance(domain.planned_amount, domain.spent_amount),
            line,
        }
    }
}

/// All lines of a project with totals.
#[derive(Debug, Serialize)]
pub struct BudgetLinesResponse {
    /// Lines by category.
    pub lines: Vec<BudgetLineResponse>,
    /// Totals.
    pub summary: BudgetSummary,
}

async fn list_lines(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<BudgetLinesResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let overview = BudgetLineRepository::new((*state.db).clone())
        .list_lines(project_id)
        .await?;

    Ok(Json(BudgetLinesResponse {
        lines: overview.lines.into_iter().map(Into::into).collect(),
        summary: overview.summary,
    }))
}

async fn create_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<BudgetLineInput>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ManageFinancials).await?;
    BudgetService::validate_line(&input)?;

    let line = BudgetLineRepository::new((*state.db).clone())
        .create_line(project_id, input, auth.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(BudgetLineResponse::from(line))))
}

async fn get_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BudgetLineResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let line = BudgetLineRepository::new((*state.db).clone())
        .get_line(project_id, line_id)
        .await?;

    Ok(Json(line.into()))
}

async fn update_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, line_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<BudgetLineInput>,
) -> Result<Json<BudgetLineResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ManageFinancials).await?;
    BudgetService::validate_line(&input)?;

    let line = BudgetLineRepository::new((*state.db).clone())
        .update_line(project_id, line_id, input)
        .await?;

    Ok(Json(line.into()))
}

async fn delete_line(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ManageFinancials).await?;

    BudgetLineRepository::new((*state.db).clone())
        .delete_line(project_id, line_id)
        .await?;

    info!(%project_id, %line_id, user_id = %auth.user_id(), "Budget line deleted");
    Ok(StatusCode::NO_CONTENT)
}
