//! Cash-flow projection routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use obra_core::cashflow::{CashFlowInput, CashFlowService, CashFlowSummary};
use obra_core::project::ProjectPermission;
use obra_db::CashFlowRepository;
use obra_db::entities::cash_flow_projections;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::authorize;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the cash-flow routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects/{project_id}/cash-flow", get(list_projections))
        .route(
            "/projects/{project_id}/cash-flow/{year}/{month}",
            put(upsert_projection),
        )
}

/// One month with its nets.
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    /// Stored fields.
    #[serde(flatten)]
    pub projection: cash_flow_projections::Model,
    /// Projected income minus projected expense.
    pub projected_net: Decimal,
    /// Actual income minus actual expense.
    pub actual_net: Decimal,
    /// Actual net minus projected net.
    pub variance: Decimal,
}

impl From<cash_flow_projections::Model> for ProjectionResponse {
    fn from(projection: cash_flow_projections::Model) -> Self {
        let domain = projection.to_domain();
        Self {
            projected_net: domain.projected_net(),
            actual_net: domain.actual_net(),
            variance: domain.variance(),
            projection,
        }
    }
}

/// Months of a project with totals.
#[derive(Debug, Serialize)]
pub struct CashFlowResponse {
    /// Months in order.
    pub projections: Vec<ProjectionResponse>,
    /// Totals.
    pub summary: CashFlowSummary,
}

async fn list_projections(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<CashFlowResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let overview = CashFlowRepository::new((*state.db).clone())
        .list_projections(project_id)
        .await?;

    Ok(Json(CashFlowResponse {
        projections: overview.projections.into_iter().map(Into::into).collect(),
        summary: overview.summary,
    }))
}

async fn upsert_projection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, year, month)): Path<(Uuid, i32, u32)>,
    Json(input): Json<CashFlowInput>,
) -> Result<Json<ProjectionResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ManageFinancials).await?;
    let period = CashFlowService::validate_period(year, month)?;
    CashFlowService::validate_input(&input)?;

    let projection = CashFlowRepository::new((*state.db).clone())
        .upsert_projection(project_id, period, input)
        .await?;

    Ok(Json(projection.into()))
}
