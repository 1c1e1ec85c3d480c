//! Income routes: records, receipts and full settlement.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use obra_core::finance::{
    IncomeType, OverdueClassifier, OverdueStatus, SettlementRequest, SettlementState,
};
use obra_core::project::ProjectPermission;
use obra_db::entities::incomes;
use obra_db::repositories::{IncomeFilter, IncomeInput, IncomeRepository, IncomeSettlement};
use obra_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SettleRequest, authorize, classifier};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the income routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/incomes",
            get(list_incomes).post(create_income),
        )
        .route(
            "/projects/{project_id}/incomes/{income_id}",
            get(get_income).put(update_income),
        )
        .route(
            "/projects/{project_id}/incomes/{income_id}/receipts",
            post(register_receipt),
        )
        .route(
            "/projects/{project_id}/incomes/{income_id}/settle",
            post(settle_income),
        )
}

/// Query parameters for listing incomes.
#[derive(Debug, Deserialize)]
pub struct IncomeListQuery {
    /// Filter by state.
    pub state: Option<SettlementState>,
    /// Filter by type.
    pub income_type: Option<IncomeType>,
    /// Expected on or after.
    pub from: Option<NaiveDate>,
    /// Expected on or before.
    pub to: Option<NaiveDate>,
    /// Only overdue incomes.
    #[serde(default)]
    pub overdue_only: bool,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl IncomeListQuery {
    fn page_request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(default.page),
            self.per_page.unwrap_or(default.per_page),
        )
    }
}

/// Income with derived figures.
#[derive(Debug, Serialize)]
pub struct IncomeResponse {
    /// Stored fields.
    #[serde(flatten)]
    pub income: incomes::Model,
    /// Still to be received.
    pub pending_amount: Decimal,
    /// Overdue classification for today.
    #[serde(flatten)]
    pub overdue: OverdueStatus,
}

impl IncomeResponse {
    /// Builds the response against the request's classifier.
    #[must_use]
    pub fn new(income: incomes::Model, classifier: &OverdueClassifier) -> Self {
        let record = income.to_record();
        Self {
            pending_amount: record.pending_amount(),
            overdue: classifier.classify(&record),
            income,
        }
    }
}

/// Result of a receipt.
#[derive(Debug, Serialize)]
pub struct IncomeSettlementResponse {
    /// Record after the receipt.
    pub income: IncomeResponse,
    /// Amount applied.
    pub applied: Decimal,
    /// State before the receipt.
    pub previous_state: SettlementState,
}

impl IncomeSettlementResponse {
    fn new(settlement: IncomeSettlement, classifier: &OverdueClassifier) -> Self {
        Self {
            income: IncomeResponse::new(settlement.income, classifier),
            applied: settlement.applied,
            previous_state: settlement.previous_state,
        }
    }
}

async fn list_incomes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(query): Query<IncomeListQuery>,
) -> Result<Json<PageResponse<IncomeResponse>>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let classifier = classifier(&state);
    let page = query.page_request();
    let filter = IncomeFilter {
        state: query.state,
        income_type: query.income_type,
        from: query.from,
        to: query.to,
        overdue_only: query.overdue_only,
    };

    let incomes = IncomeRepository::new((*state.db).clone())
        .list_incomes(project_id, &filter, classifier, &page)
        .await?;

    Ok(Json(incomes.map(|i| IncomeResponse::new(i, &classifier))))
}

async fn create_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<IncomeInput>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let income = IncomeRepository::new((*state.db).clone())
        .create_income(project_id, input, auth.user_id())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IncomeResponse::new(income, &classifier(&state))),
    ))
}

async fn get_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, income_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<IncomeResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let income = IncomeRepository::new((*state.db).clone())
        .get_income(project_id, income_id)
        .await?;

    Ok(Json(IncomeResponse::new(income, &classifier(&state))))
}

async fn update_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, income_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<IncomeInput>,
) -> Result<Json<IncomeResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let income = IncomeRepository::new((*state.db).clone())
        .update_income(project_id, income_id, input)
        .await?;

    Ok(Json(IncomeResponse::new(income, &classifier(&state))))
}

async fn register_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, income_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<IncomeSettlementResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ApprovePayments).await?;

    let settlement = IncomeRepository::new((*state.db).clone())
        .settle_income(project_id, income_id, &request, auth.user_id())
        .await?;

    Ok(Json(IncomeSettlementResponse::new(
        settlement,
        &classifier(&state),
    )))
}

async fn settle_income(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, income_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SettleRequest>,
) -> Result<Json<IncomeSettlementResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ApprovePayments).await?;

    let settlement = IncomeRepository::new((*state.db).clone())
        .settle_income_fully(
            project_id,
            income_id,
            request.date,
            request.method,
            auth.user_id(),
        )
        .await?;

    Ok(Json(IncomeSettlementResponse::new(
        settlement,
        &classifier(&state),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use obra_db::entities::sea_orm_active_enums as db;
    use rust_decimal_macros::dec;

    fn income(state: db::SettlementState, accumulated: Decimal, due: NaiveDate) -> incomes::Model {
        let now = Utc::now().into();
        incomes::Model {
            id: Uuid::nil(),
            project_id: Uuid::nil(),
            concept: "Advance".into(),
            description: String::new(),
            income_type: db::IncomeType::Advance,
            total_amount: dec!(1000),
            accumulated_amount: accumulated,
            due_date: due,
            settlement_date: None,
            state,
            payment_method: None,
            reference_number: String::new(),
            bank_account: String::new(),
            tied_to_progress: false,
            progress_percent: None,
            notes: String::new(),
            created_by: None,
            approved_by: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_response_carries_derived_figures() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let classifier = OverdueClassifier::new(today);
        let due = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();

        let response = IncomeResponse::new(
            income(db::SettlementState::Partial, dec!(400), due),
            &classifier,
        );
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["pending_amount"], serde_json::json!(dec!(600)));
        assert_eq!(json["is_overdue"], true);
        assert_eq!(json["days_overdue"], 2);
        assert_eq!(json["state"], "partial");
    }

    #[test]
    fn test_list_query_defaults() {
        let query: IncomeListQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.overdue_only);
        assert_eq!(query.page_request().page, 1);
        assert_eq!(query.page_request().per_page, 20);
        assert!(query.state.is_none());
    }
}
