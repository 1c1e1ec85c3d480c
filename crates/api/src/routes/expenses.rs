//! Expense routes: records, payments, full settlement and rollup retry.
//!
//! A payment whose budget rollup failed still succeeds; the failure comes
//! back under `warnings` so the client can offer a retry.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use obra_core::finance::{
    BudgetRollup, BudgetRollupFailed, ExpenseType, OverdueClassifier, OverdueStatus,
    SettlementRequest, SettlementState,
};
use obra_core::project::ProjectPermission;
use obra_db::entities::expenses;
use obra_db::repositories::{ExpenseFilter, ExpenseInput, ExpenseRepository, ExpenseSettlement};
use obra_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{SettleRequest, authorize, classifier};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the expense routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/expenses",
            get(list_expenses).post(create_expense),
        )
        .route(
            "/projects/{project_id}/expenses/{expense_id}",
            get(get_expense).put(update_expense),
        )
        .route(
            "/projects/{project_id}/expenses/{expense_id}/payments",
            post(register_payment),
        )
        .route(
            "/projects/{project_id}/expenses/{expense_id}/settle",
            post(settle_expense),
        )
        .route(
            "/projects/{project_id}/expenses/{expense_id}/rollup-retry",
            post(retry_rollup),
        )
}

/// Query parameters for listing expenses.
#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    /// Filter by state.
    pub state: Option<SettlementState>,
    /// Filter by type.
    pub expense_type: Option<ExpenseType>,
    /// Filter by budget line.
    pub budget_line_id: Option<Uuid>,
    /// Due on or after.
    pub from: Option<NaiveDate>,
    /// Due on or before.
    pub to: Option<NaiveDate>,
    /// Only overdue expenses.
    #[serde(default)]
    pub overdue_only: bool,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Expense with derived figures.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Stored fields.
    #[serde(flatten)]
    pub expense: expenses::Model,
    /// Still to be paid.
    pub pending_amount: Decimal,
    /// Total minus withholdings.
    pub net_payable: Decimal,
    /// Overdue classification for today.
    #[serde(flatten)]
    pub overdue: OverdueStatus,
}

impl ExpenseResponse {
    /// Builds the response against the request's classifier.
    #[must_use]
    pub fn new(expense: expenses::Model, classifier: &OverdueClassifier) -> Self {
        let record = expense.to_record();
        Self {
            pending_amount: record.pending_amount(),
            net_payable: expense.net_payable(),
            overdue: classifier.classify(&record),
            expense,
        }
    }
}

/// Result of a payment.
#[derive(Debug, Serialize)]
pub struct ExpenseSettlementResponse {
    /// Record after the payment.
    pub expense: ExpenseResponse,
    /// Amount applied.
    pub applied: Decimal,
    /// State before the payment.
    pub previous_state: SettlementState,
    /// Budget rollups that could not be applied.
    pub warnings: Vec<BudgetRollupFailed>,
}

impl ExpenseSettlementResponse {
    fn new(settlement: ExpenseSettlement, classifier: &OverdueClassifier) -> Self {
        Self {
            expense: ExpenseResponse::new(settlement.expense, classifier),
            applied: settlement.applied,
            previous_state: settlement.previous_state,
            warnings: settlement.warning.into_iter().collect(),
        }
    }
}

async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<PageResponse<ExpenseResponse>>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let classifier = classifier(&state);
    let default = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(default.page),
        query.per_page.unwrap_or(default.per_page),
    );
    let filter = ExpenseFilter {
        state: query.state,
        expense_type: query.expense_type,
        budget_line_id: query.budget_line_id,
        from: query.from,
        to: query.to,
        overdue_only: query.overdue_only,
    };

    let expenses = ExpenseRepository::new((*state.db).clone())
        .list_expenses(project_id, &filter, classifier, &page)
        .await?;

    Ok(Json(expenses.map(|e| ExpenseResponse::new(e, &classifier))))
}

async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<ExpenseInput>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let expense = ExpenseRepository::new((*state.db).clone())
        .create_expense(project_id, input, auth.user_id())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseResponse::new(expense, &classifier(&state))),
    ))
}

async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let expense = ExpenseRepository::new((*state.db).clone())
        .get_expense(project_id, expense_id)
        .await?;

    Ok(Json(ExpenseResponse::new(expense, &classifier(&state))))
}

async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ExpenseInput>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::View).await?;

    let expense = ExpenseRepository::new((*state.db).clone())
        .update_expense(project_id, expense_id, input)
        .await?;

    Ok(Json(ExpenseResponse::new(expense, &classifier(&state))))
}

async fn register_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<ExpenseSettlementResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ApprovePayments).await?;

    let settlement = ExpenseRepository::new((*state.db).clone())
        .settle_expense(project_id, expense_id, &request, auth.user_id())
        .await?;

    Ok(Json(ExpenseSettlementResponse::new(
        settlement,
        &classifier(&state),
    )))
}

async fn settle_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SettleRequest>,
) -> Result<Json<ExpenseSettlementResponse>, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ApprovePayments).await?;

    let settlement = ExpenseRepository::new((*state.db).clone())
        .settle_expense_fully(
            project_id,
            expense_id,
            request.date,
            request.method,
            auth.user_id(),
        )
        .await?;

    Ok(Json(ExpenseSettlementResponse::new(
        settlement,
        &classifier(&state),
    )))
}

async fn retry_rollup(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, expense_id)): Path<(Uuid, Uuid)>,
    Json(rollup): Json<BudgetRollup>,
) -> Result<StatusCode, ApiError> {
    authorize(&state, &auth, project_id, ProjectPermission::ManageFinancials).await?;

    ExpenseRepository::new((*state.db).clone())
        .retry_budget_rollup(project_id, expense_id, rollup)
        .await?;

    info!(
        %project_id,
        %expense_id,
        user_id = %auth.user_id(),
        "Budget rollup retried"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use obra_core::finance::RollupFailureReason;
    use obra_db::entities::sea_orm_active_enums as db;
    use obra_shared::types::BudgetLineId;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn expense() -> expenses::Model {
        let now = Utc::now().into();
        expenses::Model {
            id: Uuid::nil(),
            project_id: Uuid::nil(),
            budget_line_id: Some(Uuid::nil()),
            concept: "Rebar".into(),
            description: String::new(),
            expense_type: db::ExpenseType::Material,
            supplier: "Acme Steel".into(),
            supplier_tax_id: String::new(),
            total_amount: dec!(1000),
            accumulated_amount: dec!(1000),
            rolled_up_amount: dec!(1000),
            issue_date: None,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            settlement_date: NaiveDate::from_ymd_opt(2025, 5, 2),
            state: db::SettlementState::Settled,
            payment_method: Some(db::PaymentMethod::Transfer),
            invoice_number: String::new(),
            purchase_order_number: String::new(),
            bank_account: String::new(),
            vat_withholding: dec!(190),
            income_tax_withholding: dec!(25),
            notes: String::new(),
            created_by: None,
            approved_by: None,
            version: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_settled_expense_is_never_overdue() {
        let classifier = OverdueClassifier::new(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        let json = serde_json::to_value(ExpenseResponse::new(expense(), &classifier)).unwrap();

        assert_eq!(json["net_payable"], json!(dec!(785)));
        assert_eq!(json["pending_amount"], json!(dec!(0)));
        assert_eq!(json["is_overdue"], false);
        assert_eq!(json["days_overdue"], 0);
    }

    #[test]
    fn test_rollup_failure_surfaces_as_warning() {
        let classifier = OverdueClassifier::new(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        let warning = BudgetRollupFailed::new(
            BudgetRollup {
                budget_line_id: BudgetLineId::from_uuid(Uuid::nil()),
                increment: dec!(500),
            },
            RollupFailureReason::LineMissing,
        );
        let response = ExpenseSettlementResponse::new(
            ExpenseSettlement {
                expense: expense(),
                applied: dec!(500),
                previous_state: SettlementState::Partial,
                warning: Some(warning),
            },
            &classifier,
        );
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["warnings"][0]["reason"]["kind"], "line_missing");
        assert_eq!(json["warnings"][0]["increment"], json!(dec!(500)));
        assert_eq!(json["previous_state"], "partial");
    }
}
