//! API route definitions.

use axum::{Router, middleware};
use chrono::NaiveDate;
use obra_core::finance::{OverdueClassifier, PaymentMethod};
use obra_core::project::{Membership, ProjectPermission};
use obra_db::ProjectRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
};

pub mod budget_lines;
pub mod cash_flow;
pub mod expenses;
pub mod health;
pub mod incomes;
pub mod projects;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(projects::routes())
        .merge(incomes::routes())
        .merge(expenses::routes())
        .merge(budget_lines::routes())
        .merge(cash_flow::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Resolves the caller's membership and checks `permission`.
pub(crate) async fn authorize(
    state: &AppState,
    auth: &AuthUser,
    project_id: Uuid,
    permission: ProjectPermission,
) -> Result<Membership, ApiError> {
    let membership = ProjectRepository::new((*state.db).clone())
        .membership(project_id, auth.user_id(), auth.is_staff())
        .await?;
    membership.authorize(permission)?;
    Ok(membership)
}

/// Classifier for the current request; "today" is read once here.
pub(crate) fn classifier(state: &AppState) -> OverdueClassifier {
    OverdueClassifier::new(state.business.today())
}

/// Body for settling the whole outstanding balance.
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    /// Settlement date.
    pub date: NaiveDate,
    /// Payment channel; falls back to the record's current one.
    #[serde(default)]
    pub method: Option<PaymentMethod>,
}
