//! Error to HTTP response mapping.
//!
//! Every handler returns `Result<_, ApiError>`. Domain errors carry their own
//! status and code; repository errors are mapped here. Database failures
//! are logged and never echoed to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use obra_core::budget::BudgetError;
use obra_core::cashflow::CashFlowError;
use obra_core::finance::FinanceError;
use obra_core::project::ProjectError as AccessError;
use obra_db::repositories::{
    BudgetLineError, CashFlowRepoError, ExpenseError, IncomeError, ProjectError,
};
use obra_shared::AppError;
use serde_json::{Value, json};
use tracing::error;

/// An error ready to be rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    /// Creates an error with the standard `{ error, message }` body.
    #[must_use]
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": code, "message": message.into() }),
        }
    }

    /// Adds an extra top-level field to the body.
    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.body {
            map.insert(key.to_string(), value);
        }
        self
    }

    /// Logs `source` and returns an opaque 500.
    pub fn internal(source: &dyn std::fmt::Display, context: &str) -> Self {
        error!(error = %source, "{context}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An error occurred",
        )
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the JSON body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        if matches!(e, AppError::Database(_) | AppError::Internal(_)) {
            error!(error = %e, "Request failed");
        }
        Self::new(status(e.status_code()), e.error_code(), e.public_message())
    }
}

impl From<FinanceError> for ApiError {
    fn from(e: FinanceError) -> Self {
        let mut err = Self::new(status(e.status_code()), e.error_code(), e.to_string());
        match &e {
            FinanceError::Validation { errors } => {
                err = err.with("fields", json!(errors));
            }
            FinanceError::StateMismatch { reasons } => {
                err = err.with("reasons", json!(reasons));
            }
            FinanceError::Overpayment { max_allowed } => {
                err = err.with("max_allowed", json!(max_allowed));
            }
            _ => {}
        }
        if let Some(field) = e.field() {
            err = err.with("field", json!(field));
        }
        err
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        let err = Self::new(status(e.status_code()), e.error_code(), e.to_string());
        match e {
            AccessError::Validation(errors) => err.with("fields", json!(errors)),
            AccessError::Forbidden(permission) => err.with("permission", json!(permission)),
            AccessError::NotMember => Self::new(
                StatusCode::NOT_FOUND,
                "not_found",
                "Project not found",
            ),
        }
    }
}

impl From<BudgetError> for ApiError {
    fn from(e: BudgetError) -> Self {
        Self::new(status(e.status_code()), e.error_code(), e.to_string())
    }
}

impl From<CashFlowError> for ApiError {
    fn from(e: CashFlowError) -> Self {
        Self::new(status(e.status_code()), e.error_code(), e.to_string())
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", "Project not found")
            }
            ProjectError::DuplicateCode(code) => Self::new(
                StatusCode::CONFLICT,
                "duplicate_code",
                format!("A project with code {code} already exists"),
            )
            .with("field", json!("code")),
            ProjectError::Database(e) => Self::internal(&e, "Project query failed"),
        }
    }
}

fn version_conflict(current: i64) -> ApiError {
    ApiError::new(
        StatusCode::CONFLICT,
        "version_conflict",
        "The record was modified by another request; reload it and try again",
    )
    .with("current_version", json!(current))
}

impl From<IncomeError> for ApiError {
    fn from(e: IncomeError) -> Self {
        match e {
            IncomeError::NotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Income not found: {id}"),
            ),
            IncomeError::VersionConflict { current } => version_conflict(current),
            IncomeError::Finance(e) => e.into(),
            IncomeError::Database(e) => Self::internal(&e, "Income query failed"),
        }
    }
}

impl From<ExpenseError> for ApiError {
    fn from(e: ExpenseError) -> Self {
        match e {
            ExpenseError::NotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Expense not found: {id}"),
            ),
            ExpenseError::BudgetLineNotFound(id) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "budget_line_not_found",
                format!("Budget line not found in this project: {id}"),
            )
            .with("field", json!("budget_line_id")),
            ExpenseError::IncrementExceedsPaid { max_allowed } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "increment_exceeds_paid",
                format!("At most {max_allowed} can be charged to the budget line"),
            )
            .with("max_allowed", json!(max_allowed)),
            ExpenseError::VersionConflict { current } => version_conflict(current),
            ExpenseError::Finance(e) => e.into(),
            ExpenseError::Budget(e) => e.into(),
            ExpenseError::Database(e) => Self::internal(&e, "Expense query failed"),
        }
    }
}

impl From<BudgetLineError> for ApiError {
    fn from(e: BudgetLineError) -> Self {
        match e {
            BudgetLineError::NotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Budget line not found: {id}"),
            ),
            BudgetLineError::Database(e) => Self::internal(&e, "Budget line query failed"),
        }
    }
}

impl From<CashFlowRepoError> for ApiError {
    fn from(e: CashFlowRepoError) -> Self {
        match e {
            CashFlowRepoError::Database(e) => Self::internal(&e, "Cash-flow query failed"),
        }
    }
}
