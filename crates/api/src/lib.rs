//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for projects and their finances
//! - Authentication middleware
//! - Error to response mapping
//! - Response types with derived figures

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use obra_shared::JwtService;
use obra_shared::config::BusinessConfig;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Business calendar used for overdue checks.
    pub business: BusinessConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
