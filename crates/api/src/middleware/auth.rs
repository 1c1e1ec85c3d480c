//! Authentication middleware for protected routes.
//!
//! Tokens are issued by the identity provider; this service only checks
//! them and trusts the identity they carry.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use obra_shared::{AppError, Claims, JwtError};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "missing_token",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => {
            ApiError::new(StatusCode::UNAUTHORIZED, "token_expired", "Token has expired")
                .into_response()
        }
        Err(_) => ApiError::new(
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Invalid or malformed token",
        )
        .into_response(),
    }
}

/// Extractor for authenticated user claims.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.0.user_id()
    }

    /// Returns true for platform staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.0.is_staff()
    }

    /// Returns the inner claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()).into())
    }
}
