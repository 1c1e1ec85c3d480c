//! Project error types.

use thiserror::Error;

use super::access::ProjectPermission;
use crate::finance::FieldError;

/// Project-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectError {
    /// Caller has no active assignment in the project.
    #[error("You are not a member of this project")]
    NotMember,

    /// Caller is a member but lacks the permission.
    #[error("Missing project permission: {}", .0.as_str())]
    Forbidden(ProjectPermission),

    /// Field-level input errors.
    #[error("Invalid project input: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),
}

impl ProjectError {
    /// Returns the HTTP status code for this error.
    ///
    /// Non-members get 404 so project existence is not leaked.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotMember => 404,
            Self::Forbidden(_) => 403,
            Self::Validation(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotMember => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_error",
        }
    }
}
