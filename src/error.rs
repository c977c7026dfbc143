use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::booking_validation::Violation;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("Validation failed with {} violation(s).", .0.len())]
    Validation(Vec<Violation>),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Dependency(String),
    /// A multi-step write stopped halfway; the committed part was not rolled back.
    #[error("{0}")]
    Inconsistent(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::Unavailable(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) | Self::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Dependency(_) => StatusCode::BAD_GATEWAY,
            Self::Inconsistent(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::UnprocessableEntity(_) => "unprocessable_entity",
            Self::Validation(_) => "validation_failed",
            Self::Unavailable(_) => "slot_unavailable",
            Self::Dependency(_) => "upstream_failed",
            Self::Inconsistent(_) => "checkout_inconsistent",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let body = match &self {
            Self::Validation(violations) => json!({
                "detail": self.to_string(),
                "code": self.code(),
                "violations": violations,
            }),
            _ => json!({
                "detail": self.to_string(),
                "code": self.code(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
