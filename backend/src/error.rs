use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::{ErrorResponse, MessageResponse, StatusParseError};
use thiserror::Error;

/// Every failure a mutation or query endpoint can report.
///
/// Only the not-found family gets a distinct status. Everything else is a 500
/// carrying the raw message, which is how the dashboard expects to read it.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Duplicate key: a student with id `{0}` already exists")]
    DuplicateKey(String),

    #[error("`{0}` is required")]
    ValidationMissing(&'static str),

    #[error("{0}")]
    ValidationFailed(String),

    #[error(transparent)]
    InvalidStatus(#[from] StatusParseError),

    #[error("Seeding is disabled; start the server with ALLOW_SEED=true to enable it")]
    SeedDisabled,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationFailed(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl ApiError {
    /// Classify an insert failure, turning unique violations into DuplicateKey
    pub fn from_insert(error: sqlx::Error, business_id: &str) -> Self {
        match &error {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::DuplicateKey(business_id.to_string())
            }
            _ => ApiError::StorageUnavailable(error),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::SectionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SeedDisabled => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(_) | ApiError::SectionNotFound(_) => (
                status,
                Json(MessageResponse {
                    message: self.to_string(),
                }),
            )
                .into_response(),
            ApiError::SeedDisabled => (status, self.to_string()).into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
