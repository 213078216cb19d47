//! # REST API Interface Layer
//!
//! One module per resource. Every handler logs `METHOD /path` on entry and
//! logs failures before converting them with `ApiError::into_response`.

pub mod attendance_apis;
pub mod notification_apis;
pub mod seed_apis;
pub mod section_apis;
pub mod student_apis;

pub use attendance_apis::*;
pub use notification_apis::*;
pub use seed_apis::*;
pub use section_apis::*;
pub use student_apis::*;

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::error::ApiError;

/// Unwrap a JSON body, answering malformed bodies as `ApiError::ValidationFailed`
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>, route: &str) -> Result<T, Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            error!("{} - rejected body: {}", route, rejection.body_text());
            Err(ApiError::from(rejection).into_response())
        }
    }
}

/// GET / liveness check
pub async fn liveness() -> &'static str {
    "Attendance backend is running"
}
