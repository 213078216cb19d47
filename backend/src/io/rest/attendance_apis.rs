//! # REST API for Attendance

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::MarkAttendanceRequest;
use tracing::{error, info};

use super::json_body;
use crate::AppState;

/// Overwrite a student's current status
pub async fn mark_attendance(
    State(state): State<AppState>,
    payload: Result<Json<MarkAttendanceRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match json_body(payload, "POST /api/attendance/mark") {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("POST /api/attendance/mark - request: {:?}", request);

    match state.student_service.mark_attendance(request).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(e) => {
            error!("Failed to mark attendance: {}", e);
            e.into_response()
        }
    }
}

/// Current record for one student
pub async fn get_attendance_summary(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/attendance/summary/{}", student_id);

    match state.student_service.get_summary(&student_id).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => {
            error!("Failed to get attendance summary for {}: {}", student_id, e);
            e.into_response()
        }
    }
}
