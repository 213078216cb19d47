//! # REST API for Notifications

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::CreateNotificationRequest;
use tracing::{error, info};

use super::json_body;
use crate::AppState;

pub async fn create_notification(
    State(state): State<AppState>,
    payload: Result<Json<CreateNotificationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match json_body(payload, "POST /api/notifications") {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("POST /api/notifications - request: {:?}", request);

    match state.notification_service.create_notification(request).await {
        Ok(notification) => (StatusCode::CREATED, Json(notification)).into_response(),
        Err(e) => {
            error!("Failed to create notification: {}", e);
            e.into_response()
        }
    }
}

/// Notifications for one student, oldest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/notifications/{}", student_id);

    match state.notification_service.list_for_student(&student_id).await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => {
            error!("Failed to list notifications for {}: {}", student_id, e);
            e.into_response()
        }
    }
}
