//! # REST API for Students

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::CreateStudentRequest;
use tracing::{error, info};

use super::json_body;
use crate::AppState;

/// List every student joined with its section
pub async fn list_students(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/students");

    match state.student_service.list_students().await {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(e) => {
            error!("Failed to list students: {}", e);
            e.into_response()
        }
    }
}

/// Create a student and link it to its section when the section exists
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<CreateStudentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match json_body(payload, "POST /api/students") {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("POST /api/students - request: {:?}", request);

    match state.student_service.create_student(request).await {
        Ok(student) => (StatusCode::CREATED, Json(student)).into_response(),
        Err(e) => {
            error!("Failed to create student: {}", e);
            e.into_response()
        }
    }
}
