//! # REST API for Sections

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::CreateSectionRequest;
use tracing::{error, info};

use super::json_body;
use crate::AppState;

pub async fn create_section(
    State(state): State<AppState>,
    payload: Result<Json<CreateSectionRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match json_body(payload, "POST /api/sections") {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!("POST /api/sections - request: {:?}", request);

    match state.section_service.create_section(request).await {
        Ok(section) => (StatusCode::CREATED, Json(section)).into_response(),
        Err(e) => {
            error!("Failed to create section: {}", e);
            e.into_response()
        }
    }
}

/// Every section with its members. The dashboard's primary read.
pub async fn list_sections(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/sections");

    match state.section_service.list_sections().await {
        Ok(sections) => (StatusCode::OK, Json(sections)).into_response(),
        Err(e) => {
            error!("Failed to list sections: {}", e);
            e.into_response()
        }
    }
}
