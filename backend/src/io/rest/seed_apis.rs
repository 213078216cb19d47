//! # REST API for the demo seed
//!
//! GET /api/seed wipes all sections and students. It only runs when the server
//! was started with `ALLOW_SEED=true`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::SeedOptions;
use crate::AppState;

/// Optional overrides for the roster size
#[derive(Debug, Deserialize)]
pub struct SeedQuery {
    pub sections: Option<u32>,
    pub per_section: Option<u32>,
}

pub async fn reset_and_seed(
    State(state): State<AppState>,
    Query(query): Query<SeedQuery>,
) -> impl IntoResponse {
    info!("GET /api/seed - query: {:?}", query);

    let defaults = SeedOptions::default();
    let options = SeedOptions {
        section_count: query.sections.unwrap_or(defaults.section_count),
        students_per_section: query.per_section.unwrap_or(defaults.students_per_section),
        ..defaults
    };

    let mut rng = StdRng::from_entropy();
    match state.seed_service.reset_and_seed(options, &mut rng).await {
        Ok(summary) => (StatusCode::OK, summary.to_string()).into_response(),
        Err(e) => {
            error!("Seed failed: {}", e);
            e.into_response()
        }
    }
}
