//! # Attendance Backend
//!
//! REST service over the section, student and notification records. The
//! layering is storage (sqlx repositories) → domain (services) → io (axum
//! handlers); `create_router` wires the handlers to their routes.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod storage;

pub use config::Config;
pub use error::ApiError;

use domain::{NotificationService, SectionService, SeedService, StudentService};
use storage::DbConnection;

/// Services shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
    pub section_service: SectionService,
    pub notification_service: NotificationService,
    pub seed_service: SeedService,
}

impl AppState {
    pub fn new(db: DbConnection, config: &Config) -> Self {
        Self {
            student_service: StudentService::new(db.clone(), config.strict_section_membership),
            section_service: SectionService::new(db.clone()),
            notification_service: NotificationService::new(db.clone()),
            seed_service: SeedService::new(db, config.allow_seed),
        }
    }
}

/// Connect to the database and build every service
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Connecting to database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url).await?;

    if config.allow_seed {
        info!("GET /api/seed is enabled");
    }

    Ok(AppState::new(db, config))
}

pub fn create_router(app_state: AppState) -> Router {
    // Any origin may call the API
    let cors = CorsLayer::permissive();

    let api_routes = Router::new()
        .route("/students", get(io::list_students).post(io::create_student))
        .route("/attendance/mark", post(io::mark_attendance))
        .route("/attendance/summary/:student_id", get(io::get_attendance_summary))
        .route("/notifications", post(io::create_notification))
        .route("/notifications/:student_id", get(io::list_notifications))
        .route("/sections", get(io::list_sections).post(io::create_section))
        .route("/seed", get(io::reset_and_seed));

    Router::new()
        .route("/", get(io::rest::liveness))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
