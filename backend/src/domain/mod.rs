//! # Domain Module
//!
//! Business rules for the attendance tracker: student creation with section
//! bookkeeping, attendance marking, notifications and the demo seed.
//!
//! Services own their repositories and are cheap to clone into request state.

pub mod notification_service;
pub mod section_service;
pub mod seed_service;
pub mod student_service;

pub use notification_service::NotificationService;
pub use section_service::SectionService;
pub use seed_service::{SeedOptions, SeedService, SeedSummary};
pub use student_service::StudentService;

use crate::error::ApiError;

/// Unwrap a required request field, rejecting absent or blank values
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::ValidationMissing(field))
}
