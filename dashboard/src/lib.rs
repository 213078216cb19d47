//! # Attendance Dashboard
//!
//! Client library behind the attendance dashboard. `Dashboard` mirrors the
//! server's sections, keeps a simulated per-student history in local storage
//! and produces the rows fed to CSV/PDF export.
//!
//! The simulated history is a visual aid only. The server stores nothing but
//! each student's current status.

pub mod config;
pub mod demo_roster;
pub mod error;
pub mod export;
pub mod history;
pub mod preferences;
pub mod reconciler;
pub mod services;
pub mod storage;
pub mod views;

pub use config::DashboardConfig;
pub use error::DashboardError;
pub use reconciler::{BulkOutcome, Dashboard, ResolvedStudent};
pub use services::api::{ApiClient, AttendanceApi, ClientError};
pub use storage::{FileStore, LocalStore, MemoryStore, StorageError};
