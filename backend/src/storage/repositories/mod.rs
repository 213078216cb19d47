//! SQLite repositories, one per collection.
//!
//! Pool-level methods serve single-statement operations. The `pub(crate)`
//! associated functions take a `&mut SqliteConnection` so domain services can
//! compose several of them inside one transaction.

pub mod notification_repository;
pub mod section_repository;
pub mod student_repository;

pub use notification_repository::NotificationRepository;
pub use section_repository::SectionRepository;
pub use student_repository::StudentRepository;
