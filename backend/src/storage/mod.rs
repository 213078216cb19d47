//! # Storage Module
//!
//! Record store for sections, students and notifications on SQLite via SQLx.
//!
//! Section membership is an ordered table (`section_members`) rather than an
//! embedded id list, and every table is read back in insertion order.

pub mod connection;
pub mod repositories;

pub use connection::DbConnection;
pub use repositories::{NotificationRepository, SectionRepository, StudentRepository};
