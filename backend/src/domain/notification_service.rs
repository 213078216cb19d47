use chrono::Utc;
use shared::{CreateNotificationRequest, Notification};
use tracing::info;
use uuid::Uuid;

use super::required;
use crate::error::ApiError;
use crate::storage::{DbConnection, NotificationRepository};

/// Teacher name recorded when a notification arrives without one
const UNKNOWN_TEACHER: &str = "Unknown";

#[derive(Clone)]
pub struct NotificationService {
    notifications: NotificationRepository,
}

impl NotificationService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            notifications: NotificationRepository::new(db),
        }
    }

    /// Append a notification. The student id is not checked against the roster.
    pub async fn create_notification(&self, request: CreateNotificationRequest) -> Result<Notification, ApiError> {
        let student_id = required(request.student_id, "studentId")?;
        let message = required(request.message, "message")?;
        let teacher = required(request.teacher, "teacher").unwrap_or_else(|_| UNKNOWN_TEACHER.to_string());

        let notification = Notification {
            storage_id: Uuid::new_v4().to_string(),
            student_id,
            teacher,
            message,
            date: Utc::now(),
        };
        self.notifications.store_notification(&notification).await?;

        info!("Notification {} from {} to {}", notification.storage_id, notification.teacher, notification.student_id);
        Ok(notification)
    }

    /// Notifications for a student, oldest first
    pub async fn list_for_student(&self, student_id: &str) -> Result<Vec<Notification>, ApiError> {
        Ok(self.notifications.list_for_student(student_id).await?)
    }
}
