use shared::Notification;
use sqlx::Row;

use crate::storage::connection::DbConnection;

/// Append-only notification log
#[derive(Clone)]
pub struct NotificationRepository {
    db: DbConnection,
}

impl NotificationRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_notification(&self, notification: &Notification) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, student_id, teacher, message, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.storage_id)
        .bind(&notification.student_id)
        .bind(&notification.teacher)
        .bind(&notification.message)
        .bind(notification.date)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Notifications addressed to a student, oldest first
    pub async fn list_for_student(&self, student_id: &str) -> sqlx::Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, teacher, message, created_at
            FROM notifications
            WHERE student_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(student_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| -> sqlx::Result<Notification> {
                Ok(Notification {
                    storage_id: row.try_get("id")?,
                    student_id: row.try_get("student_id")?,
                    teacher: row.try_get("teacher")?,
                    message: row.try_get("message")?,
                    date: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
