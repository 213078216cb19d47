use shared::{AttendanceStatus, Student};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::storage::connection::DbConnection;

/// Repository for student operations
#[derive(Clone)]
pub struct StudentRepository {
    db: DbConnection,
}

impl StudentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Map a row carrying `id, business_id, name, section_id, status` to a Student
    pub(crate) fn student_from_row(row: &SqliteRow) -> sqlx::Result<Student> {
        let status: String = row.try_get("status")?;
        Ok(Student {
            storage_id: row.try_get("id")?,
            business_id: row.try_get("business_id")?,
            name: row.try_get("name")?,
            section: row.try_get("section_id")?,
            status: status
                .parse::<AttendanceStatus>()
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        })
    }

    pub(crate) async fn insert_student(conn: &mut SqliteConnection, student: &Student) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO students (id, business_id, name, section_id, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.storage_id)
        .bind(&student.business_id)
        .bind(&student.name)
        .bind(&student.section)
        .bind(student.status.as_str())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Get a student by business id
    pub async fn get_by_business_id(&self, business_id: &str) -> sqlx::Result<Option<Student>> {
        let row = sqlx::query(
            r#"
            SELECT id, business_id, name, section_id, status
            FROM students
            WHERE business_id = ?
            "#,
        )
        .bind(business_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::student_from_row).transpose()
    }

    /// List every student in insertion order
    pub async fn list_students(&self) -> sqlx::Result<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT id, business_id, name, section_id, status
            FROM students
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::student_from_row).collect()
    }

    /// Overwrite a student's status. Returns false when no student has that business id.
    pub async fn update_status(&self, business_id: &str, status: AttendanceStatus) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE students SET status = ? WHERE business_id = ?")
            .bind(status.as_str())
            .bind(business_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every student; memberships cascade
    pub(crate) async fn delete_all(conn: &mut SqliteConnection) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM students").execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, business_id: &str) -> Student {
        Student {
            storage_id: id.to_string(),
            business_id: business_id.to_string(),
            name: "Zoe".to_string(),
            section: None,
            status: AttendanceStatus::Present,
        }
    }

    async fn store(repo: &StudentRepository, student: &Student) -> sqlx::Result<()> {
        let mut conn = repo.db.pool().acquire().await?;
        StudentRepository::insert_student(&mut conn, student).await
    }

    async fn setup_test() -> StudentRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        StudentRepository::new(db)
    }

    #[tokio::test]
    async fn test_store_and_get_student() {
        let repo = setup_test().await;
        store(&repo, &student("s1", "Z1")).await.expect("Failed to store student");

        let found = repo.get_by_business_id("Z1").await.unwrap().expect("student should exist");
        assert_eq!(found.storage_id, "s1");
        assert_eq!(found.status, AttendanceStatus::Present);
        assert!(found.section.is_none());

        assert!(repo.get_by_business_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_business_id_is_unique_violation() {
        let repo = setup_test().await;
        store(&repo, &student("s1", "Z1")).await.unwrap();

        let err = store(&repo, &student("s2", "Z1")).await.expect_err("duplicate must fail");
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(repo.list_students().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = setup_test().await;
        store(&repo, &student("s1", "Z1")).await.unwrap();

        assert!(repo.update_status("Z1", AttendanceStatus::Absent).await.unwrap());
        assert!(repo.update_status("Z1", AttendanceStatus::Absent).await.unwrap());
        assert!(!repo.update_status("nobody", AttendanceStatus::Absent).await.unwrap());

        let found = repo.get_by_business_id("Z1").await.unwrap().unwrap();
        assert_eq!(found.status, AttendanceStatus::Absent);
    }
}
