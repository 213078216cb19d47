use shared::{Section, SectionWithStudents};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::HashMap;

use super::student_repository::StudentRepository;
use crate::storage::connection::DbConnection;

/// Repository for sections and their ordered membership lists
#[derive(Clone)]
pub struct SectionRepository {
    db: DbConnection,
}

impl SectionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a section (its membership list is stored separately)
    pub async fn store_section(&self, section: &Section) -> sqlx::Result<()> {
        let mut conn = self.db.pool().acquire().await?;
        Self::insert_section(&mut conn, section).await
    }

    pub(crate) async fn insert_section(conn: &mut SqliteConnection, section: &Section) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO sections (id, name) VALUES (?, ?)")
            .bind(&section.storage_id)
            .bind(&section.name)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Look a section up by storage id, members included
    pub async fn get_section(&self, section_id: &str) -> sqlx::Result<Option<Section>> {
        let mut conn = self.db.pool().acquire().await?;
        Self::find_section(&mut conn, section_id).await
    }

    pub(crate) async fn find_section(conn: &mut SqliteConnection, section_id: &str) -> sqlx::Result<Option<Section>> {
        let row = sqlx::query("SELECT id, name FROM sections WHERE id = ?")
            .bind(section_id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let members = sqlx::query("SELECT student_id FROM section_members WHERE section_id = ? ORDER BY seq ASC")
            .bind(section_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(Some(Section {
            storage_id: row.try_get("id")?,
            name: row.try_get("name")?,
            students: members
                .iter()
                .map(|r| r.try_get("student_id"))
                .collect::<sqlx::Result<Vec<String>>>()?,
        }))
    }

    /// Append a student to the end of a section's membership list
    pub(crate) async fn append_member(conn: &mut SqliteConnection, section_id: &str, student_id: &str) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO section_members (section_id, student_id) VALUES (?, ?)")
            .bind(section_id)
            .bind(student_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// All sections in insertion order, each with its member ids in membership order
    pub async fn list_sections(&self) -> sqlx::Result<Vec<Section>> {
        let sections = sqlx::query("SELECT id, name FROM sections ORDER BY seq ASC")
            .fetch_all(self.db.pool())
            .await?;

        let members = sqlx::query("SELECT section_id, student_id FROM section_members ORDER BY seq ASC")
            .fetch_all(self.db.pool())
            .await?;

        let mut by_section: HashMap<String, Vec<String>> = HashMap::new();
        for row in &members {
            by_section
                .entry(row.try_get("section_id")?)
                .or_default()
                .push(row.try_get("student_id")?);
        }

        sections
            .iter()
            .map(|row| -> sqlx::Result<Section> {
                let storage_id: String = row.try_get("id")?;
                let students = by_section.remove(&storage_id).unwrap_or_default();
                Ok(Section {
                    storage_id,
                    name: row.try_get("name")?,
                    students,
                })
            })
            .collect()
    }

    /// All sections in insertion order with their member students resolved
    pub async fn list_sections_with_students(&self) -> sqlx::Result<Vec<SectionWithStudents>> {
        let sections = sqlx::query("SELECT id, name FROM sections ORDER BY seq ASC")
            .fetch_all(self.db.pool())
            .await?;

        let members = sqlx::query(
            r#"
            SELECT m.section_id AS member_of, s.id, s.business_id, s.name, s.section_id, s.status
            FROM section_members m
            JOIN students s ON s.id = m.student_id
            ORDER BY m.seq ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut by_section: HashMap<String, Vec<SqliteRow>> = HashMap::new();
        for row in members {
            by_section.entry(row.try_get("member_of")?).or_default().push(row);
        }

        sections
            .iter()
            .map(|row| -> sqlx::Result<SectionWithStudents> {
                let storage_id: String = row.try_get("id")?;
                let students = by_section
                    .remove(&storage_id)
                    .unwrap_or_default()
                    .iter()
                    .map(StudentRepository::student_from_row)
                    .collect::<sqlx::Result<Vec<_>>>()?;
                Ok(SectionWithStudents {
                    storage_id,
                    name: row.try_get("name")?,
                    students,
                })
            })
            .collect()
    }

    /// Delete every section; memberships cascade
    pub(crate) async fn delete_all(conn: &mut SqliteConnection) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM sections").execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}
