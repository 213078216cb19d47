use shared::{
    AttendanceStatus, CreateStudentRequest, MarkAttendanceRequest, MessageResponse, Section,
    Student, StudentWithSection,
};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::required;
use crate::error::ApiError;
use crate::storage::{DbConnection, SectionRepository, StudentRepository};

/// Student creation, lookup and attendance marking
#[derive(Clone)]
pub struct StudentService {
    db: DbConnection,
    students: StudentRepository,
    sections: SectionRepository,
    strict_section_membership: bool,
}

impl StudentService {
    pub fn new(db: DbConnection, strict_section_membership: bool) -> Self {
        Self {
            students: StudentRepository::new(db.clone()),
            sections: SectionRepository::new(db.clone()),
            db,
            strict_section_membership,
        }
    }

    /// Create a student and, when the section resolves, append it to that section.
    ///
    /// Both writes happen in one transaction, so a section never lists a student
    /// that failed to insert. An unresolved section is skipped with a warning
    /// unless strict membership is enabled.
    pub async fn create_student(&self, request: CreateStudentRequest) -> Result<Student, ApiError> {
        let business_id = required(request.id, "id")?;
        let name = required(request.name, "name")?;
        let section_id = request
            .section_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        info!("Creating student {} ({}) in section {:?}", business_id, name, section_id);

        let student = Student {
            storage_id: Uuid::new_v4().to_string(),
            business_id,
            name,
            section: section_id.clone(),
            status: AttendanceStatus::default(),
        };

        let mut tx = self.db.begin().await?;

        StudentRepository::insert_student(&mut tx, &student)
            .await
            .map_err(|e| ApiError::from_insert(e, &student.business_id))?;

        if let Some(section_id) = &section_id {
            match SectionRepository::find_section(&mut tx, section_id).await? {
                Some(_) => {
                    SectionRepository::append_member(&mut tx, section_id, &student.storage_id).await?;
                }
                None if self.strict_section_membership => {
                    tx.rollback().await?;
                    return Err(ApiError::SectionNotFound(section_id.clone()));
                }
                None => {
                    warn!(
                        "Section {} not found; student {} created without membership",
                        section_id, student.business_id
                    );
                }
            }
        }

        tx.commit().await?;

        info!("Created student {} with storage id {}", student.business_id, student.storage_id);
        Ok(student)
    }

    /// Overwrite a student's current status. Marking the same status twice is a no-op in effect.
    pub async fn mark_attendance(&self, request: MarkAttendanceRequest) -> Result<MessageResponse, ApiError> {
        let business_id = required(request.student_id, "studentId")?;
        let status: AttendanceStatus = required(request.status, "status")?.parse()?;

        info!("Marking {} as {}", business_id, status);

        if !self.students.update_status(&business_id, status).await? {
            warn!("Cannot mark attendance, student not found: {}", business_id);
            return Err(ApiError::NotFound("Student"));
        }

        Ok(MessageResponse {
            message: "Attendance updated successfully".to_string(),
        })
    }

    /// Current record for one student
    pub async fn get_summary(&self, business_id: &str) -> Result<Student, ApiError> {
        self.students
            .get_by_business_id(business_id)
            .await?
            .ok_or(ApiError::NotFound("Student"))
    }

    /// Every student with its section resolved. Dangling section references resolve to None.
    pub async fn list_students(&self) -> Result<Vec<StudentWithSection>, ApiError> {
        let students = self.students.list_students().await?;
        let sections: HashMap<String, Section> = self
            .sections
            .list_sections()
            .await?
            .into_iter()
            .map(|s| (s.storage_id.clone(), s))
            .collect();

        info!("Listing {} students", students.len());

        Ok(students
            .into_iter()
            .map(|student| StudentWithSection {
                section: student.section.as_ref().and_then(|id| sections.get(id).cloned()),
                storage_id: student.storage_id,
                business_id: student.business_id,
                name: student.name,
                status: student.status,
            })
            .collect())
    }
}
