//! Destructive demo seed.
//!
//! `reset_and_seed` wipes every section and student (notifications are kept)
//! and regenerates a fixed roster. The HTTP endpoint refuses to run unless the
//! server was started with `ALLOW_SEED=true`.

use rand::Rng;
use shared::{
    roster_display_name, roster_layout, AttendanceStatus, Section, Student, DEFAULT_SECTION_COUNT,
    DEFAULT_STUDENTS_PER_SECTION,
};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::{DbConnection, SectionRepository, StudentRepository};

/// Upper bound on the number of students one seed may create
pub const MAX_SEEDED_STUDENTS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedOptions {
    pub section_count: u32,
    pub students_per_section: u32,
    /// Probability that a generated student starts out present
    pub present_probability: f64,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            section_count: DEFAULT_SECTION_COUNT,
            students_per_section: DEFAULT_STUDENTS_PER_SECTION,
            present_probability: 0.8,
        }
    }
}

impl SeedOptions {
    fn validate(&self) -> Result<(), ApiError> {
        let total = self
            .section_count
            .checked_mul(self.students_per_section)
            .filter(|total| *total <= MAX_SEEDED_STUDENTS);
        if total.is_none() {
            return Err(ApiError::ValidationFailed(format!(
                "Seed size {} × {} exceeds the limit of {} students",
                self.section_count, self.students_per_section, MAX_SEEDED_STUDENTS
            )));
        }
        if !(0.0..=1.0).contains(&self.present_probability) {
            return Err(ApiError::ValidationFailed(format!(
                "present probability {} is outside 0..=1",
                self.present_probability
            )));
        }
        Ok(())
    }
}

/// Outcome of a seed run
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub section_count: u32,
    pub students_per_section: u32,
    pub total_students: u32,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub removed_sections: u64,
    pub removed_students: u64,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Seeded {} sections × {} students each",
            self.section_count, self.students_per_section
        )?;
        if let (Some(first), Some(last)) = (&self.first_id, &self.last_id) {
            write!(f, " ({}–{})", first, last)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SeedService {
    db: DbConnection,
    enabled: bool,
}

impl SeedService {
    pub fn new(db: DbConnection, enabled: bool) -> Self {
        Self { db, enabled }
    }

    /// Delete all sections and students, then regenerate the roster in one transaction
    pub async fn reset_and_seed<R>(&self, options: SeedOptions, rng: &mut R) -> Result<SeedSummary, ApiError>
    where
        R: Rng + Send,
    {
        if !self.enabled {
            warn!("Seed requested while disabled");
            return Err(ApiError::SeedDisabled);
        }
        options.validate()?;

        let layout = roster_layout(options.section_count, options.students_per_section);

        let mut tx = self.db.begin().await?;

        let removed_students = StudentRepository::delete_all(&mut tx).await?;
        let removed_sections = SectionRepository::delete_all(&mut tx).await?;
        info!("Cleared {} sections and {} students", removed_sections, removed_students);

        for planned in &layout {
            let section = Section {
                storage_id: Uuid::new_v4().to_string(),
                name: planned.name.clone(),
                students: Vec::new(),
            };
            SectionRepository::insert_section(&mut tx, &section).await?;

            for business_id in &planned.business_ids {
                let status = if rng.gen_bool(options.present_probability) {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                };
                let student = Student {
                    storage_id: Uuid::new_v4().to_string(),
                    business_id: business_id.clone(),
                    name: roster_display_name(business_id),
                    section: Some(section.storage_id.clone()),
                    status,
                };
                StudentRepository::insert_student(&mut tx, &student)
                    .await
                    .map_err(|e| ApiError::from_insert(e, business_id))?;
                SectionRepository::append_member(&mut tx, &section.storage_id, &student.storage_id).await?;
            }
        }

        tx.commit().await?;

        let mut ids = layout.iter().flat_map(|s| s.business_ids.iter());
        let first_id = ids.next().cloned();
        let last_id = ids.last().cloned().or_else(|| first_id.clone());

        let summary = SeedSummary {
            section_count: options.section_count,
            students_per_section: options.students_per_section,
            total_students: options.section_count * options.students_per_section,
            first_id,
            last_id,
            removed_sections,
            removed_students,
        };
        info!("{}", summary);
        Ok(summary)
    }
}
