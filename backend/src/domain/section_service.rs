use shared::{CreateSectionRequest, Section, SectionWithStudents};
use tracing::info;
use uuid::Uuid;

use super::required;
use crate::error::ApiError;
use crate::storage::{DbConnection, SectionRepository};

#[derive(Clone)]
pub struct SectionService {
    sections: SectionRepository,
}

impl SectionService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            sections: SectionRepository::new(db),
        }
    }

    /// Create an empty section
    pub async fn create_section(&self, request: CreateSectionRequest) -> Result<Section, ApiError> {
        let name = required(request.name, "name")?;

        let section = Section {
            storage_id: Uuid::new_v4().to_string(),
            name,
            students: Vec::new(),
        };
        self.sections.store_section(&section).await?;

        info!("Created section {} with storage id {}", section.name, section.storage_id);
        Ok(section)
    }

    /// Every section with its members, in insertion order
    pub async fn list_sections(&self) -> Result<Vec<SectionWithStudents>, ApiError> {
        let sections = self.sections.list_sections_with_students().await?;
        info!("Listing {} sections", sections.len());
        Ok(sections)
    }
}
