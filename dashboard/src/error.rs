use thiserror::Error;

use crate::export::ExportError;
use crate::services::api::ClientError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Fill all fields")]
    MissingFields,

    #[error("Invalid Student ID `{0}`")]
    UnknownStudent(String),

    #[error("Enter both username & password")]
    MissingCredentials,

    #[error("Section not found: {0}")]
    UnknownSection(String),
}
