//! Error types for the entity services.

use lunar_model::ModelError;
use lunar_storage::StorageError;
use lunar_types::{ResourceId, ResourceKind};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The payload failed validation.
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored document no longer validates, e.g. after an external edit.
    #[error("stored document {} is invalid: {source}", .path.display())]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: ResourceKind, id: ResourceId },

    #[error("{operation} is not supported for datasource type {data_source_type}")]
    Unsupported {
        operation: &'static str,
        data_source_type: String,
    },

    /// A file a datasource refers to is missing.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

/// Coarse classification for translating errors at an outer boundary
/// (HTTP status, CLI exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Corrupt,
    Storage,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Corrupt => "corrupt data",
            ErrorKind::Storage => "storage failure",
            ErrorKind::Internal => "internal error",
        })
    }
}

impl From<&StorageError> for ErrorKind {
    fn from(e: &StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::InvalidPath { .. } => ErrorKind::InvalidInput,
            StorageError::CorruptDocument { .. } => ErrorKind::Corrupt,
            StorageError::Write { .. } | StorageError::Io(_) => ErrorKind::Storage,
            StorageError::Serialization(_) | StorageError::Config(_) => ErrorKind::Internal,
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Model(ModelError::SchemaNotFound(_)) => ErrorKind::Internal,
            ServiceError::Model(_) => ErrorKind::InvalidInput,
            ServiceError::Storage(e) => ErrorKind::from(e),
            ServiceError::InvalidDocument { .. } => ErrorKind::Corrupt,
            ServiceError::AlreadyExists { .. } => ErrorKind::Conflict,
            ServiceError::Unsupported { .. } => ErrorKind::InvalidInput,
            ServiceError::FileNotFound(_) => ErrorKind::NotFound,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
