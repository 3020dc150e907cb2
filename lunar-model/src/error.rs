//! Error types for entity validation.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while turning a raw payload into a typed entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The discriminator is missing, not a string, or not a known type.
    #[error("unknown datasource type {found}; expected one of {expected}")]
    UnknownType { found: String, expected: String },

    /// The discriminator is known but nothing is registered for it.
    #[error("no schema registered for datasource type {0}")]
    SchemaNotFound(String),

    /// A field is missing, has the wrong shape, or is not declared.
    #[error("invalid value at {field}: expected {expected}")]
    Validation { field: String, expected: String },

    /// An update tried to switch a record to another discriminator.
    #[error("datasource type cannot change from {from} to {to}")]
    DiscriminatorChanged { from: String, to: String },

    /// An update tried to change the record's id.
    #[error("datasource id cannot change from {from} to {to}")]
    IdChanged { from: String, to: String },
}

impl ModelError {
    pub(crate) fn validation(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            expected: expected.into(),
        }
    }
}
