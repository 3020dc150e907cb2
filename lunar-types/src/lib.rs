//! Core type definitions for Lunar storage.
//!
//! This crate defines the small, dependency-light types every other crate
//! shares:
//! - User and resource identifiers, validated as single path segments
//! - Resource kinds and per-workflow areas used by the path namespace

mod ids;
mod kind;

pub use ids::{MAX_ID_LEN, ResourceId, UserId};
pub use kind::{ResourceKind, WorkflowArea};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid {what} {value:?}: {reason}")]
    InvalidId {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}
