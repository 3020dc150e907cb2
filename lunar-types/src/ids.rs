//! Identifier types used throughout the Lunar core.
//!
//! Both identifiers end up as a single component of a filesystem path, so
//! construction rejects anything that could address a different directory.
//! Leading dots and glob characters are refused as well, so every stored
//! file stays visible to directory listings.
//! Generated resource ids are random UUID v4 strings.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Longest identifier accepted, in bytes. Leaves room for the `.json`
/// extension within the usual 255-byte file name limit.
pub const MAX_ID_LEN: usize = 250;

fn validate_segment(what: &'static str, s: &str) -> Result<()> {
    let reason = if s.is_empty() {
        "must not be empty"
    } else if s.len() > MAX_ID_LEN {
        "is longer than 250 bytes"
    } else if s.starts_with('.') {
        "must not start with a dot"
    } else if s.contains(['/', '\\', '\0']) {
        "must not contain path separators or NUL"
    } else if s.contains(['*', '?', '[', ']']) {
        "must not contain glob characters"
    } else {
        return Ok(());
    };
    Err(Error::InvalidId {
        what,
        value: s.to_string(),
        reason,
    })
}

/// Identifier of a user account. Every stored resource is scoped by one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parses a user ID, rejecting values that are not a single path segment.
    pub fn parse(s: &str) -> Result<Self> {
        validate_segment("user id", s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        validate_segment("user id", &s)?;
        Ok(Self(s))
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of a stored resource (datasource, workflow, llm, ...).
///
/// Unique within one user's namespace for one resource kind, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses a caller-supplied identifier.
    pub fn parse(s: &str) -> Result<Self> {
        validate_segment("resource id", s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        validate_segment("resource id", &s)?;
        Ok(Self(s))
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
