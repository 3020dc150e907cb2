use crate::attributes::{ConnectionAttributes, LocalFileAttributes, PostgresqlAttributes};
use lunar_types::ResourceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Discriminator selecting which attribute schema governs a datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceType {
    LocalFile,
    Postgresql,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 2] = [DataSourceType::LocalFile, DataSourceType::Postgresql];

    /// Wire name, e.g. `LOCAL_FILE`.
    pub const fn as_str(self) -> &'static str {
        match self {
            DataSourceType::LocalFile => "LOCAL_FILE",
            DataSourceType::Postgresql => "POSTGRESQL",
        }
    }

    /// Parses a discriminator, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated datasource record.
///
/// Only [`TypeRegistry`](crate::TypeRegistry) constructs these, so a value in
/// hand always satisfies its schema. Fields are read-only; changes go through
/// [`TypeRegistry::revalidate`](crate::TypeRegistry::revalidate), which
/// rebuilds the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    id: ResourceId,
    name: String,
    description: String,
    attributes: ConnectionAttributes,
}

impl DataSource {
    pub(crate) fn new(
        id: ResourceId,
        name: String,
        description: String,
        attributes: ConnectionAttributes,
    ) -> Self {
        Self {
            id,
            name,
            description,
            attributes,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The discriminator. Always agrees with the attributes variant.
    pub fn data_source_type(&self) -> DataSourceType {
        self.attributes.data_source_type()
    }

    pub fn attributes(&self) -> &ConnectionAttributes {
        &self.attributes
    }

    pub fn as_local_file(&self) -> Option<&LocalFileAttributes> {
        match &self.attributes {
            ConnectionAttributes::LocalFile(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_postgresql(&self) -> Option<&PostgresqlAttributes> {
        match &self.attributes {
            ConnectionAttributes::Postgresql(a) => Some(a),
            _ => None,
        }
    }

    /// The canonical stored JSON shape.
    pub fn to_document(&self) -> Value {
        Value::Object(self.to_document_map())
    }

    pub(crate) fn to_document_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("id".into(), self.id.as_str().into());
        map.insert("name".into(), self.name.clone().into());
        map.insert("description".into(), self.description.clone().into());
        map.insert("type".into(), self.data_source_type().as_str().into());
        map.insert("connectionAttributes".into(), self.attributes.to_value());
        map
    }
}
