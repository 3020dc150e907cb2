//! Typed connection attributes, one struct per datasource type.

use crate::datasource::DataSourceType;
use crate::error::{ModelError, ModelResult};
use crate::schema::{AttributeField, AttributeSchema, FieldType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Attributes of a `LOCAL_FILE` datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFileAttributes {
    file_name: String,
    file_type: String,
}

impl LocalFileAttributes {
    pub fn new(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let file_type = Path::new(&file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            file_name,
            file_type,
        }
    }

    pub fn schema() -> AttributeSchema {
        AttributeSchema::new(vec![
            AttributeField::required("file_name", FieldType::Text),
            // Derived from file_name; tolerated on input so stored documents validate.
            AttributeField::optional("file_type", FieldType::Text),
        ])
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Lower-cased extension of the file name, empty when there is none.
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    /// Location of the file below a user's file root. Nothing is checked here;
    /// existence is verified when the datasource is used as component input.
    pub fn path_in(&self, file_root: &Path) -> PathBuf {
        file_root.join(&self.file_name)
    }

    fn from_checked(prefix: &str, map: &Map<String, Value>) -> ModelResult<Self> {
        let file_name = text(map, "file_name").unwrap_or_default();
        let is_single_segment = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == std::ffi::OsStr::new(file_name));
        if !is_single_segment {
            return Err(ModelError::validation(
                format!("{prefix}.file_name"),
                "a plain file name without directories",
            ));
        }
        Ok(Self::new(file_name))
    }
}

/// Attributes of a `POSTGRESQL` datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlAttributes {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl PostgresqlAttributes {
    pub fn schema() -> AttributeSchema {
        AttributeSchema::new(vec![
            AttributeField::required("host", FieldType::Text),
            AttributeField::optional("port", FieldType::Integer),
            AttributeField::required("database", FieldType::Text),
            AttributeField::required("user", FieldType::Text),
            AttributeField::required("password", FieldType::Text),
        ])
    }

    fn from_checked(prefix: &str, map: &Map<String, Value>) -> ModelResult<Self> {
        let port = match map.get("port") {
            None => DEFAULT_POSTGRES_PORT,
            Some(value) => value
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .filter(|p| *p != 0)
                .ok_or_else(|| {
                    ModelError::validation(format!("{prefix}.port"), "integer between 1 and 65535")
                })?,
        };
        Ok(Self {
            host: text(map, "host").unwrap_or_default().to_string(),
            port,
            database: text(map, "database").unwrap_or_default().to_string(),
            user: text(map, "user").unwrap_or_default().to_string(),
            password: text(map, "password").unwrap_or_default().to_string(),
        })
    }
}

fn text<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// The attributes owned by a datasource. The variant always matches the
/// datasource's discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConnectionAttributes {
    LocalFile(LocalFileAttributes),
    Postgresql(PostgresqlAttributes),
}

impl ConnectionAttributes {
    pub fn data_source_type(&self) -> DataSourceType {
        match self {
            ConnectionAttributes::LocalFile(_) => DataSourceType::LocalFile,
            ConnectionAttributes::Postgresql(_) => DataSourceType::Postgresql,
        }
    }

    /// Serializes with lowerCamelCase field names.
    pub fn to_value(&self) -> Value {
        match self {
            ConnectionAttributes::LocalFile(a) => serde_json::json!({
                "fileName": a.file_name,
                "fileType": a.file_type,
            }),
            ConnectionAttributes::Postgresql(a) => serde_json::json!({
                "host": a.host,
                "port": a.port,
                "database": a.database,
                "user": a.user,
                "password": a.password,
            }),
        }
    }
}

/// Builds typed attributes from a map already checked by the type's schema.
pub type AttributeBuilder = fn(&str, &Map<String, Value>) -> ModelResult<ConnectionAttributes>;

pub(crate) fn build_local_file(prefix: &str, map: &Map<String, Value>) -> ModelResult<ConnectionAttributes> {
    LocalFileAttributes::from_checked(prefix, map).map(ConnectionAttributes::LocalFile)
}

pub(crate) fn build_postgresql(prefix: &str, map: &Map<String, Value>) -> ModelResult<ConnectionAttributes> {
    PostgresqlAttributes::from_checked(prefix, map).map(ConnectionAttributes::Postgresql)
}

/// What a component receives when a `LOCAL_FILE` datasource is wired in as
/// its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInput {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: u64,
    pub path: PathBuf,
}
