//! Discriminator-driven dispatch from raw JSON to typed datasources.
//!
//! The set of types is fixed at build time by [`DataSourceType`]; the
//! registry decides which of them are accepted and which schema each uses.
//! A new type is added by extending the enum and registering a descriptor.

use crate::attributes::{
    AttributeBuilder, LocalFileAttributes, PostgresqlAttributes, build_local_file, build_postgresql,
};
use crate::datasource::{DataSource, DataSourceType};
use crate::error::{ModelError, ModelResult};
use crate::handler::EntityHandler;
use crate::schema::{AttributeSchema, to_camel_case};
use lunar_types::{ResourceId, ResourceKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, error};

pub const TYPE_FIELD: &str = "type";
pub const ATTRIBUTES_FIELD: &str = "connectionAttributes";
const ATTRIBUTES_FIELD_SNAKE: &str = "connection_attributes";

/// Everything the registry needs to validate and build one datasource type.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub schema: AttributeSchema,
    pub default_name: String,
    pub default_description: String,
    build: AttributeBuilder,
}

impl SchemaDescriptor {
    pub fn new(
        schema: AttributeSchema,
        default_name: impl Into<String>,
        default_description: impl Into<String>,
        build: AttributeBuilder,
    ) -> Self {
        Self {
            schema,
            default_name: default_name.into(),
            default_description: default_description.into(),
            build,
        }
    }

    pub fn local_file() -> Self {
        Self::new(
            LocalFileAttributes::schema(),
            "Local file datasource",
            "Local file datasource - allows read and write operations on local files.",
            build_local_file,
        )
    }

    pub fn postgresql() -> Self {
        Self::new(
            PostgresqlAttributes::schema(),
            "Postgresql datasource",
            "Postgresql or SQLite datasource - allows read and write operations on a Postgresql or a local SQLite database.",
            build_postgresql,
        )
    }
}

/// Maps each accepted discriminator to its schema. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    schemas: BTreeMap<DataSourceType, SchemaDescriptor>,
}

impl TypeRegistry {
    /// An empty registry. Every payload fails with `SchemaNotFound` until
    /// types are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in type.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DataSourceType::LocalFile, SchemaDescriptor::local_file());
        registry.register(DataSourceType::Postgresql, SchemaDescriptor::postgresql());
        registry
    }

    /// Registers (or replaces) the descriptor for a type.
    pub fn register(&mut self, data_source_type: DataSourceType, descriptor: SchemaDescriptor) {
        self.schemas.insert(data_source_type, descriptor);
    }

    pub fn descriptor(&self, data_source_type: DataSourceType) -> Option<&SchemaDescriptor> {
        self.schemas.get(&data_source_type)
    }

    pub fn registered(&self) -> impl Iterator<Item = DataSourceType> + '_ {
        self.schemas.keys().copied()
    }

    /// Validates a raw payload and builds the datasource.
    ///
    /// A missing `id` is generated, but only once everything else is valid.
    pub fn validate(&self, raw: &Value) -> ModelResult<DataSource> {
        let Some(object) = raw.as_object() else {
            return Err(ModelError::validation("$", "a JSON object"));
        };

        let data_source_type = self.discriminator(object)?;
        let Some(descriptor) = self.schemas.get(&data_source_type) else {
            error!(data_source_type = %data_source_type, "known datasource type has no registered schema");
            return Err(ModelError::SchemaNotFound(data_source_type.to_string()));
        };

        let attributes_value = match (object.get(ATTRIBUTES_FIELD), object.get(ATTRIBUTES_FIELD_SNAKE)) {
            (Some(_), Some(_)) => {
                return Err(ModelError::validation(
                    ATTRIBUTES_FIELD,
                    "only one of connectionAttributes and connection_attributes",
                ));
            }
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        };
        let empty = Map::new();
        let attributes = match attributes_value {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(ModelError::validation(ATTRIBUTES_FIELD, "an object")),
        };
        let checked = descriptor.schema.check(ATTRIBUTES_FIELD, attributes)?;
        let attributes = (descriptor.build)(ATTRIBUTES_FIELD, &checked)?;

        let mut id = None;
        let mut name = None;
        let mut description = None;
        for (key, value) in object {
            match key.as_str() {
                TYPE_FIELD | ATTRIBUTES_FIELD | ATTRIBUTES_FIELD_SNAKE => {}
                "id" => id = optional_text(key, value)?,
                "name" => name = optional_text(key, value)?,
                "description" => description = optional_text(key, value)?,
                _ => return Err(ModelError::validation(key.as_str(), "no such field on a datasource")),
            }
        }

        let id = match id {
            Some(raw_id) => ResourceId::parse(raw_id)
                .map_err(|_| ModelError::validation("id", "a single path segment identifier"))?,
            None => ResourceId::generate(),
        };

        debug!(id = %id, data_source_type = %data_source_type, "datasource validated");
        Ok(DataSource::new(
            id,
            name.map_or_else(|| descriptor.default_name.clone(), str::to_string),
            description.map_or_else(|| descriptor.default_description.clone(), str::to_string),
            attributes,
        ))
    }

    /// Applies a partial update to an existing datasource and validates the
    /// complete result.
    ///
    /// The discriminator and id cannot change this way; building a record of
    /// another type means creating a new one.
    pub fn revalidate(&self, existing: &DataSource, patch: &Value) -> ModelResult<DataSource> {
        let Some(patch) = patch.as_object() else {
            return Err(ModelError::validation("$", "a JSON object"));
        };

        if let Some(new_type) = patch.get(TYPE_FIELD).filter(|v| !v.is_null()) {
            let current = existing.data_source_type();
            let same = new_type
                .as_str()
                .and_then(DataSourceType::parse)
                .is_some_and(|t| t == current);
            if !same {
                return Err(ModelError::DiscriminatorChanged {
                    from: current.to_string(),
                    to: render(new_type),
                });
            }
        }
        if let Some(new_id) = patch.get("id").filter(|v| !v.is_null()) {
            if new_id.as_str() != Some(existing.id().as_str()) {
                return Err(ModelError::IdChanged {
                    from: existing.id().to_string(),
                    to: render(new_id),
                });
            }
        }

        let mut merged = existing.to_document_map();
        for (key, value) in patch {
            let key = to_camel_case(key);
            if key == TYPE_FIELD || key == "id" {
                continue;
            }
            if key == ATTRIBUTES_FIELD {
                merge_attributes(&mut merged, value)?;
            } else if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value.clone());
            }
        }

        self.validate(&Value::Object(merged))
    }

    fn discriminator(&self, object: &Map<String, Value>) -> ModelResult<DataSourceType> {
        let found = object.get(TYPE_FIELD);
        found
            .and_then(Value::as_str)
            .and_then(DataSourceType::parse)
            .ok_or_else(|| ModelError::UnknownType {
                found: found.map_or_else(|| "<missing>".to_string(), render),
                expected: self.expected_types(),
            })
    }

    fn expected_types(&self) -> String {
        let names: Vec<&str> = self.registered().map(DataSourceType::as_str).collect();
        if names.is_empty() {
            "<none registered>".to_string()
        } else {
            names.join(", ")
        }
    }
}

fn optional_text<'a>(key: &str, value: &'a Value) -> ModelResult<Option<&'a str>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(ModelError::validation(key, "text")),
    }
}

fn merge_attributes(merged: &mut Map<String, Value>, patch: &Value) -> ModelResult<()> {
    let Some(patch) = patch.as_object() else {
        return Err(ModelError::validation(ATTRIBUTES_FIELD, "an object"));
    };
    let attributes = merged
        .entry(ATTRIBUTES_FIELD)
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(attributes) = attributes.as_object_mut() else {
        return Err(ModelError::validation(ATTRIBUTES_FIELD, "an object"));
    };
    for (key, value) in patch {
        let key = to_camel_case(key);
        if value.is_null() {
            attributes.remove(&key);
        } else {
            attributes.insert(key, value.clone());
        }
    }
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl EntityHandler for TypeRegistry {
    type Entity = DataSource;

    const KIND: ResourceKind = ResourceKind::Datasource;

    fn validate(&self, raw: &Value) -> ModelResult<DataSource> {
        TypeRegistry::validate(self, raw)
    }

    fn revalidate(&self, existing: &DataSource, patch: &Value) -> ModelResult<DataSource> {
        TypeRegistry::revalidate(self, existing, patch)
    }

    fn id<'a>(&self, entity: &'a DataSource) -> &'a ResourceId {
        entity.id()
    }

    fn to_document(&self, entity: &DataSource) -> Value {
        entity.to_document()
    }
}
