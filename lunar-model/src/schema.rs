use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Describes the shape of one datasource type's connection attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub fields: Vec<AttributeField>,
}

/// A single declared attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeField {
    /// snake_case name. The lowerCamelCase form is accepted on input too.
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
}

impl AttributeField {
    /// Shorthand for a required field.
    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    /// Shorthand for an optional field.
    pub fn optional(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }
}

/// The JSON type an attribute must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
}

impl FieldType {
    /// Human-readable name used in validation errors.
    pub fn describe(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
        }
    }
}

impl AttributeSchema {
    pub fn new(fields: Vec<AttributeField>) -> Self {
        Self { fields }
    }

    /// Names of the required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    fn field(&self, snake_name: &str) -> Option<&AttributeField> {
        self.fields.iter().find(|f| f.name == snake_name)
    }

    /// Checks `attributes` against this schema and returns a copy keyed by
    /// snake_case names. Null values count as absent.
    ///
    /// `prefix` is prepended to field paths in errors, e.g.
    /// `connectionAttributes`.
    pub fn check(&self, prefix: &str, attributes: &Map<String, Value>) -> ModelResult<Map<String, Value>> {
        let mut normalized = Map::new();

        for (key, value) in attributes {
            let snake = to_snake_case(key);
            let path = format!("{prefix}.{key}");
            let Some(field) = self.field(&snake) else {
                return Err(ModelError::validation(path, "no such attribute"));
            };
            if value.is_null() {
                continue;
            }
            if !field.field_type.accepts(value) {
                return Err(ModelError::validation(path, field.field_type.describe()));
            }
            if normalized.insert(snake, value.clone()).is_some() {
                return Err(ModelError::validation(path, "a single value per attribute"));
            }
        }

        for field in self.fields.iter().filter(|f| f.required) {
            if !normalized.contains_key(&field.name) {
                return Err(ModelError::validation(
                    format!("{prefix}.{}", field.name),
                    format!("{} (required)", field.field_type.describe()),
                ));
            }
        }

        Ok(normalized)
    }
}

/// `fileName` -> `file_name`. Already snake_case input is returned unchanged.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `file_name` -> `fileName`. Already camelCase input is returned unchanged.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' && !out.is_empty() {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
