//! Typed entity model for Lunar storage.
//!
//! Defines the datasource family and the machinery that validates it:
//! - [`TypeRegistry`] — maps a `type` discriminator to the schema governing a
//!   record's connection attributes and builds typed [`DataSource`] values
//! - [`AttributeSchema`] — declares required/optional attributes and their JSON types
//! - [`ConnectionAttributes`] — the typed attributes, one variant per type
//! - [`EntityHandler`] — the contract the generic entity service consumes
//!
//! Raw payloads are checked here before anything reaches storage, and again
//! when stored documents are read back.

mod attributes;
mod datasource;
mod error;
mod handler;
mod registry;
mod schema;

pub use attributes::{
    AttributeBuilder, ConnectionAttributes, DEFAULT_POSTGRES_PORT, FileInput, LocalFileAttributes,
    PostgresqlAttributes,
};
pub use datasource::{DataSource, DataSourceType};
pub use error::{ModelError, ModelResult};
pub use handler::EntityHandler;
pub use registry::{ATTRIBUTES_FIELD, SchemaDescriptor, TYPE_FIELD, TypeRegistry};
pub use schema::{AttributeField, AttributeSchema, FieldType, to_camel_case, to_snake_case};
