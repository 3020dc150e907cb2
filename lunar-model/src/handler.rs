use crate::error::ModelResult;
use lunar_types::{ResourceId, ResourceKind};
use serde_json::Value;

/// Validation and serialization for one persisted entity kind.
///
/// The generic entity service handles resolving, reading, and writing; an
/// implementation of this trait decides what a valid record of its kind is.
/// [`TypeRegistry`](crate::TypeRegistry) implements it for datasources.
pub trait EntityHandler: Send + Sync {
    /// The validated, typed record.
    type Entity: Clone + Send + Sync;

    /// Where records of this kind live in a user's namespace.
    const KIND: ResourceKind;

    /// Validate a raw payload and build a record, generating an id if the
    /// payload has none.
    fn validate(&self, raw: &Value) -> ModelResult<Self::Entity>;

    /// Merge a partial update into an existing record and validate the
    /// complete result.
    fn revalidate(&self, existing: &Self::Entity, patch: &Value) -> ModelResult<Self::Entity>;

    fn id<'a>(&self, entity: &'a Self::Entity) -> &'a ResourceId;

    /// The canonical document written to storage.
    fn to_document(&self, entity: &Self::Entity) -> Value;
}
