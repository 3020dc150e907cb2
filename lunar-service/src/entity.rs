//! Generic CRUD for validated entities stored one document per record.

use crate::error::{ServiceError, ServiceResult};
use lunar_model::{EntityHandler, ModelError};
use lunar_storage::{DocumentStore, PathNamespace};
use lunar_types::{ResourceId, UserId};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates records with `H` and persists them under each user's namespace.
///
/// Every document read back is validated again, so an externally edited file
/// cannot smuggle an invalid record past the service.
pub struct EntityService<H: EntityHandler> {
    namespace: PathNamespace,
    documents: DocumentStore,
    handler: Arc<H>,
}

impl<H: EntityHandler> Clone for EntityService<H> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            documents: self.documents.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: EntityHandler> EntityService<H> {
    pub fn new(namespace: PathNamespace, documents: DocumentStore, handler: Arc<H>) -> Self {
        Self {
            namespace,
            documents,
            handler,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn namespace(&self) -> &PathNamespace {
        &self.namespace
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Where the record `id` of `user` is stored.
    pub fn path(&self, user: &UserId, id: &ResourceId) -> PathBuf {
        self.namespace.resolve(user, H::KIND, Some(id))
    }

    /// Validates `raw` and stores the new record. An id is generated when the
    /// payload has none; a payload naming an id already in use is refused.
    pub async fn create(&self, user: &UserId, raw: &Value) -> ServiceResult<H::Entity> {
        let entity = self.handler.validate(raw)?;
        let id = self.handler.id(&entity);
        let path = self.path(user, id);

        let guard = self.documents.lock(&path).await;
        if self.documents.backend().exists(&path).await? {
            return Err(ServiceError::AlreadyExists {
                kind: H::KIND,
                id: id.clone(),
            });
        }
        self.documents
            .put_guarded(&guard, &self.handler.to_document(&entity))
            .await?;

        info!(user = %user, kind = %H::KIND, id = %id, "Created entity");
        Ok(entity)
    }

    /// Reads and re-validates one record.
    pub async fn get(&self, user: &UserId, id: &ResourceId) -> ServiceResult<H::Entity> {
        let path = self.path(user, id);
        let document = self.documents.get(&path).await?;
        self.check_stored(&path, id, &document)
    }

    /// Every valid record of the user. Documents that are corrupt or fail
    /// validation are skipped with a warning.
    pub async fn list(&self, user: &UserId) -> ServiceResult<Vec<H::Entity>> {
        let pattern = self.namespace.scope_glob(user, H::KIND);
        let stored = self.documents.get_all(&pattern).await?;

        let mut entities = Vec::with_capacity(stored.len());
        for doc in stored {
            let Some(id) = id_from_file_name(&doc.path) else {
                warn!("Skipping {:?}: file name is not a valid id", doc.path);
                continue;
            };
            match self.check_stored(&doc.path, &id, &doc.document) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping invalid stored entity: {}", e),
            }
        }
        debug!(user = %user, kind = %H::KIND, count = entities.len(), "Listed entities");
        Ok(entities)
    }

    /// Merges `patch` into the stored record, validates the result, and
    /// rewrites the document. Holds the path's lock throughout.
    pub async fn update(
        &self,
        user: &UserId,
        id: &ResourceId,
        patch: &Value,
    ) -> ServiceResult<H::Entity> {
        let path = self.path(user, id);
        let guard = self.documents.lock(&path).await;

        let document = self.documents.get(&path).await?;
        let existing = self.check_stored(&path, id, &document)?;
        let updated = self.handler.revalidate(&existing, patch)?;
        self.documents
            .put_guarded(&guard, &self.handler.to_document(&updated))
            .await?;

        info!(user = %user, kind = %H::KIND, id = %id, "Updated entity");
        Ok(updated)
    }

    /// Removes a record. With `missing_ok`, a missing record yields
    /// `Ok(false)` rather than a not-found error.
    pub async fn delete(
        &self,
        user: &UserId,
        id: &ResourceId,
        missing_ok: bool,
    ) -> ServiceResult<bool> {
        let path = self.path(user, id);
        let deleted = self.documents.delete(&path, missing_ok).await?;
        if deleted {
            info!(user = %user, kind = %H::KIND, id = %id, "Deleted entity");
        }
        Ok(deleted)
    }

    /// Validates a document read from `path`, which must hold record `id`.
    fn check_stored(&self, path: &Path, id: &ResourceId, document: &Value) -> ServiceResult<H::Entity> {
        let invalid = |source: ModelError| ServiceError::InvalidDocument {
            path: path.to_path_buf(),
            source,
        };
        let entity = self.handler.validate(document).map_err(&invalid)?;
        let stored_id = self.handler.id(&entity);
        if stored_id != id {
            return Err(invalid(ModelError::IdChanged {
                from: id.to_string(),
                to: stored_id.to_string(),
            }));
        }
        Ok(entity)
    }
}

fn id_from_file_name(path: &Path) -> Option<ResourceId> {
    let stem = path.file_stem()?.to_str()?;
    ResourceId::parse(stem).ok()
}

