//! Datasource-specific operations.

use crate::entity::EntityService;
use crate::error::{ServiceError, ServiceResult};
use lunar_model::{DataSource, FileInput, TypeRegistry};
use lunar_storage::StorageError;
use lunar_types::{ResourceId, ResourceKind, UserId};
use tracing::debug;

/// CRUD for datasources, validated by the type registry.
pub type DatasourceService = EntityService<TypeRegistry>;

impl EntityService<TypeRegistry> {
    /// Turns a stored `LOCAL_FILE` datasource into the input a component
    /// receives. The file must exist under the user's file root.
    pub async fn component_input(&self, user: &UserId, id: &ResourceId) -> ServiceResult<FileInput> {
        let datasource = self.get(user, id).await?;
        self.file_input(user, &datasource).await
    }

    /// [`component_input`](Self::component_input) for a datasource already
    /// in hand.
    pub async fn file_input(&self, user: &UserId, datasource: &DataSource) -> ServiceResult<FileInput> {
        let Some(attributes) = datasource.as_local_file() else {
            return Err(ServiceError::Unsupported {
                operation: "component input",
                data_source_type: datasource.data_source_type().to_string(),
            });
        };

        let backend = self.documents().backend();
        let file_root = self.namespace().kind_root(user, ResourceKind::File);
        if !backend.exists(&file_root).await? {
            return Err(ServiceError::FileNotFound(file_root));
        }

        let path = attributes.path_in(&file_root);
        let size = match backend.size(&path).await {
            Ok(size) => size,
            Err(StorageError::NotFound(path)) => return Err(ServiceError::FileNotFound(path)),
            Err(e) => return Err(e.into()),
        };

        debug!(user = %user, id = %datasource.id(), bytes = size, "Resolved component input");
        Ok(FileInput {
            name: attributes.file_name().to_string(),
            description: datasource.description().to_string(),
            file_type: attributes.file_type().to_string(),
            size,
            path,
        })
    }
}
