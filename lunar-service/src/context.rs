//! Wiring of namespace, backend, and stores from one configuration.

use crate::datasource::DatasourceService;
use crate::error::ServiceResult;
use crate::files::FileService;
use lunar_model::TypeRegistry;
use lunar_storage::{
    DocumentStore, FileStore, LocalFileSystem, PathNamespace, Provisioner, StorageBackend,
    StorageConfig,
};
use std::sync::Arc;
use tracing::info;

/// Everything built from a [`StorageConfig`], shared by the services.
pub struct StorageContext {
    config: StorageConfig,
    namespace: PathNamespace,
    backend: Arc<dyn StorageBackend>,
    documents: DocumentStore,
    provisioner: Provisioner,
}

impl StorageContext {
    /// Context over the local filesystem backend.
    pub fn local(config: StorageConfig) -> ServiceResult<Self> {
        let backend: Arc<dyn StorageBackend> = Arc::new(LocalFileSystem::from_config(&config)?);
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: StorageConfig, backend: Arc<dyn StorageBackend>) -> ServiceResult<Self> {
        config.layout.validate()?;
        let namespace = PathNamespace::new(&config)?;
        let provisioner = Provisioner::new(&config, namespace.clone(), Arc::clone(&backend))?;
        info!(backend = backend.name(), root = ?backend.root(), "Storage context ready");
        Ok(Self {
            documents: DocumentStore::new(Arc::clone(&backend)),
            config,
            namespace,
            backend,
            provisioner,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn namespace(&self) -> &PathNamespace {
        &self.namespace
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    /// Datasource service sharing this context's document store and locks.
    pub fn datasources(&self, registry: Arc<TypeRegistry>) -> DatasourceService {
        DatasourceService::new(self.namespace.clone(), self.documents.clone(), registry)
    }

    pub fn files(&self) -> FileService {
        FileService::new(self.namespace.clone(), FileStore::new(Arc::clone(&self.backend)))
    }
}
