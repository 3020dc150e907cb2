//! Creating the directory scaffold for the system, users, and workflows.
//!
//! Every operation is idempotent: running it again, concurrently or after a
//! partial failure, finishes the job without complaining about what exists.

use crate::backend::StorageBackend;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::namespace::PathNamespace;
use lunar_types::{ResourceId, ResourceKind, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Provisioner {
    namespace: PathNamespace,
    backend: Arc<dyn StorageBackend>,
    default_user: UserId,
}

impl Provisioner {
    pub fn new(
        config: &StorageConfig,
        namespace: PathNamespace,
        backend: Arc<dyn StorageBackend>,
    ) -> StorageResult<Self> {
        let default_user = UserId::parse(&config.default_user)
            .map_err(|e| StorageError::Config(format!("default_user: {e}")))?;
        Ok(Self {
            namespace,
            backend,
            default_user,
        })
    }

    pub fn default_user(&self) -> &UserId {
        &self.default_user
    }

    /// Creates the system directories and scaffolds the default user.
    pub async fn init_local_storage(&self) -> StorageResult<()> {
        for dir in self.namespace.system_dirs() {
            self.backend.ensure_dir(&dir).await?;
        }
        self.ensure_user_scaffold(&self.default_user).await?;
        info!(base = ?self.namespace.base(), "Local storage initialized");
        Ok(())
    }

    /// Creates every per-user directory and the environment marker. Returns
    /// the directories, in creation order.
    pub async fn ensure_user_scaffold(&self, user: &UserId) -> StorageResult<Vec<PathBuf>> {
        let dirs = self.namespace.user_scaffold(user);
        for dir in &dirs {
            self.backend.ensure_dir(dir).await?;
        }
        self.backend.touch(&self.namespace.environment_file(user)).await?;
        debug!(user = %user, "User scaffold ready");
        Ok(dirs)
    }

    /// Creates the report, files, and venv areas of one workflow.
    pub async fn init_workflow_dirs(
        &self,
        user: &UserId,
        workflow: &ResourceId,
    ) -> StorageResult<Vec<PathBuf>> {
        let dirs = self.namespace.workflow_scaffold(user, workflow);
        for dir in &dirs {
            self.backend.ensure_dir(dir).await?;
        }
        debug!(user = %user, workflow = %workflow, "Workflow directories ready");
        Ok(dirs)
    }

    /// Finds which user a workflow belongs to by looking for its directory.
    pub async fn find_workflow_owner(&self, workflow: &ResourceId) -> StorageResult<Option<UserId>> {
        let users = self.backend.list(&self.namespace.users_root().join("*")).await?;
        for user_dir in users {
            let Some(user) = user_dir
                .file_name()
                .and_then(|name| UserId::parse(&name.to_string_lossy()).ok())
            else {
                continue;
            };
            let path = self
                .namespace
                .resolve(&user, ResourceKind::Workflow, Some(workflow));
            if self.backend.exists(&path).await? {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Removes a workflow's whole directory tree.
    pub async fn remove_workflow(
        &self,
        user: &UserId,
        workflow: &ResourceId,
        missing_ok: bool,
    ) -> StorageResult<bool> {
        let path = self
            .namespace
            .resolve(user, ResourceKind::Workflow, Some(workflow));
        self.backend.delete(&path, missing_ok).await
    }
}
