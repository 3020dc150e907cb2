//! Deterministic mapping from (user, resource kind, resource id) to a path.
//!
//! Pure computation over the configured layout: nothing here touches the
//! filesystem, and resolving for a user who has never been provisioned is
//! fine. Because user and resource ids are single path segments, distinct
//! triples always map to distinct paths.

use crate::backend::normalize_root;
use crate::config::{LayoutConfig, StorageConfig};
use crate::error::StorageResult;
use lunar_types::{ResourceId, ResourceKind, UserId, WorkflowArea};
use std::path::{Path, PathBuf};

/// Extension of document-kind files.
pub const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct PathNamespace {
    base: PathBuf,
    layout: LayoutConfig,
}

impl PathNamespace {
    /// The base path is normalised exactly like a backend root, so resolved
    /// paths always line up with the backend built from the same config.
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self {
            base: normalize_root(&config.base_path)?,
            layout: config.layout.clone(),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `{base}/users`
    pub fn users_root(&self) -> PathBuf {
        self.base.join(&self.layout.users)
    }

    /// `{base}/users/{user}`
    pub fn user_root(&self, user: &UserId) -> PathBuf {
        self.users_root().join(user.as_str())
    }

    /// Root directory holding every resource of `kind` for `user`.
    pub fn kind_root(&self, user: &UserId, kind: ResourceKind) -> PathBuf {
        let user_root = self.user_root(user);
        let layout = &self.layout;
        match kind {
            ResourceKind::Workflow => user_root.join(&layout.workflows),
            ResourceKind::Datasource => user_root.join(&layout.datasources),
            ResourceKind::Llm => user_root.join(&layout.llms),
            ResourceKind::File => user_root.join(&layout.files),
            ResourceKind::ComponentIndex => user_root.join(&layout.index).join(&layout.component_index),
            ResourceKind::WorkflowIndex => user_root.join(&layout.index).join(&layout.workflow_index),
            ResourceKind::Custom => user_root.join(&layout.custom),
            ResourceKind::Tmp => user_root.join(&layout.tmp),
            ResourceKind::Venv => user_root.join(&layout.venv),
        }
    }

    /// Resolves the path of one resource, or of the kind's root when `id`
    /// is `None`. Document kinds get a `.json` file, container kinds a
    /// directory.
    pub fn resolve(&self, user: &UserId, kind: ResourceKind, id: Option<&ResourceId>) -> PathBuf {
        let root = self.kind_root(user, kind);
        match id {
            None => root,
            Some(id) if kind.is_document() => root.join(format!("{id}.{DOCUMENT_EXTENSION}")),
            Some(id) => root.join(id.as_str()),
        }
    }

    /// Glob matching every document of a document kind, e.g.
    /// `{base}/users/u1/datasources/*.json`.
    pub fn scope_glob(&self, user: &UserId, kind: ResourceKind) -> PathBuf {
        self.kind_root(user, kind).join(format!("*.{DOCUMENT_EXTENSION}"))
    }

    /// `{base}/users/{user}/workflows/{workflow}/{report|files|venv}`
    pub fn workflow_area(&self, user: &UserId, workflow: &ResourceId, area: WorkflowArea) -> PathBuf {
        let dir = match area {
            WorkflowArea::Report => &self.layout.workflow_report,
            WorkflowArea::Files => &self.layout.workflow_files,
            WorkflowArea::Venv => &self.layout.workflow_venv,
        };
        self.resolve(user, ResourceKind::Workflow, Some(workflow)).join(dir)
    }

    /// Empty marker file created when a user is provisioned.
    pub fn environment_file(&self, user: &UserId) -> PathBuf {
        self.user_root(user).join(&self.layout.environment_file)
    }

    /// Index root shared by the component and workflow indices.
    pub fn user_index_root(&self, user: &UserId) -> PathBuf {
        self.user_root(user).join(&self.layout.index)
    }

    /// Every directory a provisioned user has, parents before children.
    pub fn user_scaffold(&self, user: &UserId) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(ResourceKind::ALL.len() + 1);
        for kind in ResourceKind::ALL {
            if kind == ResourceKind::ComponentIndex {
                dirs.push(self.user_index_root(user));
            }
            dirs.push(self.kind_root(user, kind));
        }
        dirs
    }

    /// Directories created for one workflow.
    pub fn workflow_scaffold(&self, user: &UserId, workflow: &ResourceId) -> Vec<PathBuf> {
        WorkflowArea::ALL
            .into_iter()
            .map(|area| self.workflow_area(user, workflow, area))
            .collect()
    }

    /// System-wide directories created by `init_local_storage`.
    pub fn system_dirs(&self) -> Vec<PathBuf> {
        let layout = &self.layout;
        let index = self.base.join(&layout.index);
        vec![
            self.base.clone(),
            self.base.join(&layout.system_data),
            self.base.join(&layout.system_tmp),
            self.base.join(&layout.component_library),
            self.users_root(),
            self.base.join(&layout.venv),
            index.join(&layout.component_index),
            index.join(&layout.workflow_index),
            self.base.join(&layout.demo),
        ]
    }
}
