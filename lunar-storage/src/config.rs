//! Storage configuration, read from `lunar.toml`.
//!
//! Built once at start-up and handed to each component's constructor. Every
//! field has a default, so an empty or missing file yields a usable config.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding [`StorageConfig::base_path`].
pub const BASE_PATH_ENV: &str = "LUNAR_STORAGE_BASE_PATH";

/// Default size of each chunk when streaming uploads to storage.
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 100 * 1024;

/// Top-level storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of everything the storage layer touches.
    pub base_path: PathBuf,
    /// User provisioned by `init_local_storage`.
    pub default_user: String,
    /// Chunk size used when streaming uploads.
    pub upload_chunk_size: usize,
    pub layout: LayoutConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            default_user: "admin".to_string(),
            upload_chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
            layout: LayoutConfig::default(),
        }
    }
}

/// Directory names making up the on-disk layout. All relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub users: String,
    pub workflows: String,
    pub datasources: String,
    pub llms: String,
    pub files: String,
    pub index: String,
    pub component_index: String,
    pub workflow_index: String,
    pub custom: String,
    pub tmp: String,
    pub venv: String,
    pub environment_file: String,
    pub workflow_report: String,
    pub workflow_files: String,
    pub workflow_venv: String,
    pub system_data: String,
    pub system_tmp: String,
    pub component_library: String,
    pub demo: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            users: "users".into(),
            workflows: "workflows".into(),
            datasources: "datasources".into(),
            llms: "llms".into(),
            files: "files".into(),
            index: "index".into(),
            component_index: "component".into(),
            workflow_index: "workflow".into(),
            custom: "custom".into(),
            tmp: "tmp".into(),
            venv: "venv".into(),
            environment_file: "environment".into(),
            workflow_report: "report".into(),
            workflow_files: "files".into(),
            workflow_venv: "venv".into(),
            system_data: "system/data".into(),
            system_tmp: "system/tmp".into(),
            component_library: "component_library".into(),
            demo: "demo".into(),
        }
    }
}

impl LayoutConfig {
    /// Rejects names that would leave their parent directory.
    pub fn validate(&self) -> StorageResult<()> {
        let names = [
            ("users", &self.users),
            ("workflows", &self.workflows),
            ("datasources", &self.datasources),
            ("llms", &self.llms),
            ("files", &self.files),
            ("index", &self.index),
            ("component_index", &self.component_index),
            ("workflow_index", &self.workflow_index),
            ("custom", &self.custom),
            ("tmp", &self.tmp),
            ("venv", &self.venv),
            ("environment_file", &self.environment_file),
            ("workflow_report", &self.workflow_report),
            ("workflow_files", &self.workflow_files),
            ("workflow_venv", &self.workflow_venv),
            ("system_data", &self.system_data),
            ("system_tmp", &self.system_tmp),
            ("component_library", &self.component_library),
            ("demo", &self.demo),
        ];
        for (key, name) in names {
            let path = Path::new(name);
            let escapes = path.components().any(|c| {
                !matches!(c, std::path::Component::Normal(_))
            });
            if name.is_empty() || escapes {
                return Err(StorageError::Config(format!(
                    "layout.{key} must be a relative path without '..': {name:?}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageConfig,
}

impl StorageConfig {
    /// Config rooted at `base_path`, everything else default.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Parses the `[storage]` table of a TOML document.
    pub fn from_toml_str(contents: &str) -> StorageResult<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| StorageError::Config(e.to_string()))?;
        file.storage.layout.validate()?;
        Ok(file.storage)
    }

    /// Loads config from an explicit path.
    /// Falls back to defaults with a warning when the file is unreadable or invalid.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No storage config found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded storage config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse storage config {:?}: {}. Falling back to defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read storage config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Applies `LUNAR_STORAGE_BASE_PATH` when set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base) = std::env::var_os(BASE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.base_path = PathBuf::from(base);
        }
        self
    }
}

fn default_base_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        Path::new(&home).join(".lunar")
    } else if let Ok(home) = std::env::var("USERPROFILE") {
        Path::new(&home).join(".lunar")
    } else {
        PathBuf::from(".lunar")
    }
}
