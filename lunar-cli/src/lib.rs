//! Command-line operations over Lunar storage.
//!
//! Every command returns a JSON value; the binary prints it. Keeping the
//! handlers here lets tests drive them without spawning a process.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use lunar_model::TypeRegistry;
use lunar_service::{ErrorKind, ServiceError, StorageContext};
use lunar_storage::{StorageConfig, StorageError};
use lunar_types::{ResourceId, ResourceKind, UserId};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "lunar")]
#[command(about = "Inspect and manage Lunar storage")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "lunar.toml", global = true)]
    pub config: PathBuf,

    /// Storage root, overriding the configuration file and environment
    #[arg(long, global = true)]
    pub base_path: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the system directories and the default user
    Init,

    /// Create a user's directory scaffold
    Scaffold {
        #[arg(short, long)]
        user: UserId,
    },

    /// Print the path of a resource, or of a kind's root without --id
    Resolve {
        #[arg(short, long)]
        user: UserId,
        #[arg(short, long)]
        kind: ResourceKind,
        #[arg(long)]
        id: Option<ResourceId>,
    },

    /// Manage datasources
    #[command(subcommand)]
    Datasource(DatasourceCommand),

    /// Manage workflow directories
    #[command(subcommand)]
    Workflow(WorkflowCommand),

    /// Manage uploaded files
    #[command(subcommand)]
    File(FileCommand),
}

#[derive(Subcommand, Debug)]
pub enum DatasourceCommand {
    /// Validate and store a new datasource
    Create {
        #[arg(short, long)]
        user: UserId,
        #[command(flatten)]
        payload: Payload,
    },
    Get {
        #[arg(short, long)]
        user: UserId,
        #[arg(long)]
        id: ResourceId,
    },
    List {
        #[arg(short, long)]
        user: UserId,
    },
    /// Merge a partial update into a datasource
    Update {
        #[arg(short, long)]
        user: UserId,
        #[arg(long)]
        id: ResourceId,
        #[command(flatten)]
        payload: Payload,
    },
    Delete {
        #[arg(short, long)]
        user: UserId,
        #[arg(long)]
        id: ResourceId,
        /// Succeed even if the datasource does not exist
        #[arg(long)]
        missing_ok: bool,
    },
    /// Show what a component receives for a LOCAL_FILE datasource
    Input {
        #[arg(short, long)]
        user: UserId,
        #[arg(long)]
        id: ResourceId,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// Create the report, files, and venv directories of a workflow
    Init {
        #[arg(short, long)]
        user: UserId,
        #[arg(long)]
        id: ResourceId,
    },
    /// Find the user owning a workflow
    Owner {
        #[arg(long)]
        id: ResourceId,
    },
    /// Delete a workflow's directory tree
    Remove {
        #[arg(short, long)]
        user: UserId,
        #[arg(long)]
        id: ResourceId,
        #[arg(long)]
        missing_ok: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Copy a local file into storage
    Save {
        #[arg(short, long)]
        user: UserId,
        /// File to copy
        source: PathBuf,
        /// Target directory inside storage; the user's file root by default
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    List {
        #[arg(short, long)]
        user: UserId,
    },
}

/// A JSON document given inline or read from a file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct Payload {
    /// Inline JSON
    #[arg(long)]
    pub json: Option<String>,
    /// Path to a JSON file
    #[arg(long)]
    pub json_file: Option<PathBuf>,
}

impl Payload {
    pub fn inline(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            json_file: None,
        }
    }

    fn load(&self) -> Result<Value> {
        let text = match (&self.json, &self.json_file) {
            (Some(json), _) => json.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => bail!("either --json or --json-file is required"),
        };
        serde_json::from_str(&text).context("Payload is not valid JSON")
    }
}

/// Builds the storage configuration: file, then environment, then flag.
pub fn load_config(path: &Path, base_path: Option<PathBuf>) -> StorageConfig {
    let mut config = StorageConfig::load_from(path).with_env_overrides();
    if let Some(base_path) = base_path {
        config.base_path = base_path;
    }
    debug!(base = ?config.base_path, "Resolved storage configuration");
    config
}

/// Runs one command against `context`.
pub async fn run(command: Command, context: &StorageContext) -> Result<Value> {
    match command {
        Command::Init => {
            context.provisioner().init_local_storage().await?;
            Ok(json!({
                "base": context.namespace().base(),
                "default_user": context.provisioner().default_user(),
            }))
        }
        Command::Scaffold { user } => {
            let dirs = context.provisioner().ensure_user_scaffold(&user).await?;
            Ok(json!({ "user": user, "directories": dirs }))
        }
        Command::Resolve { user, kind, id } => {
            let path = context.namespace().resolve(&user, kind, id.as_ref());
            Ok(json!({ "path": path }))
        }
        Command::Datasource(command) => run_datasource(command, context).await,
        Command::Workflow(command) => run_workflow(command, context).await,
        Command::File(command) => run_file(command, context).await,
    }
}

async fn run_datasource(command: DatasourceCommand, context: &StorageContext) -> Result<Value> {
    let service = context.datasources(Arc::new(TypeRegistry::with_builtin()));
    match command {
        DatasourceCommand::Create { user, payload } => {
            let created = service.create(&user, &payload.load()?).await?;
            info!(user = %user, id = %created.id(), "Datasource created");
            Ok(created.to_document())
        }
        DatasourceCommand::Get { user, id } => Ok(service.get(&user, &id).await?.to_document()),
        DatasourceCommand::List { user } => {
            let all = service.list(&user).await?;
            Ok(Value::Array(all.iter().map(|ds| ds.to_document()).collect()))
        }
        DatasourceCommand::Update { user, id, payload } => {
            let updated = service.update(&user, &id, &payload.load()?).await?;
            Ok(updated.to_document())
        }
        DatasourceCommand::Delete {
            user,
            id,
            missing_ok,
        } => {
            let deleted = service.delete(&user, &id, missing_ok).await?;
            Ok(json!({ "id": id, "deleted": deleted }))
        }
        DatasourceCommand::Input { user, id } => {
            let input = service.component_input(&user, &id).await?;
            Ok(serde_json::to_value(input)?)
        }
    }
}

async fn run_workflow(command: WorkflowCommand, context: &StorageContext) -> Result<Value> {
    let provisioner = context.provisioner();
    match command {
        WorkflowCommand::Init { user, id } => {
            let dirs = provisioner.init_workflow_dirs(&user, &id).await?;
            Ok(json!({ "workflow": id, "directories": dirs }))
        }
        WorkflowCommand::Owner { id } => {
            let owner = provisioner.find_workflow_owner(&id).await?;
            Ok(json!({ "workflow": id, "owner": owner }))
        }
        WorkflowCommand::Remove {
            user,
            id,
            missing_ok,
        } => {
            let removed = provisioner.remove_workflow(&user, &id, missing_ok).await?;
            Ok(json!({ "workflow": id, "removed": removed }))
        }
    }
}

async fn run_file(command: FileCommand, context: &StorageContext) -> Result<Value> {
    let files = context.files();
    match command {
        FileCommand::Save { user, source, dir } => {
            let dir = dir.unwrap_or_else(|| files.file_root(&user));
            let saved = files.save_from_path(&source, &dir).await?;
            Ok(json!({ "path": saved }))
        }
        FileCommand::List { user } => {
            let listed = files.user_files(&user).await?;
            Ok(json!(listed))
        }
    }
}

/// Process exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let kind = if let Some(service) = err.downcast_ref::<ServiceError>() {
        service.kind()
    } else if let Some(storage) = err.downcast_ref::<StorageError>() {
        ErrorKind::from(storage)
    } else {
        return 1;
    };
    match kind {
        ErrorKind::NotFound => 2,
        ErrorKind::InvalidInput => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Corrupt => 5,
        ErrorKind::Storage => 6,
        ErrorKind::Internal => 1,
    }
}

