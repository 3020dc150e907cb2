//! Filesystem-backed storage layer for Lunar.
//!
//! Maps every (user, resource kind, resource id) triple to a path and stores
//! JSON documents and uploaded files there.
//!
//! # Architecture
//!
//! - [`PathNamespace`] computes paths and never touches the disk
//! - [`StorageBackend`] is the byte-level seam; [`LocalFileSystem`] is the
//!   local-disk implementation and rejects paths outside its root
//! - [`DocumentStore`] reads and writes JSON documents, one per entity, with
//!   per-path write locks
//! - [`FileStore`] streams uploads in bounded chunks
//! - [`Provisioner`] creates the system, user, and workflow scaffolds

mod backend;
mod config;
mod document;
mod error;
mod local;
mod locks;
mod namespace;
mod provision;
mod upload;

pub use backend::{StorageBackend, contain, glob_match, normalize_root};
pub use config::{BASE_PATH_ENV, DEFAULT_UPLOAD_CHUNK_SIZE, LayoutConfig, StorageConfig};
pub use document::{DocumentGuard, DocumentStore, StoredDocument};
pub use error::{StorageError, StorageResult};
pub use local::LocalFileSystem;
pub use locks::PathLocks;
pub use namespace::{DOCUMENT_EXTENSION, PathNamespace};
pub use provision::Provisioner;
pub use upload::{FileStore, Upload};
