//! JSON documents on top of a [`StorageBackend`].
//!
//! Documents are JSON objects written pretty-printed with two-space
//! indentation. Writes and deletes to the same path are serialized through
//! [`PathLocks`]; callers doing read-modify-write take a [`DocumentGuard`]
//! first and use the `*_guarded` variants.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::locks::PathLocks;
use crate::namespace::DOCUMENT_EXTENSION;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

/// Exclusive hold on one document path.
#[derive(Debug)]
pub struct DocumentGuard {
    path: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

impl DocumentGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A document read back by [`DocumentStore::get_all`], with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub path: PathBuf,
    pub document: Value,
}

#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn StorageBackend>,
    locks: Arc<PathLocks>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            locks: Arc::new(PathLocks::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Takes the write lock for `path`.
    pub async fn lock(&self, path: &Path) -> DocumentGuard {
        DocumentGuard {
            path: path.to_path_buf(),
            _guard: self.locks.lock(path).await,
        }
    }

    /// Serializes `document` and writes it to `path`, replacing what was
    /// there.
    pub async fn put(&self, path: &Path, document: &Value) -> StorageResult<()> {
        let guard = self.lock(path).await;
        self.put_guarded(&guard, document).await
    }

    /// [`put`](Self::put) for a path already locked by the caller.
    pub async fn put_guarded(&self, guard: &DocumentGuard, document: &Value) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        self.backend.write(&guard.path, &bytes).await
    }

    /// Reads and parses the document at `path`.
    pub async fn get(&self, path: &Path) -> StorageResult<Value> {
        let bytes = self.backend.read(path).await?;
        serde_json::from_slice(&bytes).map_err(|source| StorageError::CorruptDocument {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads every `.json` document matching `pattern`.
    ///
    /// Corrupt documents, directories named like documents, and documents
    /// removed between listing and reading are skipped with a log line
    /// instead of failing the whole listing.
    pub async fn get_all(&self, pattern: &Path) -> StorageResult<Vec<StoredDocument>> {
        let paths = self.backend.list(pattern).await?;
        let mut documents = Vec::with_capacity(paths.len());

        for path in paths {
            if !has_document_extension(&path) {
                continue;
            }
            match self.get(&path).await {
                Ok(document) => documents.push(StoredDocument { path, document }),
                Err(StorageError::CorruptDocument { path, source }) => {
                    warn!("Skipping corrupt document {:?}: {}", path, source);
                }
                Err(StorageError::NotFound(path)) => {
                    debug!("Document {:?} vanished while listing", path);
                }
                Err(StorageError::Io(e)) if e.kind() == ErrorKind::IsADirectory => {
                    warn!("Skipping directory {:?} in document scope", path);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(documents)
    }

    /// Removes the document at `path`. With `missing_ok`, an absent document
    /// yields `Ok(false)` instead of [`StorageError::NotFound`].
    pub async fn delete(&self, path: &Path, missing_ok: bool) -> StorageResult<bool> {
        let guard = self.lock(path).await;
        self.delete_guarded(&guard, missing_ok).await
    }

    /// [`delete`](Self::delete) for a path already locked by the caller.
    pub async fn delete_guarded(&self, guard: &DocumentGuard, missing_ok: bool) -> StorageResult<bool> {
        self.backend.delete(&guard.path, missing_ok).await
    }
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}
