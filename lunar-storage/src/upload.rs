//! Saving uploaded and on-disk files into storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::info;

/// An incoming file: a client-supplied name plus a byte stream.
pub struct Upload<R> {
    filename: String,
    reader: R,
}

impl<R> Upload<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wraps a stream. The filename must be a single path segment and must
    /// not be hidden, or directory listings would skip it.
    pub fn new(filename: impl Into<String>, reader: R) -> StorageResult<Self> {
        let filename = filename.into();
        if !is_plain_file_name(&filename) {
            return Err(StorageError::invalid_path(
                &filename,
                "upload file name must be a single path segment",
            ));
        }
        if filename.starts_with('.') {
            return Err(StorageError::invalid_path(
                &filename,
                "upload file name must not start with a dot",
            ));
        }
        Ok(Self { filename, reader })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\', '\0']) && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// Streams files into directories of a backend.
#[derive(Clone)]
pub struct FileStore {
    backend: Arc<dyn StorageBackend>,
}

impl FileStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Writes `upload` into `dir` under its own name and returns the stored
    /// path. `dir` is created if needed; an existing file is replaced.
    pub async fn save_upload<R>(&self, dir: &Path, upload: Upload<R>) -> StorageResult<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        let Upload {
            filename,
            mut reader,
        } = upload;
        let target = dir.join(&filename);
        let size = self.backend.write_stream(&target, &mut reader).await?;
        info!(file = %filename, bytes = size, "Saved upload to {:?}", target);
        Ok(target)
    }

    /// Copies a file from anywhere on the local disk into `dir`, keeping its
    /// name.
    pub async fn save_from_path(&self, source: &Path, dir: &Path) -> StorageResult<PathBuf> {
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::invalid_path(source, "source has no file name"))?;
        let file = tokio::fs::File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(source.to_path_buf())
            } else {
                StorageError::Io(e)
            }
        })?;
        self.save_upload(dir, Upload::new(filename, file)?).await
    }

    pub async fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.backend.read(path).await
    }

    /// Every entry directly inside `dir`, sorted.
    pub async fn list(&self, dir: &Path) -> StorageResult<Vec<PathBuf>> {
        self.backend.list(&dir.join("*")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("report.csv"));
        assert!(is_plain_file_name(".env"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a/b.csv"));
        assert!(!is_plain_file_name("..\\b.csv"));
    }

    #[test]
    fn upload_rejects_hidden_name() {
        let err = Upload::new(".env", &b"x"[..]).err().unwrap();
        assert!(matches!(err, StorageError::InvalidPath { .. }));
    }

    #[test]
    fn upload_rejects_nested_name() {
        let err = Upload::new("../escape.txt", &b"x"[..]).err().unwrap();
        assert!(matches!(err, StorageError::InvalidPath { .. }));
    }
}
