//! Local file system backend.
//!
//! Writes go to a hidden temporary sibling first and are renamed into place,
//! so a reader never sees a half-written document.

use crate::backend::{StorageBackend, contain, glob_match, has_wildcards, normalize_root};
use crate::config::{DEFAULT_UPLOAD_CHUNK_SIZE, StorageConfig};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Backend storing everything under one directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    chunk_size: usize,
}

impl LocalFileSystem {
    /// Creates a backend rooted at `root`. The directory itself is created
    /// lazily by the first write or by provisioning.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self {
            root: normalize_root(root.as_ref())?,
            chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        })
    }

    /// Backend rooted at the configured base path.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self::new(&config.base_path)?.with_chunk_size(config.upload_chunk_size))
    }

    /// Sets the buffer size used by [`StorageBackend::write_stream`].
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn contain(&self, path: &Path) -> StorageResult<PathBuf> {
        contain(&self.root, path)
    }

    /// Like `contain`, but also refuses the root itself.
    fn contain_entry(&self, path: &Path) -> StorageResult<PathBuf> {
        let target = self.contain(path)?;
        if target == self.root {
            return Err(StorageError::invalid_path(path, "refers to the storage root itself"));
        }
        Ok(target)
    }

    async fn create_parent(&self, target: &Path) -> StorageResult<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::write(parent, e))?;
        }
        Ok(())
    }

    /// Moves a finished temp file into place, cleaning it up on failure.
    async fn commit(&self, tmp: &Path, target: &Path) -> StorageResult<()> {
        if let Err(e) = fs::rename(tmp, target).await {
            discard_temp(tmp).await;
            return Err(StorageError::write(target, e));
        }
        Ok(())
    }
}

/// Hidden sibling used while writing `target`. The name has a fixed length,
/// so any target name that fits the file system also gets a temp file.
fn temp_sibling(target: &Path) -> PathBuf {
    target.with_file_name(format!(".{}.tmp", uuid::Uuid::new_v4().simple()))
}

async fn discard_temp(tmp: &Path) {
    match fs::remove_file(tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temp file {:?}: {}", tmp, e),
    }
}

fn map_read_error(path: &Path, e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.to_path_buf())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl StorageBackend for LocalFileSystem {
    fn name(&self) -> &'static str {
        "local"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let target = self.contain_entry(path)?;
        self.create_parent(&target).await?;

        let tmp = temp_sibling(&target);
        if let Err(e) = fs::write(&tmp, bytes).await {
            discard_temp(&tmp).await;
            return Err(StorageError::write(&target, e));
        }
        self.commit(&tmp, &target).await?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), target);
        Ok(())
    }

    async fn write_stream(
        &self,
        path: &Path,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> StorageResult<u64> {
        let target = self.contain_entry(path)?;
        self.create_parent(&target).await?;

        let tmp = temp_sibling(&target);
        let result = async {
            let mut file = fs::File::create(&tmp)
                .await
                .map_err(|e| StorageError::write(&target, e))?;
            let mut buf = vec![0u8; self.chunk_size];
            let mut total = 0u64;
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                file.write_all(&buf[..n])
                    .await
                    .map_err(|e| StorageError::write(&target, e))?;
                total += n as u64;
            }
            file.flush().await.map_err(|e| StorageError::write(&target, e))?;
            Ok::<_, StorageError>(total)
        }
        .await;

        match result {
            Ok(total) => {
                self.commit(&tmp, &target).await?;
                debug!("Streamed {} bytes to {:?}", total, target);
                Ok(total)
            }
            Err(e) => {
                discard_temp(&tmp).await;
                Err(e)
            }
        }
    }

    async fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        let target = self.contain(path)?;
        fs::read(&target).await.map_err(|e| map_read_error(&target, e))
    }

    async fn list(&self, pattern: &Path) -> StorageResult<Vec<PathBuf>> {
        let pattern = self.contain_entry(pattern)?;
        let (Some(dir), Some(name)) = (pattern.parent(), pattern.file_name()) else {
            return Ok(Vec::new());
        };
        if has_wildcards(&dir.to_string_lossy()) {
            return Err(StorageError::invalid_path(
                &pattern,
                "wildcards are only supported in the last component",
            ));
        }
        let name = name.to_string_lossy();

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            if glob_match(&name, &file_name.to_string_lossy()) {
                matches.push(entry.path());
            }
        }
        matches.sort();
        Ok(matches)
    }

    async fn delete(&self, path: &Path, missing_ok: bool) -> StorageResult<bool> {
        let target = self.contain_entry(path)?;
        let metadata = match fs::symlink_metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return if missing_ok {
                    debug!("Nothing to delete at {:?}", target);
                    Ok(false)
                } else {
                    Err(StorageError::NotFound(target))
                };
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        if metadata.is_dir() {
            fs::remove_dir_all(&target).await?;
        } else {
            fs::remove_file(&target).await?;
        }
        debug!("Deleted {:?}", target);
        Ok(true)
    }

    async fn exists(&self, path: &Path) -> StorageResult<bool> {
        let target = self.contain(path)?;
        Ok(fs::try_exists(&target).await?)
    }

    async fn size(&self, path: &Path) -> StorageResult<u64> {
        let target = self.contain(path)?;
        let metadata = fs::metadata(&target)
            .await
            .map_err(|e| map_read_error(&target, e))?;
        Ok(metadata.len())
    }

    async fn ensure_dir(&self, path: &Path) -> StorageResult<()> {
        let target = self.contain(path)?;
        fs::create_dir_all(&target)
            .await
            .map_err(|e| StorageError::write(&target, e))
    }

    async fn touch(&self, path: &Path) -> StorageResult<()> {
        let target = self.contain_entry(path)?;
        self.create_parent(&target).await?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .await
            .map_err(|e| StorageError::write(&target, e))?;
        Ok(())
    }
}
