//! Uploaded files in a user's file area.

use crate::error::ServiceResult;
use lunar_storage::{FileStore, PathNamespace, Upload};
use lunar_types::{ResourceKind, UserId};
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

#[derive(Clone)]
pub struct FileService {
    namespace: PathNamespace,
    files: FileStore,
}

impl FileService {
    pub fn new(namespace: PathNamespace, files: FileStore) -> Self {
        Self { namespace, files }
    }

    /// Directory holding `user`'s uploaded files.
    pub fn file_root(&self, user: &UserId) -> PathBuf {
        self.namespace.kind_root(user, ResourceKind::File)
    }

    /// Streams an upload into the user's file root.
    pub async fn save_upload<R>(&self, user: &UserId, upload: Upload<R>) -> ServiceResult<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(self.files.save_upload(&self.file_root(user), upload).await?)
    }

    /// Streams an upload into any directory inside storage.
    pub async fn save_upload_to<R>(&self, dir: &Path, upload: Upload<R>) -> ServiceResult<PathBuf>
    where
        R: AsyncRead + Unpin + Send,
    {
        Ok(self.files.save_upload(dir, upload).await?)
    }

    /// Copies a local file into a directory inside storage.
    pub async fn save_from_path(&self, source: &Path, dir: &Path) -> ServiceResult<PathBuf> {
        Ok(self.files.save_from_path(source, dir).await?)
    }

    pub async fn read_file(&self, path: &Path) -> ServiceResult<Vec<u8>> {
        Ok(self.files.read(path).await?)
    }

    pub async fn list_files(&self, dir: &Path) -> ServiceResult<Vec<PathBuf>> {
        Ok(self.files.list(dir).await?)
    }

    /// Everything in the user's file root.
    pub async fn user_files(&self, user: &UserId) -> ServiceResult<Vec<PathBuf>> {
        self.list_files(&self.file_root(user)).await
    }
}
