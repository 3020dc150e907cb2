//! Per-path write serialization within one process.
//!
//! Each path maps to its own async mutex. Entries nobody holds or waits on are
//! pruned whenever a new lock is taken, so the table only grows with the
//! number of paths in use at the same time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
pub struct PathLocks {
    table: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`. Released when the guard drops.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the table holds a reference: unused.
            table.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(table.entry(path.to_path_buf()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of paths currently tracked.
    pub fn tracked(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
