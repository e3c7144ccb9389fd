//! A target backed by a JSON file of tasks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::memory::{complete_task, query_tasks, StoredTask};
use super::{Applier, ObservedStateProvider, SyncError, SyncResult};
use crate::model::{DesiredItem, ItemQuery, ObservedItem};

/// Keeps tasks in a JSON array on disk.
///
/// A missing file is an empty store. Every operation reads the file fresh,
/// and writes are serialized through an internal lock.
#[derive(Debug)]
pub struct FileTarget {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: tokio::sync::Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored task.
    pub async fn load(&self) -> SyncResult<Vec<StoredTask>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.unavailable(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| self.unavailable(e))
    }

    async fn save(&self, tasks: &[StoredTask]) -> SyncResult<()> {
        let content = serde_json::to_vec_pretty(tasks).map_err(|e| self.unavailable(e))?;
        tokio::fs::write(&self.path, content).await.map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, error: impl std::fmt::Display) -> SyncError {
        SyncError::TargetUnavailable {
            target: self.path.display().to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl ObservedStateProvider for FileTarget {
    async fn observed_items(&self, query: &ItemQuery) -> SyncResult<Vec<ObservedItem>> {
        let tasks = self.load().await?;
        Ok(query_tasks(&tasks, query))
    }
}

#[async_trait]
impl Applier for FileTarget {
    async fn create(&self, item: &DesiredItem) -> SyncResult<ObservedItem> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        let task = StoredTask::from_desired(item);
        let observed = task.to_observed();
        tasks.push(task);
        self.save(&tasks).await?;
        Ok(observed)
    }

    async fn complete(&self, item: &ObservedItem) -> SyncResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        complete_task(&mut tasks, item)?;
        self.save(&tasks).await
    }
}
