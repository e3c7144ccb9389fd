//! Desired items read from saved source responses.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DesiredStateProvider, SyncError, SyncResult};
use crate::model::{DesiredItem, Source};

/// Reads `<dir>/<source name>.json` and maps it through the source's
/// response mapping.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    source: Source,
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(source: Source, dir: &Path) -> Self {
        let path = dir.join(format!("{}.json", source.name));
        Self { source, path }
    }

    /// One snapshot source per configured source.
    pub fn for_sources(sources: Vec<Source>, dir: &Path) -> Vec<Self> {
        sources.into_iter().map(|source| Self::new(source, dir)).collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DesiredStateProvider for SnapshotSource {
    fn name(&self) -> &str {
        &self.source.name
    }

    fn tags(&self) -> &[String] {
        &self.source.tags
    }

    async fn desired_items(&self) -> SyncResult<Vec<DesiredItem>> {
        tracing::debug!(
            source = %self.source.name,
            path = %self.path.display(),
            "Reading snapshot"
        );

        let body = tokio::fs::read(&self.path).await.map_err(|e| SyncError::SourceUnreachable {
            source_name: self.source.name.clone(),
            message: format!("{}: {}", self.path.display(), e),
        })?;

        self.source.parse_response(&body).map_err(|error| SyncError::MalformedResponse {
            source_name: self.source.name.clone(),
            error,
        })
    }
}
