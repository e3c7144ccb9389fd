//! Sync passes and the collaborators around the reconciliation engine.
//!
//! A pass reads desired items from every source, matches them to projects,
//! asks the target for what it currently holds, reconciles the two per
//! source and project, and hands the resulting changes to an [`Applier`].
//!
//! Collaborators report through `tracing`; the subscriber is chosen by
//! whoever runs the pass.

mod apply;
mod file;
mod memory;
mod retry;
mod snapshot;

pub use apply::{apply_changes, ApplyFailure, ApplyPolicy, ApplyReport};
pub use file::FileTarget;
pub use memory::{InMemoryTarget, StaticSource, StoredTask};
pub use retry::{retry_async, RetryConfig, RetryingApplier};
pub use snapshot::SnapshotSource;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::config::ConfigError;
use crate::core::{reconcile, Change, ChangeKind, ChangeSummary, KeyedSet};
use crate::model::{
    find_project, project_for_url, DesiredItem, ItemQuery, ObservedItem, Project, SourceError,
};

/// A reconciled change between desired and observed task items.
pub type TaskChange = Change<DesiredItem, ObservedItem>;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error types for sync collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("source `{source_name}` is unreachable: {message}")]
    SourceUnreachable { source_name: String, message: String },

    #[error("source `{source_name}` returned a malformed response: {error}")]
    MalformedResponse {
        source_name: String,
        #[source]
        error: SourceError,
    },

    #[error("target {target} is unavailable: {message}")]
    TargetUnavailable { target: String, message: String },

    #[error("{action} rejected for {item}: {message}")]
    ActionRejected { action: ChangeKind, item: String, message: String },

    /// A fail-fast pass stopped at a failed change. `report` holds every
    /// project reconciled so far, the failing one last.
    #[error("sync aborted after `{change}` failed: {error}")]
    Aborted { change: String, error: String, report: Box<SyncReport> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Whether the same request may succeed if tried again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TargetUnavailable { .. })
    }
}

/// Produces the items that should exist after a pass.
#[async_trait]
pub trait DesiredStateProvider: Send + Sync {
    /// Source name, used in logs and reports.
    fn name(&self) -> &str;

    /// Tags every item from this source carries in the target.
    fn tags(&self) -> &[String];

    /// Read the current desired items.
    async fn desired_items(&self) -> SyncResult<Vec<DesiredItem>>;
}

/// Reports the items currently present in the target.
#[async_trait]
pub trait ObservedStateProvider: Send + Sync {
    /// Open items in the queried project carrying every queried tag.
    async fn observed_items(&self, query: &ItemQuery) -> SyncResult<Vec<ObservedItem>>;
}

/// Executes changes against the target.
#[async_trait]
pub trait Applier: Send + Sync {
    /// Create an item, returning it as the target now reports it.
    async fn create(&self, item: &DesiredItem) -> SyncResult<ObservedItem>;

    /// Mark an item complete.
    async fn complete(&self, item: &ObservedItem) -> SyncResult<()>;
}

#[async_trait]
impl<T: Applier + ?Sized> Applier for Arc<T> {
    async fn create(&self, item: &DesiredItem) -> SyncResult<ObservedItem> {
        (**self).create(item).await
    }

    async fn complete(&self, item: &ObservedItem) -> SyncResult<()> {
        (**self).complete(item).await
    }
}

/// Display names that a plan both adds and removes.
///
/// Desired and observed items derive their identity keys from different
/// fields, so an item that already exists can come back as an `Add` of
/// itself next to a `Remove` of its existing copy. Any name returned here
/// is a pair the keys failed to line up.
pub fn diverging_names(changes: &[TaskChange]) -> Vec<String> {
    let removed: HashSet<&str> =
        changes.iter().filter_map(Change::as_remove).map(|item| item.name.as_str()).collect();

    changes
        .iter()
        .filter_map(Change::as_add)
        .map(|item| item.name.as_str())
        .filter(|name| removed.contains(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Outcome of reconciling one source against one project.
#[derive(Debug)]
pub struct ProjectReport {
    pub source: String,
    pub project: String,
    pub summary: ChangeSummary,
    /// Desired items already present in the target
    pub unchanged: usize,
    /// See [`diverging_names`]
    pub diverging: Vec<String>,
    pub changes: Vec<TaskChange>,
    /// `None` on a dry run or when there was nothing to apply
    pub applied: Option<ApplyReport>,
}

/// Outcome of a whole pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub projects: Vec<ProjectReport>,
    /// Desired items no project claimed
    pub unmatched: usize,
}

impl SyncReport {
    /// Change counts across every project.
    pub fn summary(&self) -> ChangeSummary {
        self.projects.iter().fold(ChangeSummary::default(), |total, project| ChangeSummary {
            adds: total.adds + project.summary.adds,
            removes: total.removes + project.summary.removes,
        })
    }

    /// Every failed change across the pass.
    pub fn failures(&self) -> impl Iterator<Item = &ApplyFailure> {
        self.projects
            .iter()
            .filter_map(|project| project.applied.as_ref())
            .flat_map(|applied| applied.failures.iter())
    }
}

/// One synchronization pass over a fixed set of projects.
#[derive(Debug, Clone)]
pub struct SyncPass<'a> {
    projects: &'a [Project],
    policy: ApplyPolicy,
    dry_run: bool,
}

impl<'a> SyncPass<'a> {
    pub fn new(projects: &'a [Project]) -> Self {
        Self { projects, policy: ApplyPolicy::default(), dry_run: false }
    }

    /// Set how failed changes are handled.
    pub fn policy(mut self, policy: ApplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compute changes without applying them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the pass.
    ///
    /// Sources are read concurrently and any read failure aborts the pass
    /// before anything is applied. Under [`ApplyPolicy::FailFast`] the first
    /// failed change aborts the pass with [`SyncError::Aborted`], which carries
    /// the report of everything reconciled and applied up to that point.
    pub async fn run(
        &self,
        providers: &[Box<dyn DesiredStateProvider>],
        observed: &dyn ObservedStateProvider,
        applier: &dyn Applier,
    ) -> SyncResult<SyncReport> {
        let fetched = try_join_all(providers.iter().map(|provider| async move {
            let items = provider.desired_items().await?;
            tracing::info!(source = provider.name(), count = items.len(), "Read desired items");
            Ok::<_, SyncError>((provider, items))
        }))
        .await?;

        let projects = self.unique_projects();
        let mut report = SyncReport::default();

        for (provider, items) in fetched {
            let (mut by_project, unmatched) = self.assign_projects(provider.name(), items);
            report.unmatched += unmatched;

            for project in &projects {
                let desired = by_project.remove(&project.name).unwrap_or_default();
                let query = ItemQuery::new(project.name.clone(), provider.tags().to_vec());
                let current = observed.observed_items(&query).await?;

                let project_report = self
                    .reconcile_project(provider.name(), project, desired, current, applier)
                    .await;
                let first_failure = project_report
                    .applied
                    .as_ref()
                    .and_then(|applied| applied.failures.first())
                    .map(|failure| (failure.change.clone(), failure.error.to_string()));
                report.projects.push(project_report);

                if let Some((change, error)) = first_failure {
                    if self.policy == ApplyPolicy::FailFast {
                        return Err(SyncError::Aborted { change, error, report: Box::new(report) });
                    }
                }
            }
        }

        Ok(report)
    }

    async fn reconcile_project(
        &self,
        source: &str,
        project: &Project,
        desired: Vec<DesiredItem>,
        observed: Vec<ObservedItem>,
        applier: &dyn Applier,
    ) -> ProjectReport {
        let desired = KeyedSet::from_items(desired);
        let desired_count = desired.len();
        let changes = reconcile(desired, KeyedSet::from_items(observed));
        let summary = ChangeSummary::of(&changes);

        tracing::info!(
            source,
            project = %project.name,
            adds = summary.adds,
            removes = summary.removes,
            "Reconciled"
        );

        let diverging = diverging_names(&changes);
        if !diverging.is_empty() {
            tracing::warn!(
                source,
                project = %project.name,
                names = ?diverging,
                "Items are both added and removed; desired and observed keys do not line up"
            );
        }

        let applied = if self.dry_run || changes.is_empty() {
            None
        } else {
            Some(apply_changes(applier, &changes, self.policy).await)
        };

        ProjectReport {
            source: source.to_string(),
            project: project.name.clone(),
            summary,
            unchanged: desired_count - summary.adds,
            diverging,
            changes,
            applied,
        }
    }

    /// Group items by the project they belong to.
    ///
    /// An item that already names a configured project keeps it; otherwise
    /// the project is found from its note URL. Items matching no project
    /// are dropped and counted.
    fn assign_projects(
        &self,
        source: &str,
        items: Vec<DesiredItem>,
    ) -> (BTreeMap<String, Vec<DesiredItem>>, usize) {
        let mut grouped: BTreeMap<String, Vec<DesiredItem>> = BTreeMap::new();
        let mut unmatched = 0;

        for mut item in items {
            let project = find_project(&item.project_name, self.projects)
                .or_else(|_| project_for_url(&item.note, self.projects));
            match project {
                Ok(project) => {
                    item.project_name = project.name.clone();
                    grouped.entry(project.name.clone()).or_default().push(item);
                }
                Err(e) => {
                    tracing::warn!(
                        source,
                        item = %item.name,
                        error = %e,
                        "Skipping unmatched item"
                    );
                    unmatched += 1;
                }
            }
        }

        (grouped, unmatched)
    }

    /// Configured projects with repeated names dropped.
    fn unique_projects(&self) -> Vec<&'a Project> {
        let mut seen = HashSet::new();
        self.projects
            .iter()
            .filter(|project| {
                let first = seen.insert(project.name.as_str());
                if !first {
                    tracing::warn!(project = %project.name, "Ignoring duplicate project");
                }
                first
            })
            .collect()
    }
}
