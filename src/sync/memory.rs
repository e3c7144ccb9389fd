//! In-process collaborators: a fixed desired-item source and a task store.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{Applier, DesiredStateProvider, ObservedStateProvider, SyncError, SyncResult};
use crate::core::ChangeKind;
use crate::model::{DesiredItem, ItemQuery, ObservedItem};

/// A task as held by a store-backed target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTask {
    pub id: String,
    pub project_name: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
    #[serde(rename = "dueDateMS", default, skip_serializing_if = "Option::is_none")]
    pub due_date_ms: Option<i64>,
    #[serde(default)]
    pub completed: bool,
}

impl StoredTask {
    /// Materialize a desired item under a fresh identifier.
    pub fn from_desired(item: &DesiredItem) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_name: item.project_name.clone(),
            name: item.name.clone(),
            tags: item.tags.clone(),
            note: item.note.clone(),
            due_date_ms: item.due_date_ms,
            completed: false,
        }
    }

    /// The task as the target reports it.
    pub fn to_observed(&self) -> ObservedItem {
        ObservedItem::new(self.id.clone(), self.name.clone())
    }

    /// Open, in the queried project, and carrying every queried tag.
    pub fn matches(&self, query: &ItemQuery) -> bool {
        !self.completed && self.project_name == query.project_name && query.matches_tags(&self.tags)
    }
}

/// Observed items answering `query`.
pub(crate) fn query_tasks(tasks: &[StoredTask], query: &ItemQuery) -> Vec<ObservedItem> {
    tasks.iter().filter(|task| task.matches(query)).map(StoredTask::to_observed).collect()
}

/// Flag the task with the item's id as completed.
pub(crate) fn complete_task(tasks: &mut [StoredTask], item: &ObservedItem) -> SyncResult<()> {
    match tasks.iter_mut().find(|task| task.id == item.id) {
        Some(task) => {
            task.completed = true;
            Ok(())
        }
        None => Err(SyncError::ActionRejected {
            action: ChangeKind::Remove,
            item: item.to_string(),
            message: "no task with this id".to_string(),
        }),
    }
}

/// A target application held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryTarget {
    tasks: Mutex<Vec<StoredTask>>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of tasks.
    pub fn with_tasks(tasks: Vec<StoredTask>) -> Self {
        Self { tasks: Mutex::new(tasks) }
    }

    /// Snapshot of every task, completed ones included.
    pub fn tasks(&self) -> Vec<StoredTask> {
        self.tasks.lock().clone()
    }

    /// Tasks not yet completed.
    pub fn open_tasks(&self) -> Vec<StoredTask> {
        self.tasks.lock().iter().filter(|task| !task.completed).cloned().collect()
    }
}

#[async_trait]
impl ObservedStateProvider for InMemoryTarget {
    async fn observed_items(&self, query: &ItemQuery) -> SyncResult<Vec<ObservedItem>> {
        Ok(query_tasks(&self.tasks.lock(), query))
    }
}

#[async_trait]
impl Applier for InMemoryTarget {
    async fn create(&self, item: &DesiredItem) -> SyncResult<ObservedItem> {
        let task = StoredTask::from_desired(item);
        let observed = task.to_observed();
        self.tasks.lock().push(task);
        Ok(observed)
    }

    async fn complete(&self, item: &ObservedItem) -> SyncResult<()> {
        complete_task(&mut self.tasks.lock(), item)
    }
}

/// A desired-item source with a fixed item list.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    tags: Vec<String>,
    items: Vec<DesiredItem>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, tags: Vec<String>, items: Vec<DesiredItem>) -> Self {
        Self { name: name.into(), tags, items }
    }
}

#[async_trait]
impl DesiredStateProvider for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    async fn desired_items(&self) -> SyncResult<Vec<DesiredItem>> {
        Ok(self.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_then_query() {
        let target = InMemoryTarget::new();
        let item = DesiredItem::new("[1] Task", "u").with_project("Work").with_tags(tags(&["gh"]));

        let created = target.create(&item).await.unwrap();
        assert_eq!(created.name, "[1] Task");
        assert!(!created.id.is_empty());

        let found = target.observed_items(&ItemQuery::new("Work", tags(&["gh"]))).await.unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn test_query_filters_project_and_tags() {
        let target = InMemoryTarget::new();
        target
            .create(&DesiredItem::new("a", "u").with_project("Work").with_tags(tags(&["gh"])))
            .await
            .unwrap();
        target
            .create(&DesiredItem::new("b", "u").with_project("Home").with_tags(tags(&["gh"])))
            .await
            .unwrap();
        target.create(&DesiredItem::new("c", "u").with_project("Work")).await.unwrap();

        let found = target.observed_items(&ItemQuery::new("Work", tags(&["gh"]))).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "a");

        let untagged = target.observed_items(&ItemQuery::new("Work", Vec::new())).await.unwrap();
        assert_eq!(untagged.len(), 2);
    }

    #[tokio::test]
    async fn test_completed_tasks_are_hidden() {
        let target = InMemoryTarget::new();
        let created = target.create(&DesiredItem::new("a", "u").with_project("P")).await.unwrap();
        target.complete(&created).await.unwrap();

        let found = target.observed_items(&ItemQuery::new("P", Vec::new())).await.unwrap();
        assert!(found.is_empty());
        assert!(target.open_tasks().is_empty());
        assert!(target.tasks()[0].completed);
    }

    #[tokio::test]
    async fn test_complete_unknown_id_is_rejected() {
        let target = InMemoryTarget::new();
        let err = target.complete(&ObservedItem::new("nope", "ghost")).await.unwrap_err();
        assert!(matches!(err, SyncError::ActionRejected { action: ChangeKind::Remove, .. }));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new("feed", tags(&["t"]), vec![DesiredItem::new("a", "u")]);
        assert_eq!(source.name(), "feed");
        assert_eq!(source.tags(), ["t".to_string()]);
        assert_eq!(source.desired_items().await.unwrap().len(), 1);
    }

    #[test]
    fn test_stored_task_json_shape() {
        let task = StoredTask::from_desired(&DesiredItem::new("a", "u").with_project("P"));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["projectName"], "P");
        assert_eq!(json["completed"], false);
        assert!(json.get("dueDateMS").is_none());
    }
}
