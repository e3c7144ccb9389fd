//! Task items on both sides of a sync.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::Keyed;

/// An item that already exists in the target application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservedItem {
    /// Identifier assigned by the target application
    pub id: String,
    /// Display name
    pub name: String,
}

impl ObservedItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

impl fmt::Display for ObservedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item: [{}] {}", self.id, self.name)
    }
}

impl Keyed for ObservedItem {
    fn identity_key(&self) -> String {
        format!("[{}] {}", self.id, self.name)
    }
}

/// A request to create an item in the target application.
///
/// It has no application identifier yet, so its identity comes from the
/// fields the source provides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredItem {
    /// Project the item belongs to (empty until matched)
    #[serde(default)]
    pub project_name: String,
    /// Display name
    pub name: String,
    /// Tags applied on creation
    #[serde(default)]
    pub tags: Vec<String>,
    /// Note body, usually the link back to the source
    #[serde(default)]
    pub note: String,
    /// Due date as milliseconds since the Unix epoch
    #[serde(rename = "dueDateMS", default, skip_serializing_if = "Option::is_none")]
    pub due_date_ms: Option<i64>,
}

impl DesiredItem {
    pub fn new(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self { name: name.into(), note: note.into(), ..Default::default() }
    }

    /// Set the owning project.
    pub fn with_project(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }

    /// Set the tags applied on creation.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the due date.
    pub fn with_due_date_ms(mut self, due_date_ms: i64) -> Self {
        self.due_date_ms = Some(due_date_ms);
        self
    }

    /// The due date, if one is set and in range.
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date_ms.and_then(DateTime::from_timestamp_millis)
    }
}

impl fmt::Display for DesiredItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[NewItem] {}: {}", self.name, self.project_name)?;
        if let Some(due) = self.due_date() {
            write!(f, " (due {})", due.format("%Y-%m-%d"))?;
        }
        Ok(())
    }
}

impl Keyed for DesiredItem {
    fn identity_key(&self) -> String {
        format!("{} | {} | {}", self.project_name, self.name, self.note)
    }
}

/// Selects the open items of one project that carry every listed tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuery {
    pub project_name: String,
    pub tags: Vec<String>,
}

impl ItemQuery {
    pub fn new(project_name: impl Into<String>, tags: Vec<String>) -> Self {
        Self { project_name: project_name.into(), tags }
    }

    /// Whether an item with these tags satisfies the tag filter.
    pub fn matches_tags<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.tags.iter().all(|wanted| tags.iter().any(|tag| tag.as_ref() == wanted))
    }
}
