//! Projects: where items from a source land in the target application.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connects a source URL prefix to a project in the target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// URL prefix shared by every item belonging to this project
    #[serde(rename = "URL")]
    pub url: String,
    /// Project name in the target application
    #[serde(rename = "OFName", alias = "Name")]
    pub name: String,
}

impl Project {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self { url: url.into(), name: name.into() }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.url)
    }
}

/// Result type for project lookups.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Error types for project lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectError {
    #[error("project `{0}` does not exist")]
    NotFound(String),

    #[error("URL {0} does not match any projects")]
    NoMatch(String),
}

/// Find the project with exactly this name.
pub fn find_project<'a>(name: &str, projects: &'a [Project]) -> ProjectResult<&'a Project> {
    projects
        .iter()
        .find(|project| project.name == name)
        .ok_or_else(|| ProjectError::NotFound(name.to_string()))
}

/// Find the first project whose URL occurs within `url`.
///
/// A project with an empty URL matches everything, so placed last it acts as
/// a catch-all.
pub fn project_for_url<'a>(url: &str, projects: &'a [Project]) -> ProjectResult<&'a Project> {
    projects
        .iter()
        .find(|project| url.contains(&project.url))
        .ok_or_else(|| ProjectError::NoMatch(url.to_string()))
}
