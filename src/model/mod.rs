//! Domain types shared by the sync collaborators.

pub mod item;
pub mod project;
pub mod source;

pub use item::{DesiredItem, ItemQuery, ObservedItem};
pub use project::{find_project, project_for_url, Project, ProjectError, ProjectResult};
pub use source::{collect_tags, Header, ResponseMapping, Source, SourceError, SourceResult};
