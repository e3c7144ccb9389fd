//! Dispatching reconciled changes to an [`Applier`].

use serde::{Deserialize, Serialize};

use super::{Applier, SyncError};
use crate::core::{Change, ChangeKind};
use crate::model::{DesiredItem, ObservedItem};

/// What to do when applying a change fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyPolicy {
    /// Stop at the first failure and leave the remaining changes unapplied.
    #[default]
    FailFast,
    /// Record the failure and move on to the next change.
    Continue,
}

/// A change that could not be applied.
#[derive(Debug)]
pub struct ApplyFailure {
    pub kind: ChangeKind,
    /// Display form of the change
    pub change: String,
    pub error: SyncError,
}

/// Outcome of applying one plan.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Items the applier created
    pub created: Vec<ObservedItem>,
    /// Items the applier completed
    pub completed: Vec<ObservedItem>,
    /// Changes that failed
    pub failures: Vec<ApplyFailure>,
    /// Changes never attempted because an earlier one failed
    pub skipped: usize,
}

impl ApplyReport {
    /// Number of changes applied successfully.
    pub fn applied(&self) -> usize {
        self.created.len() + self.completed.len()
    }

    /// Whether every change was applied.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

/// Apply changes in order: `Add` creates, `Remove` completes.
///
/// Under [`ApplyPolicy::FailFast`] the first failure stops processing and the
/// rest are counted as skipped; under [`ApplyPolicy::Continue`] every change
/// is attempted. The change list itself is never modified.
pub async fn apply_changes(
    applier: &dyn Applier,
    changes: &[Change<DesiredItem, ObservedItem>],
    policy: ApplyPolicy,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for (index, change) in changes.iter().enumerate() {
        let outcome = match change {
            Change::Add(item) => applier.create(item).await.map(|created| {
                tracing::info!(item = %created, "Created item");
                report.created.push(created);
            }),
            Change::Remove(item) => applier.complete(item).await.map(|()| {
                tracing::info!(item = %item, "Completed item");
                report.completed.push(item.clone());
            }),
        };

        if let Err(error) = outcome {
            tracing::warn!(change = %change, error = %error, "Failed to apply change");
            report.failures.push(ApplyFailure {
                kind: change.kind(),
                change: change.to_string(),
                error,
            });

            if policy == ApplyPolicy::FailFast {
                report.skipped = changes.len() - index - 1;
                break;
            }
        }
    }

    report
}
