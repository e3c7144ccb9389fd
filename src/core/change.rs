//! Change records produced by reconciliation.

use std::fmt;

use serde::Serialize;

use super::keyed::Keyed;

/// Which way a change moves the observed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The item should be created.
    Add,
    /// The item should be retired.
    Remove,
}

impl ChangeKind {
    /// Single-character marker used in plan listings.
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Remove => '-',
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// A single operation against the observed state.
///
/// `Add` carries the desired-side item that should be created and `Remove`
/// carries the observed-side item that should be retired, so a caller
/// recovers the concrete payload by matching on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum Change<D, O> {
    /// Create this desired item.
    Add(D),
    /// Retire this observed item.
    Remove(O),
}

impl<D, O> Change<D, O> {
    /// The change kind.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Add(_) => ChangeKind::Add,
            Self::Remove(_) => ChangeKind::Remove,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add(_))
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove(_))
    }

    /// The desired item, if this is an `Add`.
    pub fn as_add(&self) -> Option<&D> {
        match self {
            Self::Add(item) => Some(item),
            Self::Remove(_) => None,
        }
    }

    /// The observed item, if this is a `Remove`.
    pub fn as_remove(&self) -> Option<&O> {
        match self {
            Self::Add(_) => None,
            Self::Remove(item) => Some(item),
        }
    }
}

impl<D: Keyed, O: Keyed> Change<D, O> {
    /// Identity key of the carried item.
    pub fn identity_key(&self) -> String {
        match self {
            Self::Add(item) => item.identity_key(),
            Self::Remove(item) => item.identity_key(),
        }
    }
}

impl<D: fmt::Display, O: fmt::Display> fmt::Display for Change<D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(item) => write!(f, "{} {}", ChangeKind::Add.symbol(), item),
            Self::Remove(item) => write!(f, "{} {}", ChangeKind::Remove.symbol(), item),
        }
    }
}

/// Counts of each change kind in a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub adds: usize,
    pub removes: usize,
}

impl ChangeSummary {
    /// Tally a sequence of changes.
    pub fn of<'a, D: 'a, O: 'a>(changes: impl IntoIterator<Item = &'a Change<D, O>>) -> Self {
        changes.into_iter().fold(Self::default(), |mut summary, change| {
            match change.kind() {
                ChangeKind::Add => summary.adds += 1,
                ChangeKind::Remove => summary.removes += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.adds + self.removes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} change(s): {} add, {} remove", self.total(), self.adds, self.removes)
    }
}

/// Split a plan into the items to create and the items to retire,
/// preserving order within each side.
pub fn partition<D, O>(changes: impl IntoIterator<Item = Change<D, O>>) -> (Vec<D>, Vec<O>) {
    let mut adds = Vec::new();
    let mut removes = Vec::new();
    for change in changes {
        match change {
            Change::Add(item) => adds.push(item),
            Change::Remove(item) => removes.push(item),
        }
    }
    (adds, removes)
}
