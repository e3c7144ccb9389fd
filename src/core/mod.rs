//! Reconciliation engine.
//!
//! Pure and synchronous: turns a desired and an observed collection of
//! keyed items into the list of changes that brings the observed side in
//! line. Nothing in here performs I/O or logs.

mod change;
mod keyed;
mod reconcile;

pub use change::{partition, Change, ChangeKind, ChangeSummary};
pub use keyed::{Keyed, KeyedSet};
pub use reconcile::{reconcile, reconcile_items};
