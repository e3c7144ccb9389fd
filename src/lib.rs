//! # OmniSync
//!
//! Keep a task manager in step with the issues tracked elsewhere.
//!
//! OmniSync reads the items each configured source says should exist, asks the
//! target application which items it currently holds, and reconciles the two
//! into a plan of additions and removals that an applier carries out.
//!
//! ## Layout
//!
//! - [`core`]: the pure reconciliation engine (`Keyed`, `KeyedSet`, `reconcile`)
//! - [`model`]: items, projects and source response mappings
//! - [`config`]: the configuration directory and settings file
//! - [`sync`]: sync passes, collaborator traits and concrete collaborators
//!
//! ## Quick Start
//!
//! ```bash
//! # Show what a sync would change
//! omnisync plan --desired desired.json --observed observed.json
//!
//! # Sync saved source responses into a task file
//! omnisync sync --responses ./responses --state tasks.json
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]

pub mod config;
pub mod core;
pub mod model;
pub mod sync;

// Re-export commonly used types
pub use config::{load_projects, load_sources, Config, ConfigError};
pub use core::{reconcile, Change, ChangeKind, ChangeSummary, Keyed, KeyedSet};
pub use model::{DesiredItem, ItemQuery, ObservedItem, Project, Source};
pub use sync::{
    Applier, ApplyPolicy, DesiredStateProvider, ObservedStateProvider, SyncError, SyncPass,
    SyncReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "omnisync";
