//! Core abstractions for column-level schema changes.
//!
//! - [`change`]: change requests and their classification
//! - [`input`]: loading change batches from files
//! - [`outcome`]: per-table DDL outcomes and gating decisions
//! - [`identifier`]: identifier quoting and type literal validation
//! - [`traits`]: dialect, connection and synchronizer boundaries
//!
//! Engine-specific code lives in `drivers`; the artifact side lives in
//! `artifact`. Nothing in this module performs I/O except [`input`].

pub mod change;
pub mod identifier;
pub mod input;
pub mod outcome;
pub mod traits;

pub use change::{ChangeKind, ChangeRequest, FieldChange};
pub use input::{load_changes, parse_changes, ChangeFormat};
pub use outcome::{GatingDecision, SyncStatus, TableOutcome};
pub use traits::{ArtifactSynchronizer, ConnectionFactory, DdlConnection, Dialect};
