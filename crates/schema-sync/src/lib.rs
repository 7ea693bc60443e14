//! # schema-sync
//!
//! Column-level schema changes applied per table, atomically, with the
//! entity artifact kept in step.
//!
//! This library provides:
//!
//! - **DDL synthesis** for PostgreSQL and H2 (rename, retype, add column)
//! - **Per-table transactions**: a table's statements commit together or not at all
//! - **Parallel tables** with a configurable worker pool
//! - **Artifact gating**: only committed tables reach the entity registry
//!
//! ## Example
//!
//! ```rust,no_run
//! use schema_sync::{load_changes, Config, Orchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> schema_sync::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let changes = load_changes("changes.csv".as_ref(), None)?;
//!     let orchestrator = Orchestrator::from_config(&config)?;
//!     let report = orchestrator.run(&changes, &CancellationToken::new()).await;
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod applier;
pub mod artifact;
pub mod config;
pub mod core;
pub mod ddl;
pub mod drivers;
pub mod error;
pub mod orchestrator;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use artifact::{EntityRegistry, ManifestSynchronizer, NoopSynchronizer};
pub use config::{ArtifactConfig, BatchConfig, Config, DatabaseConfig};
pub use self::core::{
    load_changes, parse_changes, ArtifactSynchronizer, ChangeFormat, ChangeKind, ChangeRequest,
    ConnectionFactory, DdlConnection, Dialect, FieldChange, GatingDecision, TableOutcome,
};
pub use drivers::{DialectImpl, DialectKind, PgConnectionFactory};
pub use error::{Result, SchemaSyncError};
pub use orchestrator::{BatchReport, Orchestrator, TablePlan};
