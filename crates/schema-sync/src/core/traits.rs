//! Core traits at the boundaries of the schema change engine.
//!
//! - [`Dialect`]: SQL syntax strategy for one engine family
//! - [`ConnectionFactory`] / [`DdlConnection`]: scoped database access
//! - [`ArtifactSynchronizer`]: mirrors committed changes into an artifact
//!
//! # Design Patterns
//!
//! - **Strategy**: `Dialect` implementations provide interchangeable DDL syntax
//! - **Abstract Factory**: `ConnectionFactory` hands out private connections

use async_trait::async_trait;

use super::change::FieldChange;
use crate::error::Result;

/// SQL syntax strategy for column DDL.
///
/// All arguments are already-quoted identifiers and validated type literals;
/// implementations only arrange them.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "postgres", "h2").
    fn name(&self) -> &str;

    /// Longest identifier, in bytes, the engine keeps without truncating.
    fn max_identifier_len(&self) -> usize;

    /// Type used for an added column when the request names none.
    fn default_column_type(&self) -> &str;

    /// `ALTER TABLE .. ADD COLUMN ..`
    fn add_column(&self, table: &str, column: &str, data_type: &str) -> String;

    /// Rename a column.
    fn rename_column(&self, table: &str, column: &str, new_column: &str) -> String;

    /// Change the type of a column.
    fn retype_column(&self, table: &str, column: &str, data_type: &str) -> String;

    /// Statement that opens an explicit transaction.
    fn begin_transaction(&self) -> &str {
        "BEGIN"
    }
}

/// A connection private to one table's unit of work.
///
/// Dropping the connection releases it back to its factory.
#[async_trait]
pub trait DdlConnection: Send {
    /// Whether the session is in implicit auto-commit mode.
    fn is_auto_commit(&self) -> bool;

    /// Leave auto-commit mode by opening an explicit transaction.
    async fn begin(&mut self, begin_sql: &str) -> Result<()>;

    /// Execute one DDL statement.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Commit the open transaction and return to auto-commit mode.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction and return to auto-commit mode.
    async fn rollback(&mut self) -> Result<()>;
}

/// Hands out database connections.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Acquire a connection. Errors are reported as `FAILED_CONNECTION`.
    async fn acquire(&self) -> Result<Box<dyn DdlConnection>>;

    /// Identifier of the backing engine (for logging).
    fn db_type(&self) -> &str;
}

/// Mirrors committed column changes into a structured artifact.
///
/// The engine never inspects the artifact; it only forwards normalized
/// field changes for one entity.
#[async_trait]
pub trait ArtifactSynchronizer: Send + Sync {
    async fn sync(
        &self,
        qualified_entity_name: &str,
        new_table_name: Option<&str>,
        field_changes: &[FieldChange],
    ) -> Result<()>;

    /// Get the synchronizer type name for logging/debugging.
    fn synchronizer_type(&self) -> &'static str;
}
