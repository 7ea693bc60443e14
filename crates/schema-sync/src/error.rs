//! Error types for the schema-sync library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for connection and pool errors.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code when at least one table failed its DDL phase.
pub const EXIT_DDL_FAILED: u8 = 3;
/// Exit code when at least one artifact sync failed.
pub const EXIT_SYNC_FAILED: u8 = 4;
/// Exit code for a cancelled batch.
pub const EXIT_CANCELLED: u8 = 5;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for schema change operations.
#[derive(Error, Debug)]
pub enum SchemaSyncError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A change request carries an identifier or type literal that cannot be
    /// placed into DDL.
    #[error("Invalid change for {table}.{column}: {message}")]
    InvalidChange {
        table: String,
        column: String,
        message: String,
    },

    /// A change request matches no supported change kind.
    #[error("Unsupported change: {table}/{column}")]
    UnsupportedChange { table: String, column: String },

    /// Connection acquisition failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A DDL statement failed inside a table transaction.
    #[error("Statement failed: {message}\n  Statement: {statement}")]
    Statement { statement: String, message: String },

    /// Transaction control (BEGIN/COMMIT/ROLLBACK) failed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The artifact synchronizer could not apply the changes.
    #[error("Artifact sync failed for {entity}: {message}")]
    ArtifactSync { entity: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Batch was cancelled (SIGINT, etc.)
    #[error("Batch cancelled")]
    Cancelled,
}

impl SchemaSyncError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        SchemaSyncError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create an InvalidChange error
    pub fn invalid_change(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SchemaSyncError::InvalidChange {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a Statement error
    pub fn statement(statement: impl Into<String>, message: impl ToString) -> Self {
        SchemaSyncError::Statement {
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    /// Create an ArtifactSync error
    pub fn artifact(entity: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaSyncError::ArtifactSync {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SchemaSyncError::Config(_)
            | SchemaSyncError::Yaml(_)
            | SchemaSyncError::Json(_)
            | SchemaSyncError::Csv(_) => EXIT_CONFIG_ERROR,
            SchemaSyncError::Connection(_) | SchemaSyncError::Pool { .. } => EXIT_CONNECTION_ERROR,
            SchemaSyncError::InvalidChange { .. }
            | SchemaSyncError::UnsupportedChange { .. }
            | SchemaSyncError::Statement { .. }
            | SchemaSyncError::Transaction(_) => EXIT_DDL_FAILED,
            SchemaSyncError::ArtifactSync { .. } => EXIT_SYNC_FAILED,
            SchemaSyncError::Cancelled => EXIT_CANCELLED,
            SchemaSyncError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for schema-sync operations.
pub type Result<T> = std::result::Result<T, SchemaSyncError>;
