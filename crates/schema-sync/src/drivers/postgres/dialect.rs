//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Column type changes carry an explicit `USING col::type` cast so that
//! conversions PostgreSQL will not perform implicitly (text to integer, etc.)
//! still apply.

use crate::core::traits::Dialect;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn max_identifier_len(&self) -> usize {
        // NAMEDATALEN - 1
        63
    }

    fn default_column_type(&self) -> &str {
        "TEXT"
    }

    fn add_column(&self, table: &str, column: &str, data_type: &str) -> String {
        format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, data_type)
    }

    fn rename_column(&self, table: &str, column: &str, new_column: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            table, column, new_column
        )
    }

    fn retype_column(&self, table: &str, column: &str, data_type: &str) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{}",
            table, column, data_type, column, data_type
        )
    }
}
