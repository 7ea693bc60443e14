//! H2 SQL dialect (Strategy pattern).

use crate::core::traits::Dialect;

/// H2 dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct H2Dialect;

impl H2Dialect {
    /// Create a new H2 dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for H2Dialect {
    fn name(&self) -> &str {
        "h2"
    }

    fn max_identifier_len(&self) -> usize {
        256
    }

    fn default_column_type(&self) -> &str {
        "VARCHAR(255)"
    }

    fn add_column(&self, table: &str, column: &str, data_type: &str) -> String {
        format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, data_type)
    }

    fn rename_column(&self, table: &str, column: &str, new_column: &str) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} RENAME TO {}",
            table, column, new_column
        )
    }

    fn retype_column(&self, table: &str, column: &str, data_type: &str) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {}",
            table, column, data_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_column() {
        let dialect = H2Dialect::new();
        assert_eq!(
            dialect.rename_column("\"customer\"", "\"email\"", "\"email_address\""),
            "ALTER TABLE \"customer\" ALTER COLUMN \"email\" RENAME TO \"email_address\""
        );
    }

    #[test]
    fn test_retype_column() {
        let dialect = H2Dialect::new();
        assert_eq!(
            dialect.retype_column("\"customer\"", "\"email\"", "VARCHAR(320)"),
            "ALTER TABLE \"customer\" ALTER COLUMN \"email\" SET DATA TYPE VARCHAR(320)"
        );
    }

    #[test]
    fn test_max_identifier_len() {
        assert_eq!(H2Dialect::new().max_identifier_len(), 256);
    }
}
