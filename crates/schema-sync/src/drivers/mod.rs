//! Database driver implementations.
//!
//! - [`postgres`]: PostgreSQL dialect and the PostgreSQL-wire connection factory
//! - [`h2`]: H2 dialect (H2 is reached through its PostgreSQL-wire server,
//!   so it shares the connection factory)
//!
//! # Static dispatch
//!
//! The set of dialects is closed and chosen once from configuration. Instead
//! of `Box<dyn Dialect>`, [`DialectImpl`] wraps each strategy in an enum
//! variant and forwards trait calls with a match.

pub mod h2;
pub mod postgres;

pub use h2::H2Dialect;
pub use postgres::{PgConnectionFactory, PostgresDialect};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::traits::Dialect;
use crate::error::SchemaSyncError;

/// Supported SQL dialect families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// PostgreSQL and wire-compatible engines.
    #[default]
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    /// H2 and similar embedded engines.
    H2,
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Postgres => f.write_str("postgres"),
            DialectKind::H2 => f.write_str("h2"),
        }
    }
}

impl FromStr for DialectKind {
    type Err = SchemaSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "h2" => Ok(DialectKind::H2),
            other => Err(SchemaSyncError::Config(format!(
                "Unknown dialect: '{}'. Supported dialects: postgres, h2",
                other
            ))),
        }
    }
}

/// Enum-based static dispatch for dialects.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Postgres(PostgresDialect),
    H2(H2Dialect),
}

impl DialectImpl {
    /// Create the dialect strategy for a configured dialect kind.
    pub fn new(kind: DialectKind) -> Self {
        match kind {
            DialectKind::Postgres => DialectImpl::Postgres(PostgresDialect::new()),
            DialectKind::H2 => DialectImpl::H2(H2Dialect::new()),
        }
    }

    pub fn kind(&self) -> DialectKind {
        match self {
            DialectImpl::Postgres(_) => DialectKind::Postgres,
            DialectImpl::H2(_) => DialectKind::H2,
        }
    }
}

impl From<DialectKind> for DialectImpl {
    fn from(kind: DialectKind) -> Self {
        DialectImpl::new(kind)
    }
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Postgres(d) => d.name(),
            DialectImpl::H2(d) => d.name(),
        }
    }

    fn max_identifier_len(&self) -> usize {
        match self {
            DialectImpl::Postgres(d) => d.max_identifier_len(),
            DialectImpl::H2(d) => d.max_identifier_len(),
        }
    }

    fn default_column_type(&self) -> &str {
        match self {
            DialectImpl::Postgres(d) => d.default_column_type(),
            DialectImpl::H2(d) => d.default_column_type(),
        }
    }

    fn add_column(&self, table: &str, column: &str, data_type: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.add_column(table, column, data_type),
            DialectImpl::H2(d) => d.add_column(table, column, data_type),
        }
    }

    fn rename_column(&self, table: &str, column: &str, new_column: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.rename_column(table, column, new_column),
            DialectImpl::H2(d) => d.rename_column(table, column, new_column),
        }
    }

    fn retype_column(&self, table: &str, column: &str, data_type: &str) -> String {
        match self {
            DialectImpl::Postgres(d) => d.retype_column(table, column, data_type),
            DialectImpl::H2(d) => d.retype_column(table, column, data_type),
        }
    }

    fn begin_transaction(&self) -> &str {
        match self {
            DialectImpl::Postgres(d) => d.begin_transaction(),
            DialectImpl::H2(d) => d.begin_transaction(),
        }
    }
}
