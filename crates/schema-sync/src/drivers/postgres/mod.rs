//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: DDL syntax strategy for PostgreSQL
//! - [`PgConnectionFactory`]: pooled PostgreSQL-wire connections

mod connection;
mod dialect;

pub use connection::{PgConnection, PgConnectionFactory};
pub use dialect::PostgresDialect;
