//! PostgreSQL-wire connection factory.
//!
//! Uses deadpool-postgres for pooling. Each table checks out its own pooled
//! client; dropping the [`PgConnection`] returns the client to the pool on
//! every exit path.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::traits::{ConnectionFactory, DdlConnection};
use crate::error::{Result, SchemaSyncError};

/// Pooled connections to a PostgreSQL-wire server.
pub struct PgConnectionFactory {
    pool: Pool,
    db_type: String,
}

impl PgConnectionFactory {
    /// Create a connection pool from configuration.
    ///
    /// The pool connects lazily, so a database that is down surfaces as
    /// `FAILED_CONNECTION` per table rather than as a batch-level error.
    pub fn new(config: &DatabaseConfig, max_conns: usize) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.get_port());
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        // Connection options for reliability
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(Duration::from_secs(config.get_connect_timeout_secs()));

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(max_conns)
            .build()
            .map_err(|e| SchemaSyncError::pool(e, "creating connection pool"))?;

        info!(
            "Configured {} connection pool: {}:{}/{} (max {} connections)",
            config.dialect,
            config.host,
            config.get_port(),
            config.database,
            max_conns
        );

        Ok(Self {
            pool,
            db_type: config.dialect.to_string(),
        })
    }

    /// Check out a connection and run `SELECT 1`.
    pub async fn test_connection(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SchemaSyncError::Connection(e.to_string()))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| SchemaSyncError::Connection(pg_message(&e)))?;
        Ok(())
    }
}

#[async_trait]
impl ConnectionFactory for PgConnectionFactory {
    async fn acquire(&self) -> Result<Box<dyn DdlConnection>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SchemaSyncError::Connection(e.to_string()))?;
        Ok(Box::new(PgConnection {
            client,
            in_transaction: false,
        }))
    }

    fn db_type(&self) -> &str {
        &self.db_type
    }
}

/// A pooled client scoped to one table.
pub struct PgConnection {
    client: Object,
    in_transaction: bool,
}

#[async_trait]
impl DdlConnection for PgConnection {
    fn is_auto_commit(&self) -> bool {
        !self.in_transaction
    }

    async fn begin(&mut self, begin_sql: &str) -> Result<()> {
        self.client
            .batch_execute(begin_sql)
            .await
            .map_err(|e| SchemaSyncError::Transaction(format!("begin: {}", pg_message(&e))))?;
        self.in_transaction = true;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("Executing: {}", sql);
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| SchemaSyncError::statement(sql, pg_message(&e)))
    }

    async fn commit(&mut self) -> Result<()> {
        let result = self.client.batch_execute("COMMIT").await;
        // A failed COMMIT ends the transaction on the server as well
        self.in_transaction = false;
        result.map_err(|e| SchemaSyncError::Transaction(format!("commit: {}", pg_message(&e))))
    }

    async fn rollback(&mut self) -> Result<()> {
        let result = self.client.batch_execute("ROLLBACK").await;
        self.in_transaction = false;
        result.map_err(|e| SchemaSyncError::Transaction(format!("rollback: {}", pg_message(&e))))
    }
}

/// Prefer the server's message over the driver's generic wrapper text.
fn pg_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => db.message().to_string(),
        None => err.to_string(),
    }
}
