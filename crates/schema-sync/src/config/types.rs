//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::drivers::DialectKind;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database configuration.
    pub database: DatabaseConfig,

    /// Batch execution configuration.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Artifact synchronization configuration.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
}

/// Database connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQL dialect used for DDL synthesis (postgres or h2).
    #[serde(default)]
    pub dialect: DialectKind,

    /// Database host.
    pub host: String,

    /// Database port (default: 5432 for postgres, 5435 for the H2 pg server).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password. Never serialized.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Connect timeout in seconds (default: 30).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    /// Effective port, falling back to the dialect default.
    pub fn get_port(&self) -> u16 {
        self.port.unwrap_or(match self.dialect {
            DialectKind::Postgres => 5432,
            DialectKind::H2 => 5435,
        })
    }

    pub fn get_connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs.unwrap_or(30)
    }
}

/// Batch execution configuration.
/// Fields use Option<T> to distinguish "not set" from "explicitly set".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchConfig {
    /// Number of tables processed concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Maximum pooled connections. Defaults to twice the workers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<usize>,
}

impl BatchConfig {
    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(4)
    }

    pub fn get_max_connections(&self) -> usize {
        self.max_connections
            .unwrap_or_else(|| (self.get_workers() * 2).max(2))
    }
}

/// Artifact synchronization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArtifactConfig {
    /// Path to the YAML entity registry. When set, the registry is used to
    /// fill missing linkage and is rewritten after successful DDL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
}
