//! Configuration validation.

use super::Config;
use crate::error::{Result, SchemaSyncError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.database.host.is_empty() {
        return Err(SchemaSyncError::Config("database.host is required".into()));
    }
    if config.database.database.is_empty() {
        return Err(SchemaSyncError::Config(
            "database.database is required".into(),
        ));
    }
    if config.database.user.is_empty() {
        return Err(SchemaSyncError::Config("database.user is required".into()));
    }
    if let Some(0) = config.database.port {
        return Err(SchemaSyncError::Config(
            "database.port must be greater than 0".into(),
        ));
    }
    if let Some(0) = config.database.connect_timeout_secs {
        return Err(SchemaSyncError::Config(
            "database.connect_timeout_secs must be at least 1".into(),
        ));
    }

    // Batch config validation - only check if explicitly set
    if let Some(0) = config.batch.workers {
        return Err(SchemaSyncError::Config(
            "batch.workers must be at least 1".into(),
        ));
    }
    if let Some(0) = config.batch.max_connections {
        return Err(SchemaSyncError::Config(
            "batch.max_connections must be at least 1".into(),
        ));
    }

    if let Some(ref registry) = config.artifacts.registry {
        if registry.as_os_str().is_empty() {
            return Err(SchemaSyncError::Config(
                "artifacts.registry must not be empty when set".into(),
            ));
        }
    }

    Ok(())
}
