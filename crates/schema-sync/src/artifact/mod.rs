//! Artifact side of a batch: the entity registry and the synchronizers that
//! mirror committed DDL into it.

pub mod manifest;
pub mod noop;
pub mod registry;

pub use manifest::ManifestSynchronizer;
pub use noop::NoopSynchronizer;
pub use registry::{EntityDescriptor, EntityRegistry, FieldDescriptor};

use std::sync::Arc;

use crate::config::ArtifactConfig;
use crate::core::traits::ArtifactSynchronizer;

/// Pick the synchronizer for a configuration: the registry file when one is
/// configured, otherwise the no-op.
pub fn create_synchronizer(config: &ArtifactConfig) -> Arc<dyn ArtifactSynchronizer> {
    match &config.registry {
        Some(path) => Arc::new(ManifestSynchronizer::new(path.clone())),
        None => Arc::new(NoopSynchronizer::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_synchronizer() {
        let none = ArtifactConfig::default();
        assert_eq!(create_synchronizer(&none).synchronizer_type(), "noop");

        let registry = ArtifactConfig {
            registry: Some("entities.yaml".into()),
        };
        assert_eq!(create_synchronizer(&registry).synchronizer_type(), "manifest");
    }
}
