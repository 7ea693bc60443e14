//! No-op synchronizer for runs without an entity registry.
//!
//! Linked requests still pass the gate, but nothing is written.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::warn;

use crate::core::change::FieldChange;
use crate::core::traits::ArtifactSynchronizer;
use crate::error::Result;

/// Synchronizer that accepts every change and persists nothing.
///
/// Logs a warning on first use.
pub struct NoopSynchronizer {
    warned: AtomicBool,
}

impl NoopSynchronizer {
    pub fn new() -> Self {
        Self {
            warned: AtomicBool::new(false),
        }
    }
}

impl Default for NoopSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactSynchronizer for NoopSynchronizer {
    async fn sync(
        &self,
        qualified_entity_name: &str,
        _new_table_name: Option<&str>,
        _field_changes: &[FieldChange],
    ) -> Result<()> {
        if !self.warned.swap(true, Ordering::SeqCst) {
            warn!(
                "No artifact registry configured: changes for {} (and any later entity) \
                 are not persisted",
                qualified_entity_name
            );
        }
        Ok(())
    }

    fn synchronizer_type(&self) -> &'static str {
        "noop"
    }
}
