//! Registry-backed artifact synchronizer.
//!
//! Rewrites the YAML entity registry so that it mirrors committed DDL: the
//! mapped column of each changed field, its column type, and the entity's
//! table name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::registry::{EntityRegistry, FieldDescriptor};
use crate::core::change::FieldChange;
use crate::core::traits::ArtifactSynchronizer;
use crate::error::{Result, SchemaSyncError};

/// Synchronizer that edits the entity registry file in place.
pub struct ManifestSynchronizer {
    path: PathBuf,
    // Serializes load-modify-save cycles on the file
    lock: Mutex<()>,
}

impl ManifestSynchronizer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Registry file this synchronizer rewrites.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ArtifactSynchronizer for ManifestSynchronizer {
    async fn sync(
        &self,
        qualified_entity_name: &str,
        new_table_name: Option<&str>,
        field_changes: &[FieldChange],
    ) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut registry = EntityRegistry::load(&self.path)
            .map_err(|e| SchemaSyncError::artifact(qualified_entity_name, e.to_string()))?;
        apply_changes(
            &mut registry,
            qualified_entity_name,
            new_table_name,
            field_changes,
        )?;
        registry
            .save(&self.path)
            .map_err(|e| SchemaSyncError::artifact(qualified_entity_name, e.to_string()))?;

        info!(
            "{}: registry {} updated ({} field change(s))",
            qualified_entity_name,
            self.path().display(),
            field_changes.len()
        );
        Ok(())
    }

    fn synchronizer_type(&self) -> &'static str {
        "manifest"
    }
}

/// Apply field changes to one entity of the registry.
///
/// A field that is not declared yet is added when the change names its
/// column. A change to an undeclared field that names no column is an
/// error, so the synchronizer never saves a partial update.
pub fn apply_changes(
    registry: &mut EntityRegistry,
    qualified_entity_name: &str,
    new_table_name: Option<&str>,
    field_changes: &[FieldChange],
) -> Result<()> {
    let entity = registry
        .find_by_name_mut(qualified_entity_name)
        .ok_or_else(|| {
            SchemaSyncError::artifact(qualified_entity_name, "entity not found in registry")
        })?;

    if let Some(table) = new_table_name.filter(|t| !t.trim().is_empty()) {
        debug!(
            "{}: table {} -> {}",
            qualified_entity_name, entity.table_name, table
        );
        entity.table_name = table.to_string();
    }

    for change in field_changes {
        match entity
            .fields
            .iter_mut()
            .find(|f| f.field_name == change.field_name)
        {
            Some(field) => {
                if let Some(column) = &change.new_column {
                    field.column_name = column.clone();
                }
                if let Some(column_type) = &change.new_type {
                    field.column_type = Some(column_type.clone());
                }
                if let Some(primary_key) = change.primary_key {
                    field.primary_key = primary_key;
                }
            }
            None => match &change.new_column {
                Some(column) => {
                    debug!(
                        "{}: adding field {} -> {}",
                        qualified_entity_name, change.field_name, column
                    );
                    entity.fields.push(FieldDescriptor {
                        field_name: change.field_name.clone(),
                        column_name: column.clone(),
                        field_type: String::new(),
                        column_type: change.new_type.clone(),
                        primary_key: change.primary_key.unwrap_or(false),
                    });
                }
                None => {
                    return Err(SchemaSyncError::artifact(
                        qualified_entity_name,
                        format!(
                            "field {} is not declared and the change names no column",
                            change.field_name
                        ),
                    ));
                }
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const REGISTRY: &str = r#"
entities:
  - qualifiedName: com.shop.Customer
    tableName: customer
    fields:
      - fieldName: id
        columnName: id
        type: Long
        primaryKey: true
      - fieldName: email
        columnName: email
        type: String
"#;

    fn rename(field: &str, column: &str) -> FieldChange {
        FieldChange {
            field_name: field.into(),
            new_column: Some(column.into()),
            new_type: None,
            primary_key: None,
        }
    }

    #[test]
    fn test_apply_changes_renames_column() {
        let mut registry = EntityRegistry::from_yaml(REGISTRY).unwrap();
        apply_changes(
            &mut registry,
            "com.shop.Customer",
            None,
            &[rename("email", "email_address")],
        )
        .unwrap();

        let entity = registry.find_by_name("com.shop.Customer").unwrap();
        assert_eq!(entity.field("email").unwrap().column_name, "email_address");
        assert_eq!(entity.table_name, "customer");
    }

    #[test]
    fn test_apply_changes_adds_field_and_renames_table() {
        let mut registry = EntityRegistry::from_yaml(REGISTRY).unwrap();
        let add = FieldChange {
            field_name: "nickname".into(),
            new_column: Some("nickname".into()),
            new_type: Some("VARCHAR(40)".into()),
            primary_key: None,
        };
        apply_changes(&mut registry, "com.shop.Customer", Some("client"), &[add]).unwrap();

        let entity = registry.find_by_name("com.shop.Customer").unwrap();
        assert_eq!(entity.table_name, "client");
        let field = entity.field("nickname").unwrap();
        assert_eq!(field.column_type.as_deref(), Some("VARCHAR(40)"));
    }

    #[test]
    fn test_apply_changes_sets_and_clears_primary_key() {
        let mut registry = EntityRegistry::from_yaml(REGISTRY).unwrap();
        let flag = |field: &str, primary_key| FieldChange {
            field_name: field.into(),
            new_column: None,
            new_type: None,
            primary_key: Some(primary_key),
        };
        apply_changes(
            &mut registry,
            "com.shop.Customer",
            None,
            &[flag("id", false), flag("email", true)],
        )
        .unwrap();

        let entity = registry.find_by_name("com.shop.Customer").unwrap();
        assert!(!entity.field("id").unwrap().primary_key);
        assert!(entity.field("email").unwrap().primary_key);

        // A plain rename leaves the flag alone
        apply_changes(
            &mut registry,
            "com.shop.Customer",
            None,
            &[rename("email", "contact")],
        )
        .unwrap();
        let entity = registry.find_by_name("com.shop.Customer").unwrap();
        assert!(entity.field("email").unwrap().primary_key);
    }

    #[test]
    fn test_apply_changes_retype_of_undeclared_field_fails() {
        let mut registry = EntityRegistry::from_yaml(REGISTRY).unwrap();
        let retype = FieldChange {
            field_name: "phone".into(),
            new_column: None,
            new_type: Some("VARCHAR(20)".into()),
            primary_key: None,
        };

        let err = apply_changes(&mut registry, "com.shop.Customer", None, &[retype]).unwrap_err();

        assert!(matches!(
            err,
            SchemaSyncError::ArtifactSync { ref message, .. } if message.contains("phone")
        ));
    }

    #[test]
    fn test_apply_changes_unknown_entity() {
        let mut registry = EntityRegistry::from_yaml(REGISTRY).unwrap();
        let err = apply_changes(&mut registry, "com.shop.Missing", None, &[]).unwrap_err();
        assert!(matches!(err, SchemaSyncError::ArtifactSync { .. }));
    }

    #[tokio::test]
    async fn test_sync_rewrites_registry_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entities.yaml");
        std::fs::write(&path, REGISTRY).unwrap();
        let sync = ManifestSynchronizer::new(&path);
        assert_eq!(sync.path(), path.as_path());

        sync.sync("com.shop.Customer", None, &[rename("email", "contact")])
            .await
            .unwrap();

        let reloaded = EntityRegistry::load(&path).unwrap();
        let entity = reloaded.find_by_name("com.shop.Customer").unwrap();
        assert_eq!(entity.field("email").unwrap().column_name, "contact");
        assert_eq!(entity.field("id").unwrap().field_type, "Long");
    }

    #[tokio::test]
    async fn test_sync_missing_file_fails() {
        let dir = tempdir().unwrap();
        let sync = ManifestSynchronizer::new(dir.path().join("absent.yaml"));
        let err = sync
            .sync("com.shop.Customer", None, &[rename("email", "contact")])
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaSyncError::ArtifactSync { .. }));
    }
}
