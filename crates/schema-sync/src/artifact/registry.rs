//! YAML entity registry.
//!
//! The registry is the structured artifact that mirrors table columns as
//! entity fields. It is declared explicitly instead of discovered at runtime:
//!
//! ```yaml
//! entities:
//!   - qualifiedName: com.shop.Customer
//!     tableName: customer
//!     fields:
//!       - fieldName: id
//!         columnName: id
//!         type: Long
//!         primaryKey: true
//!       - fieldName: email
//!         columnName: email
//!         type: String
//!         columnType: VARCHAR(255)
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::change::ChangeRequest;
use crate::error::{Result, SchemaSyncError};

/// All entities known to the artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRegistry {
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

/// One entity and the table it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub qualified_name: String,
    pub table_name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// One persisted field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub field_name: String,
    pub column_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
}

impl EntityRegistry {
    /// Load the registry from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse the registry from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let registry: EntityRegistry = serde_yaml::from_str(yaml)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Reject duplicate entity names and entities without a table.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entity in &self.entities {
            if entity.qualified_name.trim().is_empty() {
                return Err(SchemaSyncError::Config(
                    "registry entity with empty qualifiedName".into(),
                ));
            }
            if entity.table_name.trim().is_empty() {
                return Err(SchemaSyncError::Config(format!(
                    "registry entity {} has no tableName",
                    entity.qualified_name
                )));
            }
            if !seen.insert(entity.qualified_name.as_str()) {
                return Err(SchemaSyncError::Config(format!(
                    "registry entity {} is declared twice",
                    entity.qualified_name
                )));
            }
        }
        Ok(())
    }

    /// Write the registry atomically (temp file, then rename).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn find_by_name(&self, qualified_name: &str) -> Option<&EntityDescriptor> {
        self.entities
            .iter()
            .find(|e| e.qualified_name == qualified_name)
    }

    pub fn find_by_name_mut(&mut self, qualified_name: &str) -> Option<&mut EntityDescriptor> {
        self.entities
            .iter_mut()
            .find(|e| e.qualified_name == qualified_name)
    }

    /// Table names compare case-insensitively, as unquoted SQL names do.
    pub fn find_by_table(&self, table: &str) -> Option<&EntityDescriptor> {
        self.entities
            .iter()
            .find(|e| e.table_name.eq_ignore_ascii_case(table))
    }

    /// Fill missing entity linkage on requests from the registry.
    ///
    /// Requests that already name an entity are left alone. The field is
    /// resolved by column name; an add (no existing column) gets a field
    /// named after the new column. Returns how many requests were linked.
    pub fn enrich(&self, changes: &mut [ChangeRequest]) -> usize {
        let mut linked = 0;
        for change in changes.iter_mut() {
            if change.entity().is_some() {
                continue;
            }
            let Some(entity) = self.find_by_table(&change.table) else {
                continue;
            };
            change.qualified_entity_name = Some(entity.qualified_name.clone());
            if change.field().is_none() {
                change.field_name = if change.column.is_empty() {
                    Some(change.new_column.clone())
                } else {
                    entity
                        .field_by_column(&change.column)
                        .map(|f| f.field_name.clone())
                };
            }
            debug!(
                "{}.{}: linked to {}",
                change.table, change.column, entity.qualified_name
            );
            linked += 1;
        }
        linked
    }
}

impl EntityDescriptor {
    pub fn field(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.column_name.eq_ignore_ascii_case(column))
    }
}
