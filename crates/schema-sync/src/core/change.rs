//! Change requests and their classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One caller-supplied column-level schema change.
///
/// Empty strings and missing values are treated alike: `column`, `new_column`
/// and `new_type` are "absent" when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    /// Target table.
    pub table: String,

    /// Existing column name. Empty when adding a column.
    #[serde(default)]
    pub column: String,

    /// New column name. Empty when not renaming.
    #[serde(default)]
    pub new_column: String,

    /// New dialect-specific type literal. Empty when not retyping.
    #[serde(default)]
    pub new_type: String,

    /// Primary-key flag for the mapped field (artifact sync only). Absent
    /// leaves the field's flag untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<bool>,

    /// Qualified name of the entity mirroring this table.
    #[serde(default, alias = "qualifiedName", skip_serializing_if = "Option::is_none")]
    pub qualified_entity_name: Option<String>,

    /// Field on the entity mirroring this column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    /// New table name for the entity. Only forwarded to the artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_table_name: Option<String>,
}

/// The kind of change a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Rename,
    RenameAndRetype,
    Retype,
    Add,
    Invalid,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Rename => "RENAME",
            ChangeKind::RenameAndRetype => "RENAME_AND_RETYPE",
            ChangeKind::Retype => "RETYPE",
            ChangeKind::Add => "ADD",
            ChangeKind::Invalid => "INVALID",
        };
        f.write_str(s)
    }
}

impl ChangeRequest {
    /// Create a request with no linkage.
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        new_column: impl Into<String>,
        new_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            new_column: new_column.into(),
            new_type: new_type.into(),
            ..Default::default()
        }
    }

    /// Attach entity linkage used to route the artifact sync.
    pub fn with_entity(
        mut self,
        qualified_entity_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        self.qualified_entity_name = Some(qualified_entity_name.into());
        self.field_name = Some(field_name.into());
        self
    }

    /// Classify the request.
    ///
    /// An empty `column` can only be an add. Renames are checked before a
    /// plain retype so that a request carrying both resolves to
    /// [`ChangeKind::RenameAndRetype`].
    pub fn kind(&self) -> ChangeKind {
        if self.table.trim().is_empty() {
            return ChangeKind::Invalid;
        }

        let has_column = !self.column.is_empty();
        let has_new_column = !self.new_column.is_empty();
        let has_new_type = !self.new_type.trim().is_empty();

        if !has_column {
            return if has_new_column {
                ChangeKind::Add
            } else {
                ChangeKind::Invalid
            };
        }

        if has_new_column && self.new_column != self.column {
            return if has_new_type {
                ChangeKind::RenameAndRetype
            } else {
                ChangeKind::Rename
            };
        }

        if has_new_type {
            ChangeKind::Retype
        } else {
            ChangeKind::Invalid
        }
    }

    /// Name the column carries once this change is applied.
    pub fn resulting_column(&self) -> &str {
        if self.new_column.is_empty() {
            &self.column
        } else {
            &self.new_column
        }
    }

    /// Non-empty qualified entity name, if any.
    pub fn entity(&self) -> Option<&str> {
        non_empty(self.qualified_entity_name.as_deref())
    }

    /// Non-empty field name, if any.
    pub fn field(&self) -> Option<&str> {
        non_empty(self.field_name.as_deref())
    }

    /// The inverse rename (swaps `column` and `new_column`).
    pub fn inverse_rename(&self) -> Self {
        Self {
            column: self.new_column.clone(),
            new_column: self.column.clone(),
            new_type: String::new(),
            ..self.clone()
        }
    }

    /// Field-level change forwarded to the artifact synchronizer, if this
    /// request is linked to an entity field.
    pub fn field_change(&self) -> Option<FieldChange> {
        let field_name = self.field()?;
        Some(FieldChange {
            field_name: field_name.to_string(),
            new_column: non_empty(Some(self.new_column.as_str())).map(str::to_string),
            new_type: non_empty(Some(self.new_type.trim())).map(str::to_string),
            primary_key: self.primary_key,
        })
    }
}

/// Normalized field change emitted to the artifact synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<bool>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
