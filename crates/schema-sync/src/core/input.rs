//! Loading change batches from JSON, YAML or CSV files.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use super::change::ChangeRequest;
use crate::error::{Result, SchemaSyncError};

/// Input format of a change batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFormat {
    Json,
    Yaml,
    /// Headerless `table,column,newColumn,newType,primaryKey` rows.
    Csv,
}

impl ChangeFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for ChangeFormat {
    type Err = SchemaSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ChangeFormat::Json),
            "yaml" | "yml" => Ok(ChangeFormat::Yaml),
            "csv" => Ok(ChangeFormat::Csv),
            other => Err(SchemaSyncError::Config(format!(
                "Unknown change file format: '{}'. Supported formats: json, yaml, csv",
                other
            ))),
        }
    }
}

/// Either a bare list or an object with a `changes` list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChangeDocument {
    List(Vec<ChangeRequest>),
    Wrapped { changes: Vec<ChangeRequest> },
}

impl From<ChangeDocument> for Vec<ChangeRequest> {
    fn from(doc: ChangeDocument) -> Self {
        match doc {
            ChangeDocument::List(changes) => changes,
            ChangeDocument::Wrapped { changes } => changes,
        }
    }
}

/// Load a change batch from a file. The format is taken from `format` or,
/// when `None`, from the file extension.
pub fn load_changes(path: &Path, format: Option<ChangeFormat>) -> Result<Vec<ChangeRequest>> {
    let format = match format {
        Some(f) => f,
        None => ChangeFormat::from_path(path)?,
    };
    let content = std::fs::read_to_string(path)?;
    parse_changes(&content, format)
}

/// Parse a change batch from a string.
pub fn parse_changes(content: &str, format: ChangeFormat) -> Result<Vec<ChangeRequest>> {
    match format {
        ChangeFormat::Json => Ok(serde_json::from_str::<ChangeDocument>(content)?.into()),
        ChangeFormat::Yaml => Ok(serde_yaml::from_str::<ChangeDocument>(content)?.into()),
        ChangeFormat::Csv => parse_csv(content),
    }
}

fn parse_csv(content: &str) -> Result<Vec<ChangeRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut changes = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let pk = field(4);
        let primary_key = match pk.to_ascii_lowercase().as_str() {
            "" => None,
            "1" | "true" => Some(true),
            _ => Some(false),
        };
        changes.push(ChangeRequest {
            table: field(0),
            column: field(1),
            new_column: field(2),
            new_type: field(3),
            primary_key,
            ..Default::default()
        });
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change::ChangeKind;
    use std::io::Write;

    #[test]
    fn test_parse_json_list() {
        let json = r#"[{"table": "customer", "column": "email", "newColumn": "email_address"}]"#;
        let changes = parse_changes(json, ChangeFormat::Json).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind(), ChangeKind::Rename);
    }

    #[test]
    fn test_parse_json_wrapped() {
        let json = r#"{"changes": [
            {"table": "product", "newColumn": "discount"},
            {"table": "product", "column": "price", "newType": "NUMERIC(10,2)"}
        ]}"#;
        let changes = parse_changes(json, ChangeFormat::Json).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind(), ChangeKind::Add);
        assert_eq!(changes[1].kind(), ChangeKind::Retype);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
- table: customer
  column: username
  newColumn: login
  qualifiedEntityName: com.shop.Customer
  fieldName: username
"#;
        let changes = parse_changes(yaml, ChangeFormat::Yaml).unwrap();
        assert_eq!(changes[0].entity(), Some("com.shop.Customer"));
    }

    #[test]
    fn test_parse_csv_rows() {
        let csv = "customer, email, email_address, , \n\nproduct,,discount,,\norders,id,,BIGINT,true\n";
        let changes = parse_changes(csv, ChangeFormat::Csv).unwrap();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].column, "email");
        assert_eq!(changes[0].new_column, "email_address");
        assert_eq!(changes[1].kind(), ChangeKind::Add);
        assert_eq!(changes[2].primary_key, Some(true));
        assert_eq!(changes[2].kind(), ChangeKind::Retype);
    }

    #[test]
    fn test_parse_csv_explicit_false_clears_primary_key() {
        let csv = "orders,id,,,false\norders,total,,,0\n";
        let changes = parse_changes(csv, ChangeFormat::Csv).unwrap();
        assert_eq!(changes[0].primary_key, Some(false));
        assert_eq!(changes[1].primary_key, Some(false));
    }

    #[test]
    fn test_parse_csv_short_rows() {
        let csv = "customer,email\n";
        let changes = parse_changes(csv, ChangeFormat::Csv).unwrap();
        assert_eq!(changes[0].kind(), ChangeKind::Invalid);
        assert_eq!(changes[0].primary_key, None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ChangeFormat::from_path(Path::new("batch.yml")).unwrap(),
            ChangeFormat::Yaml
        );
        assert!(ChangeFormat::from_path(Path::new("batch.txt")).is_err());
    }

    #[test]
    fn test_load_changes_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "customer,email,email_address,,").unwrap();
        let changes = load_changes(file.path(), None).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].table, "customer");
    }
}
