//! DDL synthesis: (dialect, table, change request) -> ordered statements.
//!
//! Synthesis is pure. Every identifier is quoted and every type literal is
//! checked against the allow-pattern before it is placed into a statement.
//!
//! A combined rename and retype always emits the rename first and points the
//! retype at the new name; the old name no longer resolves once the rename
//! has run.

use tracing::debug;

use crate::core::change::{ChangeKind, ChangeRequest};
use crate::core::identifier::{quote_ident_len, validate_type_literal, IdentifierError};
use crate::core::traits::Dialect;
use crate::error::{Result, SchemaSyncError};

/// Synthesize the statements for a single change against `table`.
pub fn synthesize<D: Dialect + ?Sized>(
    dialect: &D,
    table: &str,
    change: &ChangeRequest,
) -> Result<Vec<String>> {
    let kind = change.kind();
    let unsupported = || SchemaSyncError::UnsupportedChange {
        table: table.to_string(),
        column: change.column.clone(),
    };
    if kind == ChangeKind::Invalid {
        return Err(unsupported());
    }

    let invalid = |e: IdentifierError| {
        SchemaSyncError::invalid_change(table, change.column.clone(), e.to_string())
    };
    // Names past the engine limit would commit truncated and drift from the artifact
    let quote = |name: &str| quote_ident_len(name, dialect.max_identifier_len()).map_err(invalid);
    let tbl = quote(table)?;

    let statements = match kind {
        ChangeKind::Add => {
            let column = quote(&change.new_column)?;
            let data_type = if change.new_type.trim().is_empty() {
                dialect.default_column_type()
            } else {
                validate_type_literal(&change.new_type).map_err(invalid)?
            };
            vec![dialect.add_column(&tbl, &column, data_type)]
        }
        ChangeKind::Rename => {
            let column = quote(&change.column)?;
            let new_column = quote(&change.new_column)?;
            vec![dialect.rename_column(&tbl, &column, &new_column)]
        }
        ChangeKind::RenameAndRetype => {
            let column = quote(&change.column)?;
            let new_column = quote(&change.new_column)?;
            let data_type = validate_type_literal(&change.new_type).map_err(invalid)?;
            vec![
                dialect.rename_column(&tbl, &column, &new_column),
                dialect.retype_column(&tbl, &new_column, data_type),
            ]
        }
        ChangeKind::Retype => {
            let column = quote(&change.column)?;
            let data_type = validate_type_literal(&change.new_type).map_err(invalid)?;
            vec![dialect.retype_column(&tbl, &column, data_type)]
        }
        ChangeKind::Invalid => return Err(unsupported()),
    };

    debug!(
        "{}: {} {} -> {} statement(s)",
        table,
        kind,
        change.column,
        statements.len()
    );
    Ok(statements)
}

/// Synthesize all statements for one table, concatenated in request order.
///
/// Fails on the first request that cannot be synthesized, so a table with
/// any invalid request produces no statements at all.
pub fn synthesize_table<'a, D, I>(dialect: &D, table: &str, changes: I) -> Result<Vec<String>>
where
    D: Dialect + ?Sized,
    I: IntoIterator<Item = &'a ChangeRequest>,
{
    let mut statements = Vec::new();
    for change in changes {
        statements.extend(synthesize(dialect, table, change)?);
    }
    Ok(statements)
}
