//! In-memory test doubles for the connection and artifact boundaries.
//!
//! [`MemoryDatabase`] understands exactly the column DDL the dialects emit.
//! Statements run against a private copy of the catalog and only become
//! visible on commit.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::change::FieldChange;
use crate::core::traits::{ArtifactSynchronizer, ConnectionFactory, DdlConnection};
use crate::error::{Result, SchemaSyncError};

type Catalog = BTreeMap<String, Vec<(String, String)>>;

#[derive(Default)]
struct State {
    tables: Catalog,
    executed: Vec<String>,
    open: usize,
    released_in_transaction: usize,
    fail_on: Vec<String>,
    acquire_error: Option<String>,
    panic_on_acquire: bool,
    fail_rollback: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str, columns: &[&str]) -> Self {
        lock(&self.state).tables.insert(
            table.to_string(),
            columns
                .iter()
                .map(|c| (c.to_string(), "TEXT".to_string()))
                .collect(),
        );
        self
    }

    /// Fail any statement containing `needle`.
    pub fn failing_on(self, needle: &str) -> Self {
        lock(&self.state).fail_on.push(needle.to_string());
        self
    }

    pub fn failing_acquire(self, message: &str) -> Self {
        lock(&self.state).acquire_error = Some(message.to_string());
        self
    }

    pub fn panicking_acquire(self) -> Self {
        lock(&self.state).panic_on_acquire = true;
        self
    }

    pub fn failing_rollback(self) -> Self {
        lock(&self.state).fail_rollback = true;
        self
    }

    /// Cancel `token` once `statements` statements have been executed.
    pub fn cancelling_after(self, statements: usize, token: &CancellationToken) -> Self {
        lock(&self.state).cancel_after = Some((statements, token.clone()));
        self
    }

    /// Committed column names of `table`, in ordinal order.
    pub fn columns(&self, table: &str) -> Vec<String> {
        lock(&self.state)
            .tables
            .get(table)
            .map(|cols| cols.iter().map(|(c, _)| c.clone()).collect())
            .unwrap_or_default()
    }

    pub fn column_type(&self, table: &str, column: &str) -> Option<String> {
        lock(&self.state)
            .tables
            .get(table)?
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, t)| t.clone())
    }

    /// Every statement that reached `execute`, across all connections.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.state).executed.clone()
    }

    pub fn executed_for(&self, table: &str) -> Vec<String> {
        let prefix = format!("ALTER TABLE \"{}\" ", table);
        self.executed()
            .into_iter()
            .filter(|s| s.starts_with(&prefix))
            .collect()
    }

    pub fn open_connections(&self) -> usize {
        lock(&self.state).open
    }

    pub fn all_released_in_auto_commit(&self) -> bool {
        lock(&self.state).released_in_transaction == 0
    }
}

#[async_trait]
impl ConnectionFactory for MemoryDatabase {
    async fn acquire(&self) -> Result<Box<dyn DdlConnection>> {
        let panic_on_acquire = {
            let mut state = lock(&self.state);
            if let Some(message) = &state.acquire_error {
                return Err(SchemaSyncError::Connection(message.clone()));
            }
            if !state.panic_on_acquire {
                state.open += 1;
            }
            state.panic_on_acquire
        };
        if panic_on_acquire {
            panic!("driver panicked");
        }
        Ok(Box::new(MemoryConnection {
            state: Arc::clone(&self.state),
            pending: None,
        }))
    }

    fn db_type(&self) -> &str {
        "memory"
    }
}

struct MemoryConnection {
    state: Arc<Mutex<State>>,
    pending: Option<Catalog>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.open -= 1;
        if self.pending.is_some() {
            state.released_in_transaction += 1;
        }
    }
}

#[async_trait]
impl DdlConnection for MemoryConnection {
    fn is_auto_commit(&self) -> bool {
        self.pending.is_none()
    }

    async fn begin(&mut self, _begin_sql: &str) -> Result<()> {
        self.pending = Some(lock(&self.state).tables.clone());
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.executed.push(sql.to_string());
        if let Some((after, token)) = &state.cancel_after {
            if state.executed.len() >= *after {
                token.cancel();
            }
        }
        if state.fail_on.iter().any(|needle| sql.contains(needle.as_str())) {
            return Err(SchemaSyncError::statement(sql, "injected failure"));
        }
        let catalog = match self.pending.as_mut() {
            Some(pending) => pending,
            None => &mut state.tables,
        };
        apply_ddl(catalog, sql).map_err(|message| SchemaSyncError::statement(sql, message))
    }

    async fn commit(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(catalog) => {
                lock(&self.state).tables = catalog;
                Ok(())
            }
            None => Err(SchemaSyncError::Transaction("no transaction".into())),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending = None;
        if lock(&self.state).fail_rollback {
            return Err(SchemaSyncError::Transaction("rollback: connection reset".into()));
        }
        Ok(())
    }
}

/// Split on whitespace, unquoting double-quoted identifiers.
fn tokenize(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut current = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                while let Some(q) = chars.next() {
                    if q == '"' {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            current.push('"');
                        } else {
                            break;
                        }
                    } else {
                        current.push(q);
                    }
                }
                tokens.push(std::mem::take(&mut current));
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn apply_ddl(catalog: &mut Catalog, sql: &str) -> std::result::Result<(), String> {
    let tokens = tokenize(sql);
    let words: Vec<&str> = tokens.iter().map(String::as_str).collect();

    let (table, rest) = match words.as_slice() {
        ["ALTER", "TABLE", table, rest @ ..] => (*table, rest),
        _ => return Err(format!("syntax error: {}", sql)),
    };
    let columns = catalog
        .get_mut(table)
        .ok_or_else(|| format!("relation \"{}\" does not exist", table))?;

    match rest {
        ["RENAME", "COLUMN", column, "TO", new_column]
        | ["ALTER", "COLUMN", column, "RENAME", "TO", new_column] => {
            if columns.iter().any(|(c, _)| c == new_column) {
                return Err(format!("column \"{}\" already exists", new_column));
            }
            let entry = find_column(columns, column)?;
            entry.0 = new_column.to_string();
        }
        ["ADD", "COLUMN", column, ty @ ..] if !ty.is_empty() => {
            if columns.iter().any(|(c, _)| c == column) {
                return Err(format!("column \"{}\" already exists", column));
            }
            columns.push((column.to_string(), ty.join(" ")));
        }
        ["ALTER", "COLUMN", column, "SET", "DATA", "TYPE", ty @ ..] if !ty.is_empty() => {
            find_column(columns, column)?.1 = ty.join(" ");
        }
        ["ALTER", "COLUMN", column, "TYPE", ty @ ..] if !ty.is_empty() => {
            let ty: Vec<&str> = ty.iter().copied().take_while(|w| *w != "USING").collect();
            find_column(columns, column)?.1 = ty.join(" ");
        }
        _ => return Err(format!("syntax error: {}", sql)),
    }
    Ok(())
}

fn find_column<'a>(
    columns: &'a mut [(String, String)],
    column: &str,
) -> std::result::Result<&'a mut (String, String), String> {
    columns
        .iter_mut()
        .find(|(c, _)| c == column)
        .ok_or_else(|| format!("column \"{}\" does not exist", column))
}

/// One recorded synchronizer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCall {
    pub entity: String,
    pub new_table_name: Option<String>,
    pub field_changes: Vec<FieldChange>,
}

/// Records sync calls; fails for configured entities.
#[derive(Clone, Default)]
pub struct RecordingSynchronizer {
    calls: Arc<Mutex<Vec<SyncCall>>>,
    failing: Arc<HashSet<String>>,
}

impl RecordingSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(entities: &[&str]) -> Self {
        Self {
            calls: Arc::default(),
            failing: Arc::new(entities.iter().map(|e| e.to_string()).collect()),
        }
    }

    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ArtifactSynchronizer for RecordingSynchronizer {
    async fn sync(
        &self,
        qualified_entity_name: &str,
        new_table_name: Option<&str>,
        field_changes: &[FieldChange],
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SyncCall {
                entity: qualified_entity_name.to_string(),
                new_table_name: new_table_name.map(str::to_string),
                field_changes: field_changes.to_vec(),
            });
        if self.failing.contains(qualified_entity_name) {
            return Err(SchemaSyncError::artifact(
                qualified_entity_name,
                "artifact is read-only",
            ));
        }
        Ok(())
    }

    fn synchronizer_type(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_unquotes_identifiers() {
        assert_eq!(
            tokenize("ALTER TABLE \"a\"\"b\" ADD COLUMN \"c d\" NUMERIC(5,2)"),
            vec!["ALTER", "TABLE", "a\"b", "ADD", "COLUMN", "c d", "NUMERIC(5,2)"]
        );
    }

    #[test]
    fn test_apply_ddl_retype_with_using() {
        let mut catalog = Catalog::new();
        catalog.insert("t".into(), vec![("c".into(), "TEXT".into())]);
        apply_ddl(
            &mut catalog,
            "ALTER TABLE \"t\" ALTER COLUMN \"c\" TYPE INTEGER USING \"c\"::INTEGER",
        )
        .unwrap();
        assert_eq!(catalog["t"][0].1, "INTEGER");
    }
}
