//! Transactional table applier.
//!
//! Runs one table's statements on one private connection inside one
//! transaction. Either every statement of the table commits or none does.
//! The connection is released when it is dropped, which happens on every
//! return path below.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::outcome::TableOutcome;
use crate::core::traits::{ConnectionFactory, DdlConnection, Dialect};

/// Apply `statements` to `table` atomically and report the outcome.
///
/// - acquisition failure: `FAILED_CONNECTION`, nothing executed
/// - statement, begin or commit failure: rollback, `FAILED`
/// - cancellation observed before commit: rollback, `FAILED`
///
/// A failing rollback is logged and swallowed; the original failure is
/// what gets reported.
pub async fn apply<D: Dialect + ?Sized>(
    factory: &dyn ConnectionFactory,
    dialect: &D,
    table: &str,
    statements: &[String],
    cancel: &CancellationToken,
) -> TableOutcome {
    if cancel.is_cancelled() {
        return TableOutcome::Failed("cancelled before start".to_string());
    }

    let mut conn = match factory.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("{}: connection failed - {}", table, e);
            return TableOutcome::FailedConnection(e.to_string());
        }
    };

    let original_auto_commit = conn.is_auto_commit();
    let outcome = run_in_transaction(conn.as_mut(), dialect, table, statements, cancel).await;
    restore_commit_mode(conn.as_mut(), table, original_auto_commit).await;

    match &outcome {
        TableOutcome::Ok => info!(
            "{}: committed {} statement(s) ({})",
            table,
            statements.len(),
            dialect.name()
        ),
        other => warn!("{}: {}", table, other),
    }
    outcome
}

async fn run_in_transaction<D: Dialect + ?Sized>(
    conn: &mut dyn DdlConnection,
    dialect: &D,
    table: &str,
    statements: &[String],
    cancel: &CancellationToken,
) -> TableOutcome {
    if let Err(e) = conn.begin(dialect.begin_transaction()).await {
        return TableOutcome::Failed(e.to_string());
    }

    for (idx, sql) in statements.iter().enumerate() {
        if cancel.is_cancelled() {
            rollback_quietly(conn, table).await;
            return TableOutcome::Failed("cancelled before commit".to_string());
        }
        debug!("{}: [{}/{}] {}", table, idx + 1, statements.len(), sql);
        if let Err(e) = conn.execute(sql).await {
            rollback_quietly(conn, table).await;
            return TableOutcome::Failed(failure_reason(e));
        }
    }

    if cancel.is_cancelled() {
        rollback_quietly(conn, table).await;
        return TableOutcome::Failed("cancelled before commit".to_string());
    }

    match conn.commit().await {
        Ok(()) => TableOutcome::Ok,
        Err(e) => {
            rollback_quietly(conn, table).await;
            TableOutcome::Failed(e.to_string())
        }
    }
}

async fn rollback_quietly(conn: &mut dyn DdlConnection, table: &str) {
    if let Err(e) = conn.rollback().await {
        warn!("{}: rollback failed (ignored) - {}", table, e);
    }
}

/// Put the connection back into the commit mode it had when acquired.
async fn restore_commit_mode(conn: &mut dyn DdlConnection, table: &str, original: bool) {
    if original && !conn.is_auto_commit() {
        debug!("{}: restoring auto-commit", table);
        rollback_quietly(conn, table).await;
    }
}

/// Report the engine's message for statement failures, the full error
/// otherwise.
fn failure_reason(err: crate::error::SchemaSyncError) -> String {
    match err {
        crate::error::SchemaSyncError::Statement { message, .. } => message,
        other => other.to_string(),
    }
}
