//! Per-table outcomes of the DDL phase and the artifact gating phase.

use serde::{Serialize, Serializer};
use std::fmt;

/// Terminal status of one table's DDL application within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// All statements committed.
    Ok,
    /// Synthesis or execution failed; nothing was committed.
    Failed(String),
    /// No connection could be acquired; no statement was attempted.
    FailedConnection(String),
}

impl TableOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, TableOutcome::Ok)
    }

    /// Status keyword without the reason.
    pub fn status(&self) -> &'static str {
        match self {
            TableOutcome::Ok => "OK",
            TableOutcome::Failed(_) => "FAILED",
            TableOutcome::FailedConnection(_) => "FAILED_CONNECTION",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TableOutcome::Ok => None,
            TableOutcome::Failed(r) | TableOutcome::FailedConnection(r) => Some(r),
        }
    }
}

impl fmt::Display for TableOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            None => f.write_str(self.status()),
            Some(reason) => write!(f, "{}: {}", self.status(), reason),
        }
    }
}

impl Serialize for TableOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-table decision of the artifact sync phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatingDecision {
    /// DDL committed, but no request carried entity linkage.
    NoSourceInfo,
    /// DDL did not commit; the artifact was left untouched.
    SourceSkipped(String),
    /// The synchronizer applied the field changes.
    SourceUpdated,
    /// The synchronizer failed. The committed DDL is not reverted.
    SourceFailed(String),
}

impl GatingDecision {
    pub fn status(&self) -> &'static str {
        match self {
            GatingDecision::NoSourceInfo => "NO_SOURCE_INFO",
            GatingDecision::SourceSkipped(_) => "SOURCE_SKIPPED",
            GatingDecision::SourceUpdated => "SOURCE_UPDATED",
            GatingDecision::SourceFailed(_) => "SOURCE_FAILED",
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            GatingDecision::NoSourceInfo => {
                Some("qualifiedEntityName missing - cannot modify source".to_string())
            }
            GatingDecision::SourceSkipped(ddl) => {
                Some(format!("SQL failed, source not modified ({})", ddl))
            }
            GatingDecision::SourceUpdated => None,
            GatingDecision::SourceFailed(reason) => Some(reason.clone()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GatingDecision::SourceFailed(_))
    }
}

/// Wire form of a gating decision: `{status, message?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&GatingDecision> for SyncStatus {
    fn from(decision: &GatingDecision) -> Self {
        Self {
            status: decision.status(),
            message: decision.message(),
        }
    }
}

impl Serialize for GatingDecision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SyncStatus::from(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_outcome_display() {
        assert_eq!(TableOutcome::Ok.to_string(), "OK");
        assert_eq!(
            TableOutcome::Failed("column \"x\" does not exist".into()).to_string(),
            "FAILED: column \"x\" does not exist"
        );
        assert_eq!(
            TableOutcome::FailedConnection("refused".into()).to_string(),
            "FAILED_CONNECTION: refused"
        );
    }

    #[test]
    fn test_table_outcome_serializes_as_string() {
        let json = serde_json::to_string(&TableOutcome::Failed("boom".into())).unwrap();
        assert_eq!(json, "\"FAILED: boom\"");
    }

    #[test]
    fn test_gating_decision_serialization() {
        let json = serde_json::to_value(GatingDecision::SourceUpdated).unwrap();
        assert_eq!(json, serde_json::json!({"status": "SOURCE_UPDATED"}));

        let json = serde_json::to_value(GatingDecision::SourceFailed("no such file".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "SOURCE_FAILED", "message": "no such file"})
        );
    }
}
