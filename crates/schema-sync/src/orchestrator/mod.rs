//! Batch orchestrator - main workflow coordinator.
//!
//! A batch runs in two phases:
//!
//! 1. **DDL**: requests are partitioned by table, each table's statements are
//!    synthesized and applied in its own transaction on its own connection.
//!    Tables run concurrently under a bounded worker pool; one table never
//!    aborts another.
//! 2. **Sync**: for every table whose DDL committed, the linked entity's
//!    field changes are forwarded to the artifact synchronizer. This phase is
//!    sequential and never touches the database. A sync failure does not
//!    revert committed DDL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::applier;
use crate::artifact::create_synchronizer;
use crate::config::Config;
use crate::core::change::ChangeRequest;
use crate::core::outcome::{GatingDecision, TableOutcome};
use crate::core::traits::{ArtifactSynchronizer, ConnectionFactory};
use crate::ddl;
use crate::drivers::{DialectImpl, PgConnectionFactory};
use crate::error::Result;

/// Batch orchestrator.
pub struct Orchestrator {
    dialect: DialectImpl,
    factory: Arc<dyn ConnectionFactory>,
    synchronizer: Arc<dyn ArtifactSynchronizer>,
    workers: usize,
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Unique batch identifier.
    pub batch_id: String,

    /// When the batch started.
    pub started_at: DateTime<Utc>,

    /// When the batch completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Terminal DDL result per table.
    pub ddl_outcome: BTreeMap<String, TableOutcome>,

    /// Artifact gating decision per table.
    pub sync_outcome: BTreeMap<String, GatingDecision>,
}

impl BatchReport {
    pub fn has_ddl_failures(&self) -> bool {
        self.ddl_outcome.values().any(|o| !o.is_ok())
    }

    pub fn has_sync_failures(&self) -> bool {
        self.sync_outcome.values().any(GatingDecision::is_failure)
    }

    /// Tables whose DDL did not commit.
    pub fn failed_tables(&self) -> Vec<&str> {
        self.ddl_outcome
            .iter()
            .filter(|(_, o)| !o.is_ok())
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Statements synthesized for one table, or the reason synthesis failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePlan {
    pub statements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator from explicit parts.
    pub fn new(
        dialect: DialectImpl,
        factory: Arc<dyn ConnectionFactory>,
        synchronizer: Arc<dyn ArtifactSynchronizer>,
        workers: usize,
    ) -> Self {
        Self {
            dialect,
            factory,
            synchronizer,
            workers: workers.max(1),
        }
    }

    /// Create an orchestrator from a validated configuration.
    ///
    /// The connection pool connects lazily; nothing is contacted here.
    pub fn from_config(config: &Config) -> Result<Self> {
        let factory = PgConnectionFactory::new(&config.database, config.batch.get_max_connections())?;
        Ok(Self::new(
            DialectImpl::new(config.database.dialect),
            Arc::new(factory),
            create_synchronizer(&config.artifacts),
            config.batch.get_workers(),
        ))
    }

    /// Run both phases and return the combined report.
    pub async fn run(
        &self,
        changes: &[ChangeRequest],
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started_at = Utc::now();
        let batch_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Starting batch {}: {} change(s) via {} / {}",
            batch_id,
            changes.len(),
            self.factory.db_type(),
            self.synchronizer.synchronizer_type()
        );

        info!("Phase 1: Applying DDL");
        let ddl_outcome = self.apply_batch(changes, cancel).await;

        info!("Phase 2: Synchronizing artifacts");
        let sync_outcome = self.gate(&ddl_outcome, changes).await;

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let failed = ddl_outcome.values().filter(|o| !o.is_ok()).count();
        info!(
            "Batch {} finished in {:.2}s: {} table(s), {} failed",
            batch_id,
            duration_seconds,
            ddl_outcome.len(),
            failed
        );

        BatchReport {
            batch_id,
            started_at,
            completed_at,
            duration_seconds,
            ddl_outcome,
            sync_outcome,
        }
    }

    /// Synthesize every table's statements without touching the database.
    pub fn plan(&self, changes: &[ChangeRequest]) -> BTreeMap<String, TablePlan> {
        partition_by_table(changes)
            .into_iter()
            .map(|(table, requests)| {
                let plan = match ddl::synthesize_table(&self.dialect, &table, requests) {
                    Ok(statements) => TablePlan {
                        statements,
                        error: None,
                    },
                    Err(e) => TablePlan {
                        statements: Vec::new(),
                        error: Some(e.to_string()),
                    },
                };
                (table, plan)
            })
            .collect()
    }

    /// Apply DDL for every table and return the terminal outcome per table.
    ///
    /// The returned map holds an entry for every table named in `changes`.
    pub async fn apply_batch(
        &self,
        changes: &[ChangeRequest],
        cancel: &CancellationToken,
    ) -> BTreeMap<String, TableOutcome> {
        let partitions = partition_by_table(changes);
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut outcomes = BTreeMap::new();
        let mut handles = Vec::new();

        info!(
            "Applying {} table(s) with {} workers",
            partitions.len(),
            self.workers
        );

        for (table, requests) in partitions {
            // Synthesis failure means the table never reaches the database
            let statements = match ddl::synthesize_table(&self.dialect, &table, requests) {
                Ok(statements) => statements,
                Err(e) => {
                    warn!("{}: {}", table, e);
                    outcomes.insert(table, TableOutcome::Failed(e.to_string()));
                    continue;
                }
            };

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                debug!("{}: not started", table);
                outcomes.insert(
                    table,
                    TableOutcome::Failed("cancelled before start".to_string()),
                );
                continue;
            };

            let factory = Arc::clone(&self.factory);
            let dialect = self.dialect.clone();
            let cancel = cancel.clone();
            let task_table = table.clone();

            let handle = tokio::spawn(async move {
                let outcome = applier::apply(
                    factory.as_ref(),
                    &dialect,
                    &task_table,
                    &statements,
                    &cancel,
                )
                .await;
                drop(permit);
                outcome
            });

            handles.push((table, handle));
        }

        for (table, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{}: task panicked - {}", table, e);
                    TableOutcome::Failed(format!("Task panicked: {}", e))
                }
            };
            outcomes.insert(table, outcome);
        }

        outcomes
    }

    /// Decide and perform the artifact sync for every table in `outcomes`.
    pub async fn gate(
        &self,
        outcomes: &BTreeMap<String, TableOutcome>,
        changes: &[ChangeRequest],
    ) -> BTreeMap<String, GatingDecision> {
        let by_table: HashMap<String, Vec<&ChangeRequest>> =
            partition_by_table(changes).into_iter().collect();
        let mut decisions = BTreeMap::new();

        for (table, outcome) in outcomes {
            let requests = by_table.get(table).map(Vec::as_slice).unwrap_or(&[]);
            let decision = if !outcome.is_ok() {
                GatingDecision::SourceSkipped(outcome.to_string())
            } else {
                self.sync_table(table, requests).await
            };
            debug!("{}: {}", table, decision.status());
            decisions.insert(table.clone(), decision);
        }

        decisions
    }

    /// Sync every entity linked from `requests`, each with only its own
    /// field changes. Any failed entity fails the table.
    async fn sync_table(&self, table: &str, requests: &[&ChangeRequest]) -> GatingDecision {
        let mut entities: Vec<&str> = Vec::new();
        for entity in requests.iter().filter_map(|r| r.entity()) {
            if !entities.contains(&entity) {
                entities.push(entity);
            }
        }
        if entities.is_empty() {
            return GatingDecision::NoSourceInfo;
        }

        let mut failures = Vec::new();
        for entity in entities {
            let linked: Vec<&ChangeRequest> = requests
                .iter()
                .copied()
                .filter(|r| r.entity() == Some(entity))
                .collect();
            let new_table_name = linked
                .iter()
                .filter_map(|r| r.new_table_name.as_deref())
                .find(|t| !t.trim().is_empty());
            let field_changes: Vec<_> = linked.iter().filter_map(|r| r.field_change()).collect();

            if let Err(e) = self
                .synchronizer
                .sync(entity, new_table_name, &field_changes)
                .await
            {
                error!("{}: artifact sync of {} failed - {}", table, entity, e);
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            GatingDecision::SourceUpdated
        } else {
            GatingDecision::SourceFailed(failures.join("; "))
        }
    }
}

/// Group requests by table, keeping first-seen table order and input order
/// within each table.
fn partition_by_table(changes: &[ChangeRequest]) -> Vec<(String, Vec<&ChangeRequest>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<(String, Vec<&ChangeRequest>)> = Vec::new();
    for change in changes {
        let slot = *index.entry(change.table.as_str()).or_insert_with(|| {
            partitions.push((change.table.clone(), Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(change);
    }
    partitions
}
