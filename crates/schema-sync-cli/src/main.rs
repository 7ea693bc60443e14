//! schema-sync CLI - transactional column changes with entity registry sync.

use clap::{Parser, Subcommand};
use schema_sync::error::{EXIT_DDL_FAILED, EXIT_SYNC_FAILED};
use schema_sync::{
    load_changes, BatchReport, ChangeFormat, ChangeRequest, Config, EntityRegistry, Orchestrator,
    PgConnectionFactory, SchemaSyncError,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "schema-sync")]
#[command(about = "Apply column-level schema changes per table and keep entity mappings in sync")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a batch of column changes
    Apply {
        /// Change file (JSON, YAML or CSV)
        #[arg(long)]
        changes: PathBuf,

        /// Change file format; inferred from the extension when omitted
        #[arg(long)]
        format: Option<ChangeFormat>,

        /// Override number of workers
        #[arg(long)]
        workers: Option<usize>,

        /// Dry run: show the DDL per table without connecting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the DDL each table would run
    Plan {
        /// Change file (JSON, YAML or CSV)
        #[arg(long)]
        changes: PathBuf,

        /// Change file format; inferred from the extension when omitted
        #[arg(long)]
        format: Option<ChangeFormat>,
    },

    /// List entities in the configured registry
    Entities,

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, SchemaSyncError> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| SchemaSyncError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Apply {
            changes,
            format,
            workers,
            dry_run,
        } => {
            if let Some(w) = workers {
                config.batch.workers = Some(w);
                config.validate()?;
            }

            let changes = read_changes(&config, &changes, format)?;
            let orchestrator = Orchestrator::from_config(&config)?;

            if dry_run {
                print_plan(&orchestrator, &changes, cli.output_json)?;
                return Ok(ExitCode::SUCCESS);
            }

            // Setup signal handling for graceful shutdown (SIGINT and SIGTERM)
            let cancel_token = setup_signal_handler().await?;

            let report = orchestrator.run(&changes, &cancel_token).await;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report);
            }

            return batch_exit_code(&report, cancel_token.is_cancelled()).map(ExitCode::from);
        }

        Commands::Plan { changes, format } => {
            let changes = read_changes(&config, &changes, format)?;
            let orchestrator = Orchestrator::from_config(&config)?;
            print_plan(&orchestrator, &changes, cli.output_json)?;
        }

        Commands::Entities => {
            let path = config.artifacts.registry.as_ref().ok_or_else(|| {
                SchemaSyncError::Config("artifacts.registry is not configured".to_string())
            })?;
            let registry = EntityRegistry::load(path)?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&registry.entities)?);
            } else {
                println!("Entities ({}):", registry.entities.len());
                for entity in &registry.entities {
                    println!("  {} -> {}", entity.qualified_name, entity.table_name);
                    for field in &entity.fields {
                        println!(
                            "    {}{} -> {}",
                            field.field_name,
                            if field.primary_key { " [pk]" } else { "" },
                            field.column_name
                        );
                    }
                }
            }
        }

        Commands::HealthCheck => {
            let factory =
                PgConnectionFactory::new(&config.database, config.batch.get_max_connections())?;
            let start = Instant::now();
            let result = factory.test_connection().await;
            let latency_ms = start.elapsed().as_millis() as u64;

            if cli.output_json {
                let value = serde_json::json!({
                    "dialect": config.database.dialect.to_string(),
                    "connected": result.is_ok(),
                    "latencyMs": latency_ms,
                    "error": result.as_ref().err().map(|e| e.to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Database ({}): {} ({}ms)",
                    config.database.dialect,
                    if result.is_ok() { "OK" } else { "FAILED" },
                    latency_ms
                );
                if let Err(ref err) = result {
                    println!("    Error: {}", err);
                }
            }

            result?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the change file and fill missing entity linkage from the registry.
fn read_changes(
    config: &Config,
    path: &Path,
    format: Option<ChangeFormat>,
) -> Result<Vec<ChangeRequest>, SchemaSyncError> {
    let mut changes = load_changes(path, format)?;
    info!("Loaded {} change(s) from {:?}", changes.len(), path);

    if let Some(ref registry_path) = config.artifacts.registry {
        if registry_path.exists() {
            let registry = EntityRegistry::load(registry_path)?;
            let linked = registry.enrich(&mut changes);
            if linked > 0 {
                info!("Linked {} change(s) to registry entities", linked);
            }
        } else {
            warn!("Entity registry {:?} not found", registry_path);
        }
    }

    Ok(changes)
}

/// Exit code for a finished batch. A cancelled batch is an error so that it
/// reports like any other failure, after the partial report was printed.
fn batch_exit_code(report: &BatchReport, cancelled: bool) -> Result<u8, SchemaSyncError> {
    if cancelled {
        return Err(SchemaSyncError::Cancelled);
    }
    if report.has_ddl_failures() {
        return Ok(EXIT_DDL_FAILED);
    }
    if report.has_sync_failures() {
        return Ok(EXIT_SYNC_FAILED);
    }
    Ok(0)
}

fn print_plan(
    orchestrator: &Orchestrator,
    changes: &[ChangeRequest],
    output_json: bool,
) -> Result<(), SchemaSyncError> {
    let plan = orchestrator.plan(changes);

    if output_json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for (table, table_plan) in &plan {
        println!("-- {}", table);
        match &table_plan.error {
            Some(err) => println!("-- FAILED: {}", err),
            None => {
                for stmt in &table_plan.statements {
                    println!("{};", stmt);
                }
            }
        }
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("\nBatch completed!");
    println!("  Batch ID: {}", report.batch_id);
    println!("  Duration: {:.2}s", report.duration_seconds);
    println!("  DDL:");
    for (table, outcome) in &report.ddl_outcome {
        println!("    {}: {}", table, outcome);
    }
    println!("  Sync:");
    for (table, decision) in &report.sync_outcome {
        match decision.message() {
            Some(message) => println!("    {}: {} ({})", table, decision.status(), message),
            None => println!("    {}: {}", table, decision.status()),
        }
    }
    let failed = report.failed_tables();
    if !failed.is_empty() {
        println!("  Failed tables: {:?}", failed);
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Committed tables stay committed; tables not yet started are skipped.
#[cfg(unix)]
async fn setup_signal_handler() -> Result<CancellationToken, SchemaSyncError> {
    let cancel_token = CancellationToken::new();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!("\nReceived {}. Shutting down gracefully...", name);
        token.cancel();
    });

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
async fn setup_signal_handler() -> Result<CancellationToken, SchemaSyncError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Shutting down gracefully...");
            token.cancel();
        }
    });

    Ok(cancel_token)
}
