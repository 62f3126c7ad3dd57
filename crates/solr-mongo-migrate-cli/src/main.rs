//! solr-mongo-migrate CLI - reindex Solr cores into MongoDB collections.

use clap::{Parser, Subcommand};
use solr_mongo_migrate::pipeline::{default_jobs, select_jobs};
use solr_mongo_migrate::{Config, MigrateError, MigrationResult, Orchestrator, RECOVERY_HINT};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "solr-mongo-migrate")]
#[command(about = "Reindex Solr cores into MongoDB collections")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (default: read SOLR_* and MONGO_* from the environment)
    #[arg(short, long)]
    config: Option<PathBuf>,

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
    /// Run the migration jobs in catalog order
    Run {
        /// Only migrate these target collections (repeatable)
        #[arg(long, value_name = "COLLECTION")]
        only: Vec<String>,
    },

    /// Show the job catalog
    ListJobs,

    /// Test source and target connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    // Listing the catalog needs neither configuration nor connections
    if let Commands::ListJobs = cli.command {
        list_jobs(cli.output_json)?;
        return Ok(());
    }

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => {
            let config = Config::from_env()?;
            info!("Loaded configuration from environment");
            config
        }
    };

    match cli.command {
        Commands::ListJobs => unreachable!(), // Handled above
        Commands::Run { only } => {
            // Reject unknown names before connecting anywhere
            let jobs = select_jobs(default_jobs(), &only)?;

            let cancel_token = setup_signal_handler()?;
            let orchestrator = Orchestrator::new(config).await?.with_jobs(jobs);
            let (result, outcome) = orchestrator.run_with_summary(&cancel_token).await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_summary(&result);
            }

            if outcome.is_err() && !result.jobs.is_empty() {
                eprintln!("\n{}", RECOVERY_HINT);
            }
            outcome?;
        }

        Commands::HealthCheck => {
            // No eager ping: an unreachable target belongs in the report
            let orchestrator = Orchestrator::unconnected(config).await?;
            let result = orchestrator.health_check().await;
            orchestrator.close().await;
            let result = result?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (Solr): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (MongoDB): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::connection(
                    "one or more services unreachable",
                    "health check",
                ));
            }
        }
    }

    Ok(())
}

fn list_jobs(output_json: bool) -> Result<(), MigrateError> {
    let jobs = default_jobs();

    if output_json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    println!("{:<14} {:<16} {:<16} {:>9}", "CORE", "COLLECTION", "TRANSFORM", "PAGE SIZE");
    for job in &jobs {
        println!(
            "{:<14} {:<16} {:<16} {:>9}",
            job.source_core,
            job.target_collection,
            job.transform.to_string(),
            job.page_size
        );
    }
    Ok(())
}

fn print_summary(result: &MigrationResult) {
    let heading = match result.status.as_str() {
        "completed" => "Migration completed!",
        "cancelled" => "Migration cancelled.",
        _ => "Migration failed.",
    };
    println!("\n{}", heading);
    println!("  Run ID: {}", result.run_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    println!("  Jobs: {}/{}", result.jobs_success, result.jobs_total);
    println!("  Records written: {}", result.records_written);
    println!("  Records rejected: {}", result.records_rejected);

    for job in &result.jobs {
        println!(
            "    {:<16} {:<9} {:>9} written {:>6} rejected  ({:.1}s)",
            job.collection, job.state.to_string(), job.records_written, job.records_rejected, job.duration_seconds
        );
    }
    if !result.jobs_skipped.is_empty() {
        println!("  Not started: {}", result.jobs_skipped.join(", "));
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("Unknown log format '{}'", other)),
    }

    Ok(())
}

/// Setup signal handlers for graceful shutdown.
/// Handles both SIGINT (Ctrl-C) and SIGTERM.
/// Both handlers are installed before returning, so a signal arriving at any
/// later point cancels the token instead of killing the process.
#[cfg(unix)]
fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let mut stream = signal(kind)?;
        let token = cancel_token.clone();
        tokio::spawn(async move {
            stream.recv().await;
            eprintln!("\nReceived {}. Stopping after teardown...", name);
            token.cancel();
        });
    }

    Ok(cancel_token)
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> Result<CancellationToken, MigrateError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl-C handler: {}", e);
            return;
        }
        eprintln!("\nReceived Ctrl-C. Stopping after teardown...");
        token.cancel();
    });

    Ok(cancel_token)
}
