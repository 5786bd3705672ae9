//! Command-line interface for opsdeck.
//!
//! Provides commands for serving the HTTP API, submitting commands locally,
//! inspecting job history and the audit trail, and seeding demo data.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ResolvedConfig;
use crate::core::{seed_demo_data, ExecutionService, RequestContext};
use crate::store::SqliteStore;
use crate::transport::ScriptedTransport;
use crate::web::{create_router, AppState};

/// opsdeck - operations console backend
#[derive(Parser, Debug)]
#[command(name = "opsdeck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (overrides configuration)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Submit a command against a registered host and print the job record
    Exec {
        /// Host id (e.g. "server-1")
        host_id: String,

        /// Command to execute
        command: String,
    },

    /// Show recent job history
    History {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show recent audit events
    Audit {
        /// Maximum number of events to show
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Seed demo operators, hosts, and history
    Seed,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = ResolvedConfig::load()?;

        match self.command {
            Commands::Serve { address } => {
                let listen = address.unwrap_or_else(|| config.listen.clone());
                let (_, service) = build_service(&config)?;

                let app_state = Arc::new(AppState {
                    service,
                    operator: config.execution.operator.clone(),
                });
                let router = create_router(app_state);

                let listener = tokio::net::TcpListener::bind(&listen)
                    .await
                    .with_context(|| format!("Failed to bind {}", listen))?;
                info!(%listen, "opsdeck listening");
                axum::serve(listener, router).await?;
                Ok(())
            }

            Commands::Exec { host_id, command } => {
                let (_, service) = build_service(&config)?;
                let ctx = RequestContext::for_operator(config.execution.operator.clone());
                let job = service
                    .submit(&host_id, &command, &ctx)
                    .await
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                println!("{}", serde_json::to_string_pretty(&job)?);
                Ok(())
            }

            Commands::History { limit } => {
                let (_, service) = build_service(&config)?;
                let jobs = service
                    .recent_jobs(limit)
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                if jobs.is_empty() {
                    println!("No jobs recorded.");
                    return Ok(());
                }
                for job in jobs {
                    let record = &job.record;
                    let host = job
                        .host
                        .map(|h| h.name)
                        .unwrap_or_else(|| record.host_id.clone());
                    println!(
                        "{}  {:<7}  {:>7}  {:<24}  {}",
                        record.start_time.format("%Y-%m-%d %H:%M:%S"),
                        record.status,
                        record
                            .duration_ms
                            .map(|ms| format!("{}ms", ms))
                            .unwrap_or_else(|| "-".to_string()),
                        host,
                        record.command,
                    );
                }
                Ok(())
            }

            Commands::Audit { limit } => {
                let (_, service) = build_service(&config)?;
                let events = service
                    .recent_audit(limit)
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                if events.is_empty() {
                    println!("No audit events recorded.");
                    return Ok(());
                }
                for view in events {
                    let event = &view.event;
                    let user = view
                        .user
                        .map(|u| u.name)
                        .or_else(|| event.user_id.clone())
                        .unwrap_or_else(|| "anonymous".to_string());
                    println!(
                        "{}  {:<16}  {:<14}  {}",
                        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        event.action,
                        user,
                        event.details.as_deref().unwrap_or("-"),
                    );
                }
                Ok(())
            }

            Commands::Seed => {
                let store = open_store(&config)?;
                if seed_demo_data(&store)? {
                    println!("Demo data seeded into {}", config.database.display());
                } else {
                    println!("Store already seeded, nothing to do.");
                }
                Ok(())
            }

            Commands::Config => {
                println!("home:      {}", config.home.display());
                println!("listen:    {}", config.listen);
                println!("database:  {}", config.database.display());
                match config.config_file {
                    Some(ref path) => println!("config:    {}", path.display()),
                    None => println!("config:    (defaults)"),
                }
                let exec = &config.execution;
                println!(
                    "execution: delay {}..{}ms, failure rate {}, timeout {}s, operator {}",
                    exec.min_delay_ms,
                    exec.max_delay_ms,
                    exec.failure_rate,
                    exec.command_timeout_seconds,
                    exec.operator,
                );
                Ok(())
            }
        }
    }
}

fn open_store(config: &ResolvedConfig) -> Result<Arc<SqliteStore>> {
    std::fs::create_dir_all(&config.home)
        .with_context(|| format!("Failed to create {}", config.home.display()))?;
    Ok(Arc::new(SqliteStore::open(&config.database)?))
}

/// Wire a SQLite-backed execution service from the resolved configuration
fn build_service(config: &ResolvedConfig) -> Result<(Arc<SqliteStore>, ExecutionService)> {
    let store = open_store(config)?;
    let exec = &config.execution;

    let transport = Arc::new(ScriptedTransport::with_timing(
        Duration::from_millis(exec.min_delay_ms),
        Duration::from_millis(exec.max_delay_ms),
        exec.failure_rate,
    ));

    let service = ExecutionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        transport,
    )
    .with_command_timeout(Duration::from_secs(exec.command_timeout_seconds));

    Ok((store, service))
}
