//! CLI for the issue migrator.
//!
//! Runs the HTTP API or performs a single migration described by a JSON
//! request file.

use clap::{Parser, Subcommand};
use issue_migrator::{
    run_migration, serve, MigrationRequest, MigrationResult, RunnerConfig, ServerConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Issue Migrator - Move issues, comments and attachments between GitHub and GitLab.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Path to the server configuration file.
        #[arg(long, env = "ISSUE_MIGRATOR_CONFIG")]
        config: Option<PathBuf>,

        /// Port to listen on, overriding the configured bind port.
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Run a single migration from a JSON request file.
    Migrate {
        /// Path to the migration request.
        #[arg(long)]
        request: PathBuf,

        /// Issues migrated at once.
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // reqwest and octocrab both need a process-wide rustls provider.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = Args::parse();
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    match args.command {
        Command::Serve { config, port } => run_server(config, port, shutdown).await,
        Command::Migrate {
            request,
            concurrency,
        } => run_single(request, concurrency, shutdown).await,
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn run_server(
    config: Option<PathBuf>,
    port: Option<u16>,
    shutdown: CancellationToken,
) -> ExitCode {
    let mut server_config = match config {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Critical failure");
                return ExitCode::from(2);
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(port) = port {
        server_config = server_config.with_port(port);
    }

    match serve(&server_config, shutdown).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

async fn run_single(request: PathBuf, concurrency: usize, shutdown: CancellationToken) -> ExitCode {
    let request = match MigrationRequest::load(&request) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Critical failure");
            return ExitCode::from(2);
        }
    };

    let config = RunnerConfig::new(concurrency);
    match run_migration(&request, &config, &shutdown).await {
        Ok(result) => {
            print_summary(&result);

            if result.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            }
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Prints the migration ledger as JSON, followed by a short summary.
fn print_summary(result: &MigrationResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to serialize migration result"),
    }

    eprintln!("\nSummary:");
    eprintln!("  Issues requested: {}", result.total());
    eprintln!("  Issues migrated: {}", result.success.len());
    eprintln!("  Issues failed: {}", result.failed.len());
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
    token.cancel();
}
