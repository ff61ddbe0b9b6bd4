//! FinTracker CLI - a command line front end for the FinTracker API.
//!
//! Wires the core together: configuration, the credential store, the
//! request gateway and the session controller. Forced sign-outs coming from
//! the gateway arrive over a navigation channel; `commands::run` decides
//! which of them end the command.

mod commands;
mod format;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fintracker_core::navigation::ChannelNavigator;
use fintracker_core::{ApiClient, Config, SessionController};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Command, Outcome};

#[derive(Debug, Parser)]
#[command(name = "fintracker", version, about = "Track income, expenses and budgets")]
struct Cli {
    /// API base URL (overrides config and FINTRACKER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().context("Log file path has no file name")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let credentials = config.credential_store()?;
    let (navigator, mut redirects) = ChannelNavigator::new();
    let api = ApiClient::with_timeout(
        &config.api_base_url,
        config.request_timeout(),
        credentials,
        Arc::new(navigator),
    )?;
    let session = SessionController::new(api);

    match commands::run(&session, &mut config, &mut redirects, cli.command).await? {
        Outcome::Completed => Ok(ExitCode::SUCCESS),
        Outcome::SessionExpired => {
            eprintln!("Session expired, please sign in again: fintracker login");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("FinTracker CLI starting");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
