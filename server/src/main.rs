// Text file service - Main Entry Point
//
// Bootstrap only: environment, logging, configuration and the CLI commands.
// Handlers, routes and the request pipeline live in the library crate.

pub use textfile_server::*;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dotenvy::{Error as DotenvError, dotenv, from_filename};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use textfile_core::{Database, TextFileStore, config::AppConfig};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

static TRACING_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(author, version, about = "Text file CRUD service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Probe the text file store once and exit
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_status = load_env_file();
    init_tracing()?;
    report_env_status(&env_status);

    let cli = Cli::parse();
    let config = AppConfig::load_with(cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::Check => run_check(config).await,
    }
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        database_backend = ?config.database_backend,
        db_host = %config.db_host,
        db_port = config.db_port,
        db_name = %config.db_name,
        pool_size = config.pool_size,
        pool_overflow = config.pool_overflow,
        validateuser_url = %config.validateuser_url,
        "Starting server"
    );
    let database = Database::connect(&config).await?;
    let state = build_state(&database, &config)?;
    info!(
        service_name = state.metadata.service_name,
        version = state.metadata.version,
        "Loaded service metadata"
    );

    let app = router::build_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .context("failed to bind socket")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local address")?;

    info!("listening on {actual_addr}");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?error, "server terminated with error");
    }

    database.close().await;
    Ok(())
}

async fn run_check(config: AppConfig) -> anyhow::Result<()> {
    let database = Database::connect(&config).await?;
    let store = TextFileStore::new(&database, &config);
    let result = store.ping().await;
    database.close().await;

    match result {
        Ok(()) => {
            info!(backend = ?config.database_backend, "text file store is UP");
            println!("UP");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "text file store is DOWN");
            bail!("text file store is DOWN: {err}")
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    // JSON to stdout unless TEXTFILE_LOG_DIR asks for a daily rolling file.
    // RUST_LOG controls the level.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = env::var("TEXTFILE_LOG_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty());

    let Some(log_dir) = log_dir else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .json()
            .with_writer(std::io::stdout)
            .try_init();
        return Ok(());
    };

    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log dir '{log_dir}'"))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "textfile-server.log");
    let (writer, guard) = non_blocking(file_appender);

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .json()
        .with_writer(writer)
        .try_init()
        .is_ok()
    {
        let _ = TRACING_GUARD.set(guard);
    }
    Ok(())
}

enum EnvLoadStatus {
    Loaded(PathBuf),
    NotFound,
    Failed(DotenvError),
}

fn load_env_file() -> EnvLoadStatus {
    if let Ok(env_file) = env::var("TEXTFILE_ENV_FILE") {
        let trimmed = env_file.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            return match from_filename(&path) {
                Ok(_) => {
                    let display_path = make_relative(&path).unwrap_or_else(|| path.clone());
                    EnvLoadStatus::Loaded(display_path)
                }
                Err(err) => EnvLoadStatus::Failed(err),
            };
        }
    }

    match dotenv() {
        Ok(path) => {
            let display_path = make_relative(&path).unwrap_or_else(|| path.clone());
            EnvLoadStatus::Loaded(display_path)
        }
        Err(DotenvError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            EnvLoadStatus::NotFound
        }
        Err(err) => EnvLoadStatus::Failed(err),
    }
}

fn report_env_status(status: &EnvLoadStatus) {
    match status {
        EnvLoadStatus::Loaded(path) => {
            info!("Loaded environment variables from {}", path.display());
        }
        EnvLoadStatus::NotFound => {
            info!("No .env file found; using process environment only");
        }
        EnvLoadStatus::Failed(err) => {
            warn!("Failed to load .env file: {err:?}");
        }
    }
}

fn make_relative(path: &Path) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    path.strip_prefix(&cwd).map(|p| p.to_path_buf()).ok()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (Ok(mut term), Ok(mut int)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) else {
            warn!("failed to install signal handlers; falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };

        tokio::select! {
            _ = term.recv() => {},
            _ = int.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
