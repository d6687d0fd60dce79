use anyhow::Result;
use clap::{Parser, Subcommand};
use curfew_core::VERSION;
use curfew_daemon::{config::LogConfig, daemon::log_config_warnings, Config, Daemon};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// curfew - app curfews and scheduled shutdown
///
/// Kills applications outside their allowed hours and powers the machine
/// off at a configured time
#[derive(Parser, Debug)]
#[command(name = "curfew-daemon")]
#[command(version = VERSION)]
#[command(about = "curfew Daemon - app time windows and scheduled shutdown", long_about = None)]
struct Cli {
    /// Path to configuration file (.json, or .toml)
    #[arg(short, long, default_value = "./config.json")]
    config: PathBuf,

    /// Log level when RUST_LOG is not set
    #[arg(
        short,
        long,
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enforce app policies and shutdown until interrupted
    Run,

    /// Single enforcement pass, then exit
    Check,

    /// Generate example configuration file
    GenerateConfig {
        /// Output path for config file
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        init_logging(&LogConfig::default(), &cli.log_level)?;
        return generate_config(output);
    }

    // Logging goes where the config says, so read it first
    let loaded = load_config(&cli.config);
    let log_config = match &loaded {
        Ok(Some(config)) => config.logging.clone(),
        _ => LogConfig::default(),
    };
    init_logging(&log_config, &cli.log_level)?;

    info!("curfew daemon v{} starting...", VERSION);

    let config = match loaded? {
        Some(config) => {
            info!("Configuration loaded from: {:?}", cli.config);
            config
        }
        None => {
            warn!(
                "Configuration file not found: {:?}, using defaults",
                cli.config
            );
            Config::default()
        }
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    log_config_warnings(&config);

    info!("Configuration loaded and validated successfully");

    match cli.command {
        Some(Commands::Check) => run_check(config),
        Some(Commands::Run) => run_daemon(config).await,
        Some(Commands::GenerateConfig { .. }) => Ok(()),
        None => {
            info!("No command specified, running daemon by default");
            run_daemon(config).await
        }
    }
}

/// Run a single enforcement pass and report it
fn run_check(config: Config) -> Result<()> {
    info!("Running single enforcement pass...");

    let report = Daemon::new(config).check_once();

    info!("=== Enforcement Report ===");
    info!("Processes inspected: {}", report.inspected);
    info!("Outside allowed hours: {}", report.blocked);
    info!("Killed: {}", report.killed);
    info!("Kill failures: {}", report.kill_failures);
    info!("Unreadable processes: {}", report.info_failures);

    Ok(())
}

/// Run both policies until SIGINT/SIGTERM
async fn run_daemon(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let signals = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Shutdown signal received, stopping policies...");
            cancel.cancel();
        })
    };

    let result = Daemon::new(config).run(cancel).await;
    signals.abort();
    result
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Generate example configuration file
fn generate_config(output: &Path) -> Result<()> {
    info!("Generating example configuration file: {:?}", output);

    Config::example()
        .save_to_file(output)
        .map_err(|e| anyhow::anyhow!("Failed to save configuration file: {}", e))?;

    info!("Configuration file generated successfully");
    Ok(())
}

/// Load configuration from file, `None` if it does not exist
fn load_config(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    Config::load_from_file(path)
        .map(Some)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration file {:?}: {}", path, e))
}

/// Initialize logging with file and stdout output
fn init_logging(logging: &LogConfig, level: &str) -> Result<()> {
    std::fs::create_dir_all(&logging.log_dir)?;

    // Daily-rotated file appender
    let file_appender = tracing_appender::rolling::daily(&logging.log_dir, &logging.file_name);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .init();

    // Keep the writer alive for the whole process
    std::mem::forget(_guard);

    info!("Logging initialized");

    Ok(())
}
