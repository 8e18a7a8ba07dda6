use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use poolwatch::alerts::{AlertDispatcher, Notifier, PayloadBuilder, WebhookNotifier};
use poolwatch::collectors::FileTail;
use poolwatch::config::Config;
use poolwatch::error::ConfigError;
use poolwatch::StreamDriver;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments for the pool watcher
#[derive(Parser)]
#[command(
    name = "poolwatch",
    about = "Blue/green proxy log watcher - failover, recovery and error-rate alerts",
    long_about = "Follows a reverse proxy access log, detects failover between upstream pools, \
                  recovery to the primary pool and elevated 5xx error rates over a sliding \
                  window, and posts rate-limited alerts to a chat webhook."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Access log to follow, overriding config and LOG_FILE_PATH
    #[arg(short, long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// Missing config files are allowed; they fall back to defaults when
    /// loaded.
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if let Some(ref log_file) = self.log_file {
            if log_file.is_dir() {
                return Err(format!("Log path is a directory: {}", log_file.display()));
            }
        }

        Ok(())
    }
}

/// Load the config file, falling back to defaults when it cannot be read
///
/// A file that exists but does not parse is an error.
fn load_config(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => Ok(config),
                Err(ConfigError::ReadError(e)) => {
                    warn!("Configuration file unreadable ({}), using defaults", e);
                    Ok(Config::default())
                }
                Err(e) => Err(e),
            }
        }
        None => {
            info!("No configuration file specified, using defaults");
            Ok(Config::default())
        }
    }
}

/// Resolve the effective configuration: defaults, file, environment, flags
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid environment override")?;
    if let Some(ref log_file) = cli.log_file {
        config.source.log_path = log_file.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_dispatcher(config: &Config) -> anyhow::Result<AlertDispatcher> {
    let alerts = &config.alerts;
    let notifier: Option<Box<dyn Notifier>> = match alerts.webhook_url {
        Some(ref url) => {
            let notifier =
                WebhookNotifier::new(url.clone(), Duration::from_secs(alerts.timeout_seconds))
                    .context("Failed to create webhook client")?;
            Some(Box::new(notifier))
        }
        None => {
            warn!("No webhook URL configured; alerts will be logged but not delivered");
            None
        }
    };

    let payload = PayloadBuilder::new(
        alerts.username.clone(),
        alerts.icon_emoji.clone(),
        alerts.runbook_hint.clone(),
    );

    let cooldown = alerts.cooldown().context("Invalid alert cooldown")?;

    Ok(
        AlertDispatcher::new(notifier, cooldown, alerts.maintenance_mode)
            .with_payload_builder(payload),
    )
}

fn run(cli: Cli) -> anyhow::Result<()> {
    cli.validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid arguments")?;

    let config = resolve_config(&cli)?;

    info!("Watching log file: {}", config.source.log_path.display());
    info!("Active pool: {}", config.detection.active_pool);
    info!(
        "Error rate threshold: {}% over {} requests",
        config.detection.error_rate_threshold, config.detection.window_size
    );
    info!("Alert cooldown: {}s", config.alerts.cooldown_seconds);
    info!(
        "Webhook: {}",
        if config.webhook_configured() {
            "configured"
        } else {
            "not configured"
        }
    );
    if config.alerts.maintenance_mode {
        warn!("Maintenance mode is active; all alerts are suppressed");
    }

    let dispatcher = build_dispatcher(&config)?;
    let mut driver = StreamDriver::new(&config, dispatcher);
    let mut source = FileTail::new(config.source.log_path.clone());

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Watcher is running. Press Ctrl+C to stop.");

    let summary = driver
        .run(&mut source, &shutdown)
        .context("Log source failed")?;

    info!(
        "Watcher stopped after {} lines ({} requests, {} errors)",
        summary.lines_read, summary.stats.total_requests, summary.stats.total_errors
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    info!("Starting poolwatch");

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
