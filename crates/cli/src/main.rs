mod app;
mod cli;

use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use hostcart_core::config::{self, AppConfig};
use tracing_subscriber::{prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = config::config_path();
    config::ensure_default_config_at(&config_path)?;
    let config = AppConfig::load_from(&config_path)?;
    init_logging(&config.log_dir)?;

    tracing::debug!(command = ?cli.command, "dispatching");

    let mut app = app::HostCartApp::new(config, config_path);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app.run(cli, &mut out)
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("hostcart.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
