pub mod cli;
pub mod dispatch;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.is_none());

    let config_path =
        repolens_core::paths::config_path().context("failed to resolve config path")?;
    let config = repolens_core::config::load_config(&config_path)?;

    dispatch::run_with_deps(cli, &config)
}

/// While the TUI owns the terminal, log output would corrupt the screen;
/// logs go to a sink unless REPOLENS_LOG_STDOUT opts in.
fn init_logging(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("REPOLENS_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("yes")
    );

    if interactive && !stdout_enabled {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
