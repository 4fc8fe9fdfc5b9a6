use anyhow::Result;
use repolens_core::config::RepolensConfig;

use crate::cli::{Cli, Command};
use crate::report;

pub fn run_with_deps(cli: Cli, config: &RepolensConfig) -> Result<()> {
    match cli.command {
        None => repolens_tui::run(config),
        Some(Command::Analyze { repo }) => report::run_analyze(&repo, config),
        Some(Command::Compare { left, right }) => report::run_compare(&left, &right, config),
        Some(Command::History) => report::run_history(),
    }
}
