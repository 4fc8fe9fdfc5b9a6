use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "repolens")]
#[command(bin_name = "repolens")]
#[command(version)]
#[command(about = "Interactive GitHub repository analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Analyze a repository and print the report")]
    Analyze {
        #[arg(value_name = "OWNER/REPO")]
        repo: String,
    },
    #[command(about = "Compare two repositories side by side")]
    Compare {
        #[arg(value_name = "OWNER/REPO")]
        left: String,
        #[arg(value_name = "OWNER/REPO")]
        right: String,
    },
    #[command(about = "List previously analyzed repositories")]
    History,
}
