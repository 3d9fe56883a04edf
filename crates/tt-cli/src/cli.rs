//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// TableTalk - upload a CSV and ask questions about it in plain language
#[derive(Parser, Debug)]
#[command(name = "tabletalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: ./tabletalk.yml if present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the data directory for uploads and storage files
    #[arg(short, long, global = true, env = "TABLETALK_DATA_DIR")]
    pub data_dir: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Load a CSV and answer one question about it
    Ask(AskArgs),

    /// Check a SQL statement against the query guard
    Guard(GuardArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind (overrides server.host)
    #[arg(long, env = "TABLETALK_HOST")]
    pub host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(long, env = "TABLETALK_PORT")]
    pub port: Option<u16>,
}

/// Arguments for the ask command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// CSV file to load
    pub csv: PathBuf,

    /// Question to ask about the data
    pub question: String,
}

/// Arguments for the guard command
#[derive(Args, Debug)]
pub struct GuardArgs {
    /// SQL text to check
    pub sql: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
