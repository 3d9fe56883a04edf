//! TableTalk CLI - ask questions about CSV files

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::common::ExitCode;
use commands::{ask, guard, serve};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        cli::Commands::Serve(args) => serve::execute(args, &cli.global).await,
        cli::Commands::Ask(args) => ask::execute(args, &cli.global).await,
        cli::Commands::Guard(args) => guard::execute(args),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::ExitCode::from(*code),
            None => {
                eprintln!("Error: {err:#}");
                std::process::ExitCode::FAILURE
            }
        },
    }
}

/// Route `log` records from the library crates through a fmt subscriber
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
