//! Command-line interface for the `mcpbridge` application.
//!
//! Parses arguments, sets up logging on stderr, and runs the selected
//! command against the config files resolved for this machine.

mod cli;
mod commands;

use clap::Parser;
use tokio::runtime::Runtime;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let runtime = Runtime::new()?;
    runtime.block_on(commands::dispatch(cli))
}
