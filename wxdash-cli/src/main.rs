//! Binary crate for the `wxdash` command-line tool.
//!
//! This crate is the presentation layer: it parses arguments, drives the
//! core clients, and formats their plain-data results for a terminal.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
