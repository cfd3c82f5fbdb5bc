//! hdlflow CLI - One command line for HDL simulation and FPGA flows

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => EnvFilter::new("hdlflow=warn"),
        1 => EnvFilter::new("hdlflow=info"),
        _ => EnvFilter::new("hdlflow=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(cli.verbose >= 2)
        .with_line_number(cli.verbose >= 2)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    commands::run::execute(cli)
}
