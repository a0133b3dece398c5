//! accel-loader CLI - inspect and manage the optional GPU backend

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

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
    let filter = if cli.verbose {
        EnvFilter::new("accel_loader=debug")
    } else {
        EnvFilter::new("accel_loader=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut config = accel_loader::util::config::load_default_config();
    cli.gpu.apply(&mut config);

    // Execute command
    match cli.command {
        Commands::Probe(args) => commands::probe::execute(args, config.gpu),
        Commands::Devices => commands::devices::execute(config.gpu),
        Commands::Doctor => commands::doctor::execute(config.gpu, cli.verbose),
        Commands::Clean => commands::clean::execute(config.gpu),
    }
}
