//! Edge CLI - Command line tool for the cache-key variations workload.
//!
//! Commands:
//! - `edge simulate` - Run a request through the pipeline locally
//! - `edge config` - Show, validate or create the variations config

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, SimulateArgs};

/// Edge CLI - Try out cache-key variations locally
#[derive(Parser)]
#[command(name = "edge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a request through the rewrite and content stages
    Simulate(SimulateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    // Execute command
    let result = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args, &ctx),
        Commands::Config(args) => commands::config::run(args, &ctx),
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
