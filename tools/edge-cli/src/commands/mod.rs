//! CLI command implementations.

pub mod config;
pub mod simulate;

use clap::{Args, Subcommand};

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Request path and query, e.g. `/guess?value=5000`.
    pub target: String,

    /// HTTP method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,

    /// Cookie sent by the client (repeatable).
    #[arg(long = "cookie", value_name = "NAME=VALUE")]
    pub cookies: Vec<String>,

    /// Country reported by the platform's geolocation.
    #[arg(long)]
    pub country: Option<String>,

    /// Extra request header (repeatable).
    #[arg(long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Ask for cache debug headers.
    #[arg(long)]
    pub debug_cache: bool,

    /// Print the response body.
    #[arg(long)]
    pub body: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
