mod config;
mod prefs;
mod stubs;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use config::ConfigCommands;
pub use prefs::PrefsCommands;

#[derive(Parser)]
#[command(
    name = "bundlehost",
    version,
    about = "Inspect and configure a bundle-loading host",
    long_about = "bundlehost prints the stub components a host must declare ahead of time, \
                  inspects the persisted bundle bookkeeping and validates runtime config files."
)]
pub struct Cli {
    /// Config file (defaults to ~/.bundlehost/config.json)
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the stub identities the host must declare
    #[command(
        long_about = "Lists every stub identity derived from the configured prefix and slot count, \
                      with the launch mode each one must be declared with."
    )]
    Stubs {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Inspect or clear persisted bundle preferences
    #[command(subcommand)]
    Prefs(PrefsCommands),
    /// Validate a config file or print its schema
    #[command(subcommand)]
    Config(ConfigCommands),
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = bundlehost_runtime::init_logging("cli", false);

    let config_path = cli
        .config
        .unwrap_or_else(bundlehost_runtime::default_config_path);

    match cli.command {
        Commands::Stubs { json } => stubs::run(&config_path, json),
        Commands::Prefs(cmd) => prefs::run(&config_path, cmd),
        Commands::Config(cmd) => config::run(&config_path, cmd),
    }
}
