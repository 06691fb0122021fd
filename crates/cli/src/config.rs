use bundlehost_core::RuntimeConfig;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse the config file and print the effective values
    Check,
    /// Print the JSON schema of the config file
    Schema,
}

pub fn run(config_path: &Path, cmd: ConfigCommands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommands::Check => {
            if !config_path.exists() {
                println!("{} not found; defaults apply", config_path.display());
            }
            let config = bundlehost_runtime::load_config(config_path)?;
            if config.slots_per_mode == 0 {
                return Err("slots_per_mode must be at least 1".into());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Schema => {
            println!("{}", serde_json::to_string_pretty(&RuntimeConfig::schema())?);
        }
    }
    Ok(())
}
