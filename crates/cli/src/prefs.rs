use bundlehost_core::prefs::{NS_HOST, NS_MODIFIES, NS_UPGRADES, NS_VERSIONS};
use clap::Subcommand;
use std::path::Path;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Show recorded host and bundle state
    Show,
    /// Forget every recorded bundle; the next start verifies all packages again
    Clear,
}

#[derive(Tabled)]
struct PrefRow {
    #[tabled(rename = "Namespace")]
    namespace: &'static str,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn run(config_path: &Path, cmd: PrefsCommands) -> Result<(), Box<dyn std::error::Error>> {
    let config = bundlehost_runtime::load_config(config_path)?;
    let store = bundlehost_runtime::open_preferences(&config)?;

    match cmd {
        PrefsCommands::Show => {
            let mut rows = Vec::new();
            for namespace in [NS_HOST, NS_VERSIONS, NS_MODIFIES, NS_UPGRADES] {
                for (key, value) in store.entries(namespace) {
                    rows.push(PrefRow {
                        namespace,
                        key,
                        value: value.to_string(),
                    });
                }
            }
            if rows.is_empty() {
                println!("No preferences recorded at {}", config.preferences_file().display());
            } else {
                println!("{}", Table::new(rows));
            }
        }
        PrefsCommands::Clear => {
            info!("Clearing preferences at {}", config.preferences_file().display());
            store.clear()?;
            println!("Preferences cleared.");
        }
    }
    Ok(())
}
