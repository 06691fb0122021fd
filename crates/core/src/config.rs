//! Runtime configuration.
//!
//! Every field has a default so an empty JSON object is a valid config.

use crate::error::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STORAGE_DIR: &str = ".bundlehost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Prefix of every stub identity the host declares.
    pub stub_prefix: String,
    /// Stub slots per exclusive launch mode.
    pub slots_per_mode: usize,
    /// Bundle types this runtime accepts.
    pub supported_types: Vec<String>,
    /// Suffix probed when a requested component name is unknown.
    pub implied_suffix: String,
    /// Delay before killing background processes during an upgrade.
    pub recovery_delay_ms: u64,
    /// Root for extracted bundle files.
    pub storage_dir: PathBuf,
    /// File name of the optimised code archive inside the extract path.
    pub optimized_code_file: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stub_prefix: "bundlehost.stub.A".to_string(),
            slots_per_mode: 4,
            supported_types: vec!["app".to_string(), "lib".to_string()],
            implied_suffix: "Activity".to_string(),
            recovery_delay_ms: 300,
            storage_dir: default_storage_dir(),
            optimized_code_file: "bundle.code".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config = serde_json::from_slice(&bytes)?;
        Ok(config)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn with_slots_per_mode(mut self, slots: usize) -> Self {
        self.slots_per_mode = slots;
        self
    }

    pub fn with_recovery_delay(mut self, delay: Duration) -> Self {
        self.recovery_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }

    /// Directory where a bundle's entries are extracted.
    pub fn extract_dir(&self, package_name: &str) -> PathBuf {
        self.storage_dir.join("storage").join(package_name)
    }

    /// Location of the persisted preference file.
    pub fn preferences_file(&self) -> PathBuf {
        self.storage_dir.join("preferences.json")
    }

    /// JSON schema of the config file.
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(RuntimeConfig)
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_STORAGE_DIR)
}
