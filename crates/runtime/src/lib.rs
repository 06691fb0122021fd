use bundlehost_api::{BundleParser, CodeArchiveLoader, PlatformBridge, PreferenceStore};
use bundlehost_core::prefs::JsonFileStore;
use bundlehost_core::{BundleRuntime, Result, RuntimeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the config file looked up in the storage directory.
pub const CONFIG_FILE: &str = "config.json";

/// Default config location, `~/.bundlehost/config.json`.
pub fn default_config_path() -> PathBuf {
    RuntimeConfig::default().storage_dir.join(CONFIG_FILE)
}

/// Load `path`, or the defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    if path.exists() {
        RuntimeConfig::load(path)
    } else {
        tracing::debug!("No config at {}; using defaults", path.display());
        Ok(RuntimeConfig::default())
    }
}

/// Bootstraps a bundle runtime over the host's platform collaborators.
///
/// Config comes from `config_path` (or the default location), preferences
/// persist as JSON under the configured storage directory and main-queue
/// work runs inline. Must be called from within a tokio runtime.
pub fn build_default_runtime(
    bridge: Arc<dyn PlatformBridge>,
    parser: Arc<dyn BundleParser>,
    loader: Arc<dyn CodeArchiveLoader>,
    config_path: Option<&Path>,
) -> Result<BundleRuntime> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => load_config(&default_config_path())?,
    };
    tracing::info!("Bundle storage at {}", config.storage_dir.display());

    BundleRuntime::builder(config)
        .with_bridge(bridge)
        .with_parser(parser)
        .with_loader(loader)
        .build()
}

/// Open the persisted preference store of `config`.
pub fn open_preferences(config: &RuntimeConfig) -> Result<Arc<dyn PreferenceStore>> {
    Ok(Arc::new(JsonFileStore::open(config.preferences_file())?))
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(bundlehost_core::logging::init_logging(component, to_stderr))
}
