//! Persisted per-bundle bookkeeping.
//!
//! Namespaces:
//! - `host`: the host application's last launched version code
//! - `bundle-versions`: version code per bundle
//! - `bundle-modifies`: source file modification time per bundle
//! - `bundle-upgrades`: pending-upgrade flag per bundle

pub mod store;

pub use store::{JsonFileStore, MemoryStore};

use bundlehost_api::{ApiResult, PreferenceStore};
use serde_json::Value;
use std::sync::Arc;

pub const NS_HOST: &str = "host";
pub const NS_VERSIONS: &str = "bundle-versions";
pub const NS_MODIFIES: &str = "bundle-modifies";
pub const NS_UPGRADES: &str = "bundle-upgrades";

const KEY_HOST_VERSION: &str = "version";

/// Typed view over a [`PreferenceStore`].
#[derive(Clone)]
pub struct BundlePreferences {
    store: Arc<dyn PreferenceStore>,
}

impl BundlePreferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    pub fn host_version_code(&self) -> i64 {
        self.get_i64(NS_HOST, KEY_HOST_VERSION)
    }

    pub fn set_host_version_code(&self, version: i64) -> ApiResult<()> {
        self.store.put(NS_HOST, KEY_HOST_VERSION, Value::from(version))
    }

    pub fn bundle_version_code(&self, bundle: &str) -> i64 {
        self.get_i64(NS_VERSIONS, bundle)
    }

    pub fn set_bundle_version_code(&self, bundle: &str, version: i64) -> ApiResult<()> {
        self.store.put(NS_VERSIONS, bundle, Value::from(version))
    }

    /// Last recorded modification time (ms since epoch), 0 when unknown.
    pub fn bundle_last_modified(&self, bundle: &str) -> i64 {
        self.get_i64(NS_MODIFIES, bundle)
    }

    pub fn set_bundle_last_modified(&self, bundle: &str, modified: i64) -> ApiResult<()> {
        self.store.put(NS_MODIFIES, bundle, Value::from(modified))
    }

    pub fn bundle_upgraded(&self, bundle: &str) -> bool {
        self.store
            .get(NS_UPGRADES, bundle)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn set_bundle_upgraded(&self, bundle: &str, upgraded: bool) -> ApiResult<()> {
        self.store.put(NS_UPGRADES, bundle, Value::from(upgraded))
    }

    /// Any bundle has a pending upgrade.
    pub fn is_upgrading(&self) -> bool {
        self.store
            .entries(NS_UPGRADES)
            .iter()
            .any(|(_, v)| v.as_bool() == Some(true))
    }

    pub fn bundle_versions(&self) -> Vec<(String, i64)> {
        self.store
            .entries(NS_VERSIONS)
            .into_iter()
            .filter_map(|(k, v)| v.as_i64().map(|v| (k, v)))
            .collect()
    }

    fn get_i64(&self, namespace: &str, key: &str) -> i64 {
        self.store
            .get(namespace, key)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }
}
