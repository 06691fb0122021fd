//! `PreferenceStore` implementations.

use bundlehost_api::{ApiError, ApiResult, PreferenceStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

type Namespaces = BTreeMap<String, BTreeMap<String, Value>>;

/// Volatile store; the default for tests and hosts without persistence.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Namespaces>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(namespace).and_then(|ns| ns.get(key)).cloned()
    }

    fn put(&self, namespace: &str, key: &str, value: Value) -> ApiResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn entries(&self, namespace: &str) -> Vec<(String, Value)> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(namespace)
            .map(|ns| ns.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn clear(&self) -> ApiResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.clear();
        Ok(())
    }
}

/// Store persisted as one JSON document, rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<Namespaces>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty; a corrupt one
    /// is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> ApiResult<Self> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Namespaces>(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Discarding corrupt preference file {}: {}", path.display(), e);
                    Namespaces::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Namespaces::new(),
            Err(e) => return Err(storage_error(&path, e)),
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &Namespaces) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
        }
        let bytes =
            serde_json::to_vec_pretty(data).map_err(|e| ApiError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| storage_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, e))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(namespace).and_then(|ns| ns.get(key)).cloned()
    }

    fn put(&self, namespace: &str, key: &str, value: Value) -> ApiResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.persist(&data)
    }

    fn entries(&self, namespace: &str) -> Vec<(String, Value)> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(namespace)
            .map(|ns| ns.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn clear(&self) -> ApiResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> ApiError {
    ApiError::Storage(format!("{}: {}", path.display(), err))
}
