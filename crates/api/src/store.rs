use crate::error::ApiResult;
use serde_json::Value;

/// Small namespaced key-value store that survives process restarts.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;

    fn put(&self, namespace: &str, key: &str, value: Value) -> ApiResult<()>;

    /// All entries of a namespace, sorted by key.
    fn entries(&self, namespace: &str) -> Vec<(String, Value)>;

    fn clear(&self) -> ApiResult<()>;
}
