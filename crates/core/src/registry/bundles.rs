//! Process-wide table of loaded bundles, in load order.

use bundlehost_api::{CodeArchive, ComponentName};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Load-time metadata of one bundle.
///
/// Everything but the enablement flag and the code archive handle is fixed
/// at registration. The code archive is attached once, from the background
/// loader.
#[derive(Debug)]
pub struct LoadedBundle {
    pub name: String,
    /// Package file backing both the code and the resource archive.
    pub source_path: PathBuf,
    pub non_resources: bool,
    pub entry_point: Option<String>,
    pub extract_dir: PathBuf,
    pub optimized_code_file: PathBuf,
    pub library_path: Option<PathBuf>,
    pub version_code: i64,
    pub version_name: Option<String>,
    pub components: Vec<ComponentName>,
    pub entrance: Option<ComponentName>,
    enabled: AtomicBool,
    code_archive: OnceLock<Arc<dyn CodeArchive>>,
}

impl LoadedBundle {
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            non_resources: false,
            entry_point: None,
            extract_dir: PathBuf::new(),
            optimized_code_file: PathBuf::new(),
            library_path: None,
            version_code: 0,
            version_name: None,
            components: Vec::new(),
            entrance: None,
            enabled: AtomicBool::new(true),
            code_archive: OnceLock::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// A bundle without components can be merged but not launched.
    pub fn is_launchable(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn code_archive(&self) -> Option<Arc<dyn CodeArchive>> {
        self.code_archive.get().cloned()
    }

    /// Attach the opened code archive. Returns `false` if one was already set.
    pub fn attach_code_archive(&self, archive: Arc<dyn CodeArchive>) -> bool {
        self.code_archive.set(archive).is_ok()
    }
}

/// Registry of loaded bundles keyed by bundle name.
#[derive(Default)]
pub struct BundleRegistry {
    bundles: RwLock<IndexMap<String, Arc<LoadedBundle>>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-fetch. `init` runs only when `name` is not registered yet,
    /// under the registry's write lock.
    pub fn register(
        &self,
        name: &str,
        init: impl FnOnce() -> LoadedBundle,
    ) -> Arc<LoadedBundle> {
        {
            let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(bundle) = bundles.get(name) {
                return bundle.clone();
            }
        }

        let mut bundles = self.bundles.write().unwrap_or_else(PoisonError::into_inner);
        bundles
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(init()))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoadedBundle>> {
        let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
        bundles.get(name).cloned()
    }

    /// Snapshot in load order.
    pub fn all(&self) -> Vec<Arc<LoadedBundle>> {
        let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
        bundles.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
        bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[derive(Debug)]
    struct Archive(PathBuf);

    impl CodeArchive for Archive {
        fn path(&self) -> &Path {
            &self.0
        }
    }

    #[test]
    fn test_register_is_create_or_fetch() {
        let registry = BundleRegistry::new();
        let first = registry.register("a", || LoadedBundle::new("a", "/a.pkg"));
        let second = registry.register("a", || LoadedBundle::new("a", "/other.pkg"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.source_path, PathBuf::from("/a.pkg"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_all_preserves_load_order() {
        let registry = BundleRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(name, || LoadedBundle::new(name, format!("/{name}.pkg")));
        }

        let names: Vec<_> = registry.all().iter().map(|b| b.name.clone()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_code_archive_attaches_once() {
        let bundle = LoadedBundle::new("a", "/a.pkg");
        assert!(bundle.code_archive().is_none());
        assert!(bundle.attach_code_archive(Arc::new(Archive("/a.pkg".into()))));
        assert!(!bundle.attach_code_archive(Arc::new(Archive("/b.pkg".into()))));
        assert_eq!(bundle.code_archive().unwrap().path(), Path::new("/a.pkg"));
    }

    #[test]
    fn test_disable_flag() {
        let bundle = LoadedBundle::new("a", "/a.pkg");
        assert!(bundle.is_enabled());
        bundle.set_enabled(false);
        assert!(!bundle.is_enabled());
    }
}
