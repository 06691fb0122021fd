//! Bundle launcher: preload, load and prelaunch of bundle packages.
//!
//! ```text
//! preload:   type check -> extract dir -> builtin/patch pick -> verify if modified
//! load:      registry entry -> components + filters -> code archive (background)
//! prelaunch: component lookup (+ implied suffix) -> explicit LaunchRequest
//! ```

pub mod object;
pub mod preload;

use crate::config::RuntimeConfig;
use crate::error::{BundleHostError, Result};
use crate::prefs::BundlePreferences;
use crate::registry::{BundleRegistry, ComponentTable, LoadedBundle};
use crate::resolve::FilterIndex;
use bundlehost_api::{
    BundleDescriptor, BundleExtractor, BundleParser, CodeArchiveLoader, ComponentName,
    ComponentRequest, LaunchRequest, ParsedBundle,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Extras key carrying the query string of a [`ComponentRequest`].
pub const QUERY_EXTRA: &str = "bundlehost-query";

/// A bundle that passed preload and is ready to be registered.
#[derive(Debug)]
pub struct PreparedBundle {
    pub descriptor: BundleDescriptor,
    pub file: PathBuf,
    pub parsed: ParsedBundle,
    /// Cleared when verification failed.
    pub enabled: bool,
}

pub struct BundleLauncher {
    config: Arc<RuntimeConfig>,
    prefs: BundlePreferences,
    parser: Arc<dyn BundleParser>,
    loader: Arc<dyn CodeArchiveLoader>,
    registry: Arc<BundleRegistry>,
    components: Arc<ComponentTable>,
    filters: Arc<FilterIndex>,
    handle: Handle,
    /// Code archive opens not yet awaited.
    pending: Mutex<Vec<(String, JoinHandle<bool>)>>,
}

impl BundleLauncher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<RuntimeConfig>,
        prefs: BundlePreferences,
        parser: Arc<dyn BundleParser>,
        loader: Arc<dyn CodeArchiveLoader>,
        registry: Arc<BundleRegistry>,
        components: Arc<ComponentTable>,
        filters: Arc<FilterIndex>,
        handle: Handle,
    ) -> Self {
        Self {
            config,
            prefs,
            parser,
            loader,
            registry,
            components,
            filters,
            handle,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Check and prepare one bundle.
    ///
    /// `Ok(None)` means the bundle is not for this runtime or has no readable
    /// package. A bundle that fails verification is still returned, disabled.
    pub fn preload(&self, descriptor: BundleDescriptor) -> Result<Option<PreparedBundle>> {
        let name = descriptor.package_name.clone();
        if !preload::is_supported(&descriptor, &self.config.supported_types) {
            tracing::debug!("Skipping {}: unsupported bundle type", name);
            return Ok(None);
        }

        std::fs::create_dir_all(self.config.extract_dir(&name))?;

        let Some(selected) = preload::select_file(&descriptor, self.parser.as_ref()) else {
            tracing::warn!("Skipping {}: no readable package", name);
            return Ok(None);
        };

        let mut enabled = true;
        let modified = preload::modified_millis(&selected.file);
        if modified != self.prefs.bundle_last_modified(&name) {
            if self.parser.verify_and_extract(&selected.parsed, self) {
                self.prefs.set_bundle_last_modified(&name, modified)?;
            } else {
                tracing::error!(
                    "Verification failed for {} ({}); bundle disabled",
                    name,
                    selected.file.display()
                );
                enabled = false;
            }
        }

        if enabled {
            self.prefs
                .set_bundle_version_code(&name, selected.parsed.version_code)?;
        }

        Ok(Some(PreparedBundle {
            descriptor,
            file: selected.file,
            parsed: selected.parsed,
            enabled,
        }))
    }

    /// Register a prepared bundle and start opening its code archive.
    pub fn load(&self, prepared: PreparedBundle) -> Arc<LoadedBundle> {
        let PreparedBundle {
            descriptor,
            file,
            parsed,
            enabled,
        } = prepared;
        let name = descriptor.package_name;
        if let Some(existing) = self.registry.get(&name) {
            tracing::debug!("Bundle {} already loaded", name);
            return existing;
        }

        let extract_dir = self.config.extract_dir(&name);
        let optimized = extract_dir.join(&self.config.optimized_code_file);

        let bundle = self.registry.register(&name, || {
            let mut bundle = LoadedBundle::new(name.clone(), file.clone());
            bundle.non_resources = parsed.non_resources;
            bundle.entry_point = parsed.entry_point.clone();
            bundle.library_path = parsed
                .library_directory
                .as_ref()
                .map(|dir| extract_dir.join(dir));
            bundle.extract_dir = extract_dir.clone();
            bundle.optimized_code_file = optimized.clone();
            bundle.version_code = parsed.version_code;
            bundle.version_name = parsed.version_name.clone();
            bundle.components = parsed.components.iter().map(|c| c.name.clone()).collect();
            bundle.entrance = parsed
                .default_component
                .clone()
                .or_else(|| bundle.components.first().cloned());
            bundle.set_enabled(enabled);
            bundle
        });

        if !bundle.is_enabled() {
            return bundle;
        }

        for descriptor in parsed.components {
            self.components.register(descriptor);
        }
        self.filters.register_batch(parsed.intent_filters);

        if self.prefs.bundle_upgraded(&name) {
            // The optimised archive was built from the previous package.
            match std::fs::remove_file(&bundle.optimized_code_file) {
                Ok(()) => tracing::info!("Dropped optimised code of upgraded {}", name),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to drop optimised code of {}: {}", name, e),
            }
        }

        let loader = self.loader.clone();
        let target = bundle.clone();
        let task = self.handle.spawn_blocking(move || {
            match loader.open(&target.source_path, &target.optimized_code_file) {
                Ok(archive) => target.attach_code_archive(archive),
                Err(e) => {
                    tracing::error!("Failed to open code archive of {}: {}", target.name, e);
                    false
                }
            }
        });
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name, task));

        if !bundle.is_launchable() {
            tracing::debug!("Bundle {} declares no components", bundle.name);
        }
        bundle
    }

    /// Wait for every code archive opened so far. Returns how many attached.
    pub async fn await_pending(&self) -> usize {
        let tasks: Vec<_> = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );

        let mut attached = 0;
        for (name, task) in tasks {
            match task.await {
                Ok(true) => attached += 1,
                Ok(false) => {}
                Err(e) => tracing::error!("Code archive task for {} failed: {}", name, e),
            }
        }
        attached
    }

    /// Build the explicit launch request for a component of a loaded bundle.
    ///
    /// An empty component name targets the bundle's entrance. Unknown names
    /// are retried once with the implied suffix appended.
    pub fn prelaunch(&self, request: &ComponentRequest) -> Result<LaunchRequest> {
        let bundle = self
            .registry
            .get(&request.bundle)
            .filter(|b| b.is_enabled())
            .ok_or_else(|| BundleHostError::BundleNotFound(request.bundle.clone()))?;

        let target = if request.component.as_str().is_empty() {
            bundle
                .entrance
                .clone()
                .ok_or_else(|| BundleHostError::component_not_found(&request.component))?
        } else {
            self.resolve_component(&request.component)?
        };

        let mut launch = LaunchRequest::explicit(target);
        if let Some(query) = &request.query {
            launch = launch.with_extra(QUERY_EXTRA, format!("?{query}"));
        }
        Ok(launch)
    }

    fn resolve_component(&self, name: &ComponentName) -> Result<ComponentName> {
        if self.components.contains(name) {
            return Ok(name.clone());
        }

        let suffix = self.config.implied_suffix.as_str();
        if !suffix.is_empty() && !name.as_str().ends_with(suffix) {
            let implied = name.with_suffix(suffix);
            if self.components.contains(&implied) {
                return Ok(implied);
            }
        }
        Err(BundleHostError::component_not_found(name))
    }
}

impl BundleExtractor for BundleLauncher {
    fn extract_path(&self, package_name: &str) -> Option<PathBuf> {
        Some(self.config.extract_dir(package_name))
    }

    /// Only native libraries are extracted.
    fn extract_file(&self, package_name: &str, entry_name: &str) -> Option<PathBuf> {
        if !entry_name.ends_with(".so") {
            return None;
        }
        Some(self.config.extract_dir(package_name).join(entry_name))
    }
}
