//! Runtime root context.
//!
//! A [`BundleRuntime`] owns every table the engine needs for one process
//! session. Nothing is global; tests build as many isolated runtimes as
//! they like.
//!
//! Session order:
//!
//! ```text
//! pre_set_up(host_version) -> set_up() -> load_bundles(..) -> post_setup().await
//!                                               |
//!                             prelaunch(..) / lifecycle callbacks
//! ```

mod builder;

pub use builder::BundleRuntimeBuilder;

use crate::config::RuntimeConfig;
use crate::error::{BundleHostError, Result};
use crate::launcher::{BundleLauncher, object};
use crate::merge::{MergeReport, NamespaceMerger};
use crate::prefs::BundlePreferences;
use crate::redirect::RedirectInterceptor;
use crate::registry::{BundleRegistry, ComponentTable, LoadedBundle};
use crate::resolve::FilterIndex;
use crate::stub::StubPool;
use bundlehost_api::{
    BundleContext, BundleDescriptor, BundleExtractor, ComponentRequest, LaunchRequest,
    MainDispatcher, ObjectKind, PlatformBridge,
};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

pub struct BundleRuntime {
    config: Arc<RuntimeConfig>,
    bridge: Arc<dyn PlatformBridge>,
    dispatcher: Arc<dyn MainDispatcher>,
    prefs: BundlePreferences,
    stubs: Arc<StubPool>,
    registry: Arc<BundleRegistry>,
    components: Arc<ComponentTable>,
    filters: Arc<FilterIndex>,
    launcher: BundleLauncher,
    merger: Arc<NamespaceMerger>,
    interceptor: Arc<RedirectInterceptor>,
    new_host: AtomicBool,
    set_up: AtomicBool,
}

impl BundleRuntime {
    pub fn builder(config: RuntimeConfig) -> BundleRuntimeBuilder {
        BundleRuntimeBuilder::new(config)
    }

    /// Record the running host version. A change from the persisted one
    /// marks this launch as a new host.
    pub fn pre_set_up(&self, host_version: i64) -> Result<()> {
        let previous = self.prefs.host_version_code();
        if previous != host_version {
            tracing::info!("Host version changed: {} -> {}", previous, host_version);
            self.new_host.store(true, Ordering::Release);
            self.prefs.set_host_version_code(host_version)?;
        }
        Ok(())
    }

    pub fn is_new_host(&self) -> bool {
        self.new_host.load(Ordering::Acquire)
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up.load(Ordering::Acquire)
    }

    /// First set-up after the host was installed or upgraded.
    pub fn is_first_set_up(&self) -> bool {
        self.is_new_host() && !self.is_set_up()
    }

    /// Install the redirection interceptor. Idempotent.
    ///
    /// A platform that refuses the interceptor leaves the runtime usable;
    /// bundle components just cannot be launched through stubs.
    pub fn set_up(&self) -> Result<()> {
        if self.is_set_up() {
            return Ok(());
        }
        if !self.interceptor.install() {
            tracing::warn!("Continuing without launch redirection");
        }
        self.set_up.store(true, Ordering::Release);
        tracing::info!("Bundle runtime set up");
        Ok(())
    }

    /// Preload and load one bundle. `Ok(None)` when the bundle was skipped.
    pub fn load_bundle(&self, descriptor: BundleDescriptor) -> Result<Option<Arc<LoadedBundle>>> {
        if !self.is_set_up() {
            return Err(BundleHostError::NotSetUp("load_bundle"));
        }
        let Some(prepared) = self.launcher.preload(descriptor)? else {
            return Ok(None);
        };
        Ok(Some(self.launcher.load(prepared)))
    }

    /// Load bundles in order. A bundle that fails is logged and skipped.
    pub fn load_bundles(
        &self,
        descriptors: impl IntoIterator<Item = BundleDescriptor>,
    ) -> Result<Vec<Arc<LoadedBundle>>> {
        if !self.is_set_up() {
            return Err(BundleHostError::NotSetUp("load_bundles"));
        }

        let mut loaded = Vec::new();
        for descriptor in descriptors {
            let name = descriptor.package_name.clone();
            match self.load_bundle(descriptor) {
                Ok(Some(bundle)) => loaded.push(bundle),
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to load bundle {}: {}", name, e),
            }
        }
        tracing::info!("Loaded {} bundle(s)", loaded.len());
        Ok(loaded)
    }

    pub fn prelaunch(&self, request: &ComponentRequest) -> Result<LaunchRequest> {
        self.launcher.prelaunch(request)
    }

    /// Finish start-up: wait for code archives, merge namespaces on the
    /// main queue, then start every bundle's entry point.
    ///
    /// Stages the platform refuses are listed in the report's `failures`;
    /// entry points are started regardless. Only a second call fails.
    pub async fn post_setup(&self) -> Result<MergeReport> {
        if !self.is_set_up() {
            return Err(BundleHostError::NotSetUp("post_setup"));
        }

        let attached = self.launcher.await_pending().await;
        tracing::debug!("{} code archive(s) attached", attached);

        let bundles = self.registry.all();
        for bundle in &bundles {
            if self.prefs.bundle_upgraded(&bundle.name) {
                match self.prefs.set_bundle_upgraded(&bundle.name, false) {
                    Ok(()) => tracing::info!("Upgrade of {} applied", bundle.name),
                    Err(e) => tracing::error!("Failed to clear upgrade of {}: {}", bundle.name, e),
                }
            }
        }

        let (tx, rx) = oneshot::channel();
        let merger = self.merger.clone();
        let to_merge = bundles.clone();
        self.dispatcher.post(Box::new(move || {
            let _ = tx.send(merger.merge(&to_merge));
        }));
        let report = rx
            .await
            .map_err(|_| BundleHostError::Internal("merge task dropped by main queue".into()))??;
        if !report.failures.is_empty() {
            tracing::warn!(
                "Namespace merge degraded: {} platform call(s) refused",
                report.failures.len()
            );
        }

        for bundle in bundles.iter().filter(|b| b.is_enabled()) {
            let Some(entry_point) = bundle.entry_point.clone() else {
                continue;
            };
            let context = BundleContext {
                package_name: bundle.name.clone(),
                resource_path: bundle.source_path.clone(),
                entry_point,
            };
            let bridge = self.bridge.clone();
            self.dispatcher.post(Box::new(move || {
                if let Err(e) = bridge.start_bundle_entry(&context) {
                    tracing::error!(
                        "Entry point {} of {} failed: {}",
                        context.entry_point,
                        context.package_name,
                        e
                    );
                }
            }));
        }

        Ok(report)
    }

    /// Flag `bundle` as upgraded. Once the application goes to the
    /// background its processes are restarted to pick up the new package.
    pub fn mark_upgraded(&self, bundle: &str) -> Result<()> {
        self.prefs.set_bundle_upgraded(bundle, true)?;
        Ok(())
    }

    pub fn extract_path(&self, bundle: &str) -> Option<PathBuf> {
        self.launcher.extract_path(bundle)
    }

    pub fn extract_file(&self, bundle: &str, entry_name: &str) -> Option<PathBuf> {
        self.launcher.extract_file(bundle, entry_name)
    }

    /// Instantiate an object exported by a loaded bundle.
    pub fn create_object(
        &self,
        bundle: &str,
        kind: &ObjectKind,
        path: &str,
    ) -> Result<Box<dyn Any + Send>> {
        let loaded = self
            .registry
            .get(bundle)
            .filter(|b| b.is_enabled())
            .ok_or_else(|| BundleHostError::BundleNotFound(bundle.to_string()))?;
        let class_name = object::resolve_class_name(&loaded.name, kind, path);
        Ok(self.bridge.instantiate_object(kind, &class_name)?)
    }

    pub fn interceptor(&self) -> &Arc<RedirectInterceptor> {
        &self.interceptor
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn preferences(&self) -> &BundlePreferences {
        &self.prefs
    }

    pub fn stubs(&self) -> &Arc<StubPool> {
        &self.stubs
    }

    pub fn registry(&self) -> &Arc<BundleRegistry> {
        &self.registry
    }

    pub fn components(&self) -> &Arc<ComponentTable> {
        &self.components
    }

    pub fn filters(&self) -> &Arc<FilterIndex> {
        &self.filters
    }

    pub fn bridge(&self) -> &Arc<dyn PlatformBridge> {
        &self.bridge
    }
}
