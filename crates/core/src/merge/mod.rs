//! Namespace merge: folds every loaded bundle into the host's single code
//! resolution chain and resource resolution chain.
//!
//! ## Ordering
//!
//! ```text
//! resources:  [host, b1, b2, ...]   bundles flagged non_resources skipped
//! code:       host code, then [b1, b2, ...]   (host wins on conflict)
//! native:     host paths, then bundle library dirs
//! ```
//!
//! A merge runs once per session. Chains installed by a previous merge
//! cannot be replaced cleanly, so a second call is refused.

use crate::error::MergeError;
use crate::registry::LoadedBundle;
use bundlehost_api::{BridgeError, CodeArchive, PlatformBridge};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Chains computed from the loaded bundles, before installation.
#[derive(Debug, Default)]
pub struct MergePlan {
    pub resource_chain: Vec<PathBuf>,
    pub code_chain: Vec<Arc<dyn CodeArchive>>,
    pub native_paths: Vec<PathBuf>,
    /// Enabled bundles whose code archive never opened.
    pub missing_code: Vec<String>,
}

impl MergePlan {
    /// Compute chains for `bundles`, taken in load order. Disabled bundles
    /// are left out of every chain.
    pub fn build(host_resource_path: PathBuf, bundles: &[Arc<LoadedBundle>]) -> Self {
        let mut plan = MergePlan {
            resource_chain: vec![host_resource_path],
            ..Default::default()
        };

        for bundle in bundles.iter().filter(|b| b.is_enabled()) {
            if !bundle.non_resources {
                plan.resource_chain.push(bundle.source_path.clone());
            }

            match bundle.code_archive() {
                Some(archive) => plan.code_chain.push(archive),
                None => plan.missing_code.push(bundle.name.clone()),
            }

            if let Some(lib) = &bundle.library_path {
                plan.native_paths.push(lib.clone());
            }
        }

        plan
    }
}

/// Outcome of a completed merge.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub resource_chain: Vec<PathBuf>,
    pub code_archives: Vec<PathBuf>,
    pub native_paths: Vec<PathBuf>,
    /// Handles the resource chain was installed into.
    pub resource_handles: usize,
    pub missing_code: Vec<String>,
    /// Stages the platform refused. Later stages still ran.
    pub failures: Vec<MergeError>,
}

pub struct NamespaceMerger {
    bridge: Arc<dyn PlatformBridge>,
    merged: AtomicBool,
}

impl NamespaceMerger {
    pub fn new(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self {
            bridge,
            merged: AtomicBool::new(false),
        }
    }

    pub fn is_merged(&self) -> bool {
        self.merged.load(Ordering::Acquire)
    }

    /// Install merged chains. Must run on the platform dispatch thread.
    ///
    /// A refused platform call is logged and recorded in the report; the
    /// remaining stages still run. Only a repeated merge is an error.
    pub fn merge(&self, bundles: &[Arc<LoadedBundle>]) -> Result<MergeReport, MergeError> {
        if self
            .merged
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MergeError::AlreadyMerged);
        }

        let plan = MergePlan::build(self.bridge.host_resource_path(), bundles);
        for name in &plan.missing_code {
            tracing::warn!("Bundle {} has no code archive; left out of the code chain", name);
        }

        let mut failures = Vec::new();

        let handles = match self.bridge.live_resource_handles() {
            Ok(handles) => handles,
            Err(source) => {
                failures.push(refused("live_resource_handles", source));
                Vec::new()
            }
        };
        let mut installed = 0;
        for handle in &handles {
            match self
                .bridge
                .install_resource_chain(*handle, &plan.resource_chain)
            {
                Ok(()) => installed += 1,
                Err(source) => failures.push(refused("install_resource_chain", source)),
            }
        }
        if let Err(source) = self.bridge.invalidate_attribute_caches() {
            failures.push(refused("invalidate_attribute_caches", source));
        }

        if !plan.code_chain.is_empty() {
            if let Err(source) = self.bridge.install_code_chain(&plan.code_chain) {
                failures.push(refused("install_code_chain", source));
            }
        }

        if !plan.native_paths.is_empty() {
            if let Err(source) = self.bridge.install_native_library_paths(&plan.native_paths) {
                failures.push(refused("install_native_library_paths", source));
            }
        }

        tracing::info!(
            "Merged {} resource roots into {}/{} handle(s), {} code archive(s), {} failure(s)",
            plan.resource_chain.len(),
            installed,
            handles.len(),
            plan.code_chain.len(),
            failures.len()
        );

        Ok(MergeReport {
            code_archives: plan
                .code_chain
                .iter()
                .map(|a| a.path().to_path_buf())
                .collect(),
            resource_chain: plan.resource_chain,
            native_paths: plan.native_paths,
            resource_handles: installed,
            missing_code: plan.missing_code,
            failures,
        })
    }
}

fn refused(stage: &'static str, source: BridgeError) -> MergeError {
    tracing::error!("Platform refused {}: {}", stage, source);
    MergeError::Bridge { stage, source }
}
