//! Forced reload after an upgrade.
//!
//! When a bundle has a pending upgrade and the application drops to the
//! background, every process of the application is killed so the next
//! launch loads the new code. In-memory state is lost; components must rely
//! on their own save/restore lifecycle.

use crate::prefs::BundlePreferences;
use bundlehost_api::{Importance, ProcessTable};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub struct UpgradeRecovery {
    prefs: BundlePreferences,
    processes: Option<Arc<dyn ProcessTable>>,
    host_package: String,
    delay: Duration,
    handle: Handle,
}

impl UpgradeRecovery {
    pub fn new(
        prefs: BundlePreferences,
        processes: Option<Arc<dyn ProcessTable>>,
        host_package: impl Into<String>,
        delay: Duration,
        handle: Handle,
    ) -> Self {
        Self {
            prefs,
            processes,
            host_package: host_package.into(),
            delay,
            handle,
        }
    }

    /// Called when a tracked instance stops. Schedules the kill when an
    /// upgrade is pending and no application process is in the foreground.
    ///
    /// The returned task resolves to the number of processes killed.
    pub fn on_background(&self) -> Option<JoinHandle<usize>> {
        if !self.prefs.is_upgrading() {
            return None;
        }
        let table = self.processes.as_ref()?.clone();

        let targets: Vec<_> = table
            .running_processes()
            .into_iter()
            .filter(|p| p.packages.iter().any(|pkg| *pkg == self.host_package))
            .collect();
        if targets.is_empty() {
            return None;
        }
        if targets.iter().any(|p| p.importance == Importance::Foreground) {
            return None;
        }

        let pids: Vec<u32> = targets.iter().map(|p| p.pid).collect();
        tracing::info!(
            "Upgrade pending and {} in background; killing {:?} in {:?}",
            self.host_package,
            pids,
            self.delay
        );

        let delay = self.delay;
        Some(self.handle.spawn(async move {
            // Let in-flight restarts settle before tearing down.
            tokio::time::sleep(delay).await;
            let mut killed = 0;
            for pid in pids {
                // The list may be stale by now.
                match table.kill(pid) {
                    Ok(()) => killed += 1,
                    Err(e) => tracing::debug!("Failed to kill process {}: {}", pid, e),
                }
            }
            killed
        }))
    }
}
