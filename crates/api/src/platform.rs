//! Seams into the host platform.
//!
//! The engine never reaches into platform internals directly. Everything
//! version-specific sits behind [`PlatformBridge`]; lifecycle interception is
//! an explicit [`LifecycleDelegate`] the runtime installs once.

use crate::archive::CodeArchive;
use crate::error::BridgeResult;
use crate::models::{
    BundleContext, ComponentName, LaunchRecord, LaunchRequest, ObjectKind, ScreenOrientation,
};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifies one live resource-resolution handle (one per configuration
/// context on most platforms).
pub type ResourceHandleId = u64;

/// Token identifying an installed lifecycle delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegateId(pub u64);

/// Capability interface over the host platform's internals.
pub trait PlatformBridge: Send + Sync {
    /// Package identity of the host application.
    fn host_package(&self) -> &str;

    /// Components the host declared ahead of time (including stubs).
    fn host_components(&self) -> Vec<ComponentName>;

    /// The host's own resource archive.
    fn host_resource_path(&self) -> PathBuf;

    /// Whether the platform (system or host) already handles an implicit request.
    fn host_resolves(&self, request: &LaunchRequest) -> bool;

    /// Every resource handle currently reachable from the process.
    fn live_resource_handles(&self) -> BridgeResult<Vec<ResourceHandleId>>;

    /// Replace the resolution chain of one resource handle.
    fn install_resource_chain(&self, handle: ResourceHandleId, chain: &[PathBuf])
    -> BridgeResult<()>;

    /// Drop cached derived attributes tied to the old resource chain.
    fn invalidate_attribute_caches(&self) -> BridgeResult<()>;

    /// Append code archives after the host's own code.
    fn install_code_chain(&self, archives: &[Arc<dyn CodeArchive>]) -> BridgeResult<()>;

    /// Append native library directories after host-declared ones.
    fn install_native_library_paths(&self, paths: &[PathBuf]) -> BridgeResult<()>;

    /// Install the process-wide lifecycle delegate and return the one it replaces.
    fn install_lifecycle_delegate(
        &self,
        delegate: Arc<dyn LifecycleDelegate>,
    ) -> BridgeResult<Option<Arc<dyn LifecycleDelegate>>>;

    /// Run a bundle's own initialisation entry point.
    fn start_bundle_entry(&self, context: &BundleContext) -> BridgeResult<()>;

    /// Instantiate an object class exported by a merged bundle.
    fn instantiate_object(
        &self,
        _kind: &ObjectKind,
        class_name: &str,
    ) -> BridgeResult<Box<dyn Any + Send>> {
        Err(crate::error::BridgeError::Unsupported {
            capability: "instantiate_object",
            detail: class_name.to_string(),
        })
    }
}

/// A live component instance as exposed by the platform.
pub trait ComponentInstance: Send {
    /// Real identity of the instance, taken from the restored descriptor.
    ///
    /// Must not be the stub it was launched through; stub bindings are
    /// looked up and released by this name.
    fn component(&self) -> &ComponentName;

    fn set_soft_input_mode(&mut self, mode: u32);

    fn set_screen_orientation(&mut self, orientation: ScreenOrientation);

    /// Delegate the instance currently dispatches through.
    fn delegate(&self) -> Option<DelegateId>;

    fn set_delegate(&mut self, delegate: DelegateId);
}

/// Hooks the platform calls around component launches and lifecycle transitions.
///
/// All methods default to no-ops so hosts can implement only what they need.
pub trait LifecycleDelegate: Send + Sync {
    /// Outgoing: a request is about to be handed to the platform.
    fn prepare_launch(&self, _request: &mut LaunchRequest) {}

    /// Incoming: the platform is about to instantiate the component in `record`.
    fn resolve_launch(&self, _record: &mut LaunchRecord) {}

    fn on_create(&self, _instance: &mut dyn ComponentInstance) {}

    fn on_stop(&self, _instance: &dyn ComponentInstance) {}

    fn on_destroy(&self, _instance: &dyn ComponentInstance) {}
}

/// Delegate that does nothing; what a platform runs with before any host hook.
#[derive(Debug, Default)]
pub struct NoopDelegate;

impl LifecycleDelegate for NoopDelegate {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Importance {
    Foreground,
    Visible,
    Service,
    Background,
    Cached,
}

#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Packages hosted by the process.
    pub packages: Vec<String>,
    pub importance: Importance,
}

/// OS process table scoped to what the host may see and signal.
pub trait ProcessTable: Send + Sync {
    fn running_processes(&self) -> Vec<ProcessInfo>;

    fn kill(&self, pid: u32) -> std::io::Result<()>;
}

pub type MainTask = Box<dyn FnOnce() + Send + 'static>;

/// The platform's main dispatch queue.
pub trait MainDispatcher: Send + Sync {
    fn post(&self, task: MainTask);
}
