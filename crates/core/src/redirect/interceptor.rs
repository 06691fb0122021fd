//! Identity redirection between real bundle components and host stubs.
//!
//! The interceptor is installed once as the process-wide lifecycle delegate.
//! Outgoing requests for bundle components are rewritten to name a stub and
//! carry the real name in `LaunchRequest::redirect`; when the platform
//! dispatches the stub, the real descriptor is restored before the instance
//! sees it. Every callback is forwarded to the delegate that was installed
//! before us.

use super::recovery::UpgradeRecovery;
use crate::registry::ComponentTable;
use crate::resolve::FilterIndex;
use crate::stub::StubPool;
use bundlehost_api::{
    ComponentInstance, ComponentName, DelegateId, LaunchRecord, LaunchRequest, LifecycleDelegate,
    NoopDelegate, PlatformBridge,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

static NEXT_DELEGATE_ID: AtomicU64 = AtomicU64::new(1);

pub struct RedirectInterceptor {
    id: DelegateId,
    components: Arc<ComponentTable>,
    filters: Arc<FilterIndex>,
    stubs: Arc<StubPool>,
    bridge: Arc<dyn PlatformBridge>,
    recovery: UpgradeRecovery,
    /// Delegate the platform ran with before installation.
    previous: OnceLock<Arc<dyn LifecycleDelegate>>,
    /// Cleared when platform internals reject us; requests then pass through.
    available: AtomicBool,
    /// Serialises installation.
    install_lock: Mutex<()>,
}

impl RedirectInterceptor {
    pub fn new(
        components: Arc<ComponentTable>,
        filters: Arc<FilterIndex>,
        stubs: Arc<StubPool>,
        bridge: Arc<dyn PlatformBridge>,
        recovery: UpgradeRecovery,
    ) -> Self {
        Self {
            id: DelegateId(NEXT_DELEGATE_ID.fetch_add(1, Ordering::Relaxed)),
            components,
            filters,
            stubs,
            bridge,
            recovery,
            previous: OnceLock::new(),
            available: AtomicBool::new(true),
            install_lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> DelegateId {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn is_installed(&self) -> bool {
        self.previous.get().is_some()
    }

    /// Install into the platform. Safe to call more than once, from any
    /// thread; only the first successful call takes effect.
    pub fn install(self: &Arc<Self>) -> bool {
        let _guard = self.install_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_installed() {
            return true;
        }
        match self.bridge.install_lifecycle_delegate(self.clone()) {
            Ok(previous) => {
                // Forwarding to ourselves would recurse forever.
                let previous = previous
                    .filter(|p| !std::ptr::addr_eq(Arc::as_ptr(p), Arc::as_ptr(self)))
                    .unwrap_or_else(|| Arc::new(NoopDelegate));
                let _ = self.previous.set(previous);
                self.available.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                tracing::error!("Cannot install lifecycle delegate, redirection unavailable: {}", e);
                self.available.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Rewrite a request for a bundle component to target a stub.
    ///
    /// Returns the stub used, or `None` when the request is left untouched:
    /// host-declared or unknown components, implicit requests the platform or
    /// no filter resolves, exhausted stub pools.
    pub fn rewrite_outgoing(&self, request: &mut LaunchRequest) -> Option<ComponentName> {
        if !self.is_available() || request.redirect.is_some() {
            return None;
        }

        let real = match &request.component {
            Some(component) => component.clone(),
            None => {
                if self.bridge.host_resolves(request) {
                    return None;
                }
                match self.filters.resolve_request(request) {
                    Some(component) => component,
                    None => {
                        tracing::debug!("No bundle filter matches {:?}", request.action);
                        return None;
                    }
                }
            }
        };

        if !self.components.needs_redirect(&real) {
            return None;
        }
        let descriptor = self.components.get(&real)?;

        match self.stubs.acquire(
            &real,
            descriptor.launch_mode,
            descriptor.presentation.translucent,
        ) {
            Ok(stub) => {
                tracing::debug!("Redirecting {} through {}", real, stub);
                request.redirect = Some(real);
                request.component = Some(stub.clone());
                Some(stub)
            }
            Err(e) => {
                tracing::error!("Cannot redirect {}: {}", real, e);
                None
            }
        }
    }

    /// Restore the real descriptor on a record the platform built for a stub.
    pub fn rewrite_incoming(&self, record: &mut LaunchRecord) -> bool {
        let Some(real) = record.request.redirect.as_ref() else {
            return false;
        };
        match self.components.get(real) {
            Some(descriptor) => {
                record.descriptor = Some((*descriptor).clone());
                true
            }
            None => {
                tracing::warn!("Redirect marker names unknown component {}", real);
                false
            }
        }
    }

    fn previous(&self) -> Option<&Arc<dyn LifecycleDelegate>> {
        self.previous.get()
    }
}

impl LifecycleDelegate for RedirectInterceptor {
    fn prepare_launch(&self, request: &mut LaunchRequest) {
        self.rewrite_outgoing(request);
        if let Some(previous) = self.previous() {
            previous.prepare_launch(request);
        }
    }

    fn resolve_launch(&self, record: &mut LaunchRecord) {
        self.rewrite_incoming(record);
        if let Some(previous) = self.previous() {
            previous.resolve_launch(record);
        }
    }

    fn on_create(&self, instance: &mut dyn ComponentInstance) {
        if let Some(descriptor) = self.components.get(instance.component()) {
            let presentation = descriptor.presentation;
            instance.set_soft_input_mode(presentation.soft_input_mode);
            instance.set_screen_orientation(presentation.screen_orientation);
        }

        if let Some(previous) = self.previous() {
            previous.on_create(instance);
        }

        // Third-party code may swap the delegate during creation.
        if self.is_installed() && instance.delegate() != Some(self.id) {
            tracing::debug!(
                "Reasserting lifecycle delegate on {} (was {:?})",
                instance.component(),
                instance.delegate()
            );
            instance.set_delegate(self.id);
        }
    }

    fn on_stop(&self, instance: &dyn ComponentInstance) {
        if let Some(previous) = self.previous() {
            previous.on_stop(instance);
        }
        self.recovery.on_background();
    }

    fn on_destroy(&self, instance: &dyn ComponentInstance) {
        if let Some(descriptor) = self.components.get(instance.component()) {
            self.stubs.release(&descriptor.name, descriptor.launch_mode);
        }
        if let Some(previous) = self.previous() {
            previous.on_destroy(instance);
        }
    }
}
