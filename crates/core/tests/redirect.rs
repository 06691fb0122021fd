//! Launch redirection through host stubs, driven the way the platform would.

mod common;

use bundlehost_api::{
    Category, ComponentDescriptor, ComponentInstance, ComponentName, IntentFilter, LaunchMode,
    LaunchRecord, LaunchRequest, LifecycleDelegate, Presentation, ScreenOrientation,
};
use common::{BundleFixture, FakeBridge, FakeInstance, HOST_ACTIVITY, TestHost};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const A: &str = "com.example.app.a.ListActivity";
const B: &str = "com.example.app.b.CheckoutActivity";
const C: &str = "com.example.app.c.PaymentActivity";

fn load_abc(host: &TestHost) {
    let a = host.package(
        BundleFixture::new("com.example.app.a", host.pkg_path("a"))
            .component(A, LaunchMode::Standard)
            .filter(
                A,
                IntentFilter::new()
                    .with_action("VIEW_ITEM")
                    .with_category(Category::DEFAULT),
            )
            .build(),
    );
    let b = host.package(
        BundleFixture::new("com.example.app.b", host.pkg_path("b"))
            .component(B, LaunchMode::SingleTask)
            .build(),
    );
    let c = host.package(
        BundleFixture::new("com.example.app.c", host.pkg_path("c"))
            .component(C, LaunchMode::SingleTask)
            .build(),
    );

    host.runtime.set_up().unwrap();
    let loaded = host.runtime.load_bundles([a, b, c]).unwrap();
    assert_eq!(loaded.len(), 3);
}

/// Walk a redirected request through resolve and create, like the platform.
fn create(host: &TestHost, request: LaunchRequest) -> FakeInstance {
    let delegate = host.bridge.installed();
    let mut record = LaunchRecord::new(request);
    delegate.resolve_launch(&mut record);
    let descriptor = record.descriptor.expect("descriptor restored");

    let mut instance = FakeInstance::new(descriptor.name.clone());
    delegate.on_create(&mut instance);
    instance
}

#[tokio::test]
async fn test_abc_scenario() {
    let host = TestHost::new();
    load_abc(&host);

    // Implicit VIEW_ITEM resolves to A and goes through the reusable stub.
    let request = host.bridge.start(LaunchRequest::implicit("VIEW_ITEM"));
    assert_eq!(request.redirect, Some(ComponentName::new(A)));
    assert_eq!(
        request.component,
        Some(ComponentName::new("bundlehost.stub.A"))
    );

    // B twice while its first instance is alive: same stub both times.
    let first = host.bridge.start(LaunchRequest::explicit(B));
    let b_instance = create(&host, first.clone());
    let second = host.bridge.start(LaunchRequest::explicit(B));
    assert_eq!(first.component, second.component);
    assert_eq!(
        first.component,
        Some(ComponentName::new("bundlehost.stub.A20"))
    );

    // Once B is destroyed its slot is free for C.
    host.bridge.installed().on_destroy(&b_instance);
    assert!(host.runtime.stubs().bound(LaunchMode::SingleTask).is_empty());

    let third = host.bridge.start(LaunchRequest::explicit(C));
    assert_eq!(third.component, first.component);
    assert_eq!(third.redirect, Some(ComponentName::new(C)));
}

#[tokio::test]
async fn test_destroy_releases_by_real_identity_only() {
    let host = TestHost::new();
    load_abc(&host);

    let request = host.bridge.start(LaunchRequest::explicit(B));
    let stub = request.component.clone().unwrap();
    let instance = create(&host, request);
    assert_eq!(instance.component(), &ComponentName::new(B));

    // An instance reporting its stub name cannot be matched to a binding.
    host.bridge.installed().on_destroy(&FakeInstance::new(stub));
    assert_eq!(host.runtime.stubs().bound(LaunchMode::SingleTask).len(), 1);

    host.bridge.installed().on_destroy(&instance);
    assert!(host.runtime.stubs().bound(LaunchMode::SingleTask).is_empty());
}

#[tokio::test]
async fn test_incoming_record_gets_real_descriptor() {
    let host = TestHost::new();
    load_abc(&host);

    let request = host.bridge.start(LaunchRequest::explicit(B));
    let mut record = LaunchRecord::new(request);
    record.descriptor = Some(ComponentDescriptor::new("bundlehost.stub.A20", "host"));
    host.bridge.installed().resolve_launch(&mut record);

    let descriptor = record.descriptor.unwrap();
    assert_eq!(descriptor.name, ComponentName::new(B));
    assert_eq!(descriptor.bundle, "com.example.app.b");
    assert_eq!(descriptor.launch_mode, LaunchMode::SingleTask);
}

#[tokio::test]
async fn test_host_declared_and_unknown_components_untouched() {
    let host = TestHost::new();
    load_abc(&host);

    let request = host.bridge.start(LaunchRequest::explicit(HOST_ACTIVITY));
    assert_eq!(request, LaunchRequest::explicit(HOST_ACTIVITY));

    let request = host
        .bridge
        .start(LaunchRequest::explicit("com.example.app.z.Missing"));
    assert_eq!(request.redirect, None);
    assert_eq!(
        request.component,
        Some(ComponentName::new("com.example.app.z.Missing"))
    );
}

#[tokio::test]
async fn test_implicit_request_the_host_handles_is_untouched() {
    let host = TestHost::new();
    host.bridge
        .host_actions
        .lock()
        .unwrap()
        .insert("VIEW_ITEM".to_string());
    load_abc(&host);

    let request = host.bridge.start(LaunchRequest::implicit("VIEW_ITEM"));
    assert_eq!(request.component, None);
    assert_eq!(request.redirect, None);
}

#[tokio::test]
async fn test_unmatched_implicit_request_is_untouched() {
    let host = TestHost::new();
    load_abc(&host);

    let request = host.bridge.start(LaunchRequest::implicit("SHARE_ITEM"));
    assert_eq!(request, LaunchRequest::implicit("SHARE_ITEM"));
}

#[tokio::test]
async fn test_exhaustion_leaves_request_untouched() {
    let host = TestHost::new();
    let mut fixture = BundleFixture::new("com.example.app.many", host.pkg_path("many"));
    for i in 0..5 {
        fixture = fixture.component(&format!("com.example.app.many.Top{i}"), LaunchMode::SingleTop);
    }
    let descriptor = host.package(fixture.build());
    host.runtime.set_up().unwrap();
    host.runtime.load_bundle(descriptor).unwrap();

    for i in 0..4 {
        let request = host
            .bridge
            .start(LaunchRequest::explicit(format!("com.example.app.many.Top{i}")));
        assert!(request.redirect.is_some());
    }

    let overflow = host
        .bridge
        .start(LaunchRequest::explicit("com.example.app.many.Top4"));
    assert_eq!(overflow.redirect, None);
    assert_eq!(
        overflow.component,
        Some(ComponentName::new("com.example.app.many.Top4"))
    );
}

#[tokio::test]
async fn test_presentation_applied_and_delegate_reasserted() {
    let host = TestHost::new();
    let real = "com.example.app.form.EditActivity";
    let descriptor = host.package(
        BundleFixture::new("com.example.app.form", host.pkg_path("form"))
            .descriptor(
                ComponentDescriptor::new(real, "com.example.app.form").with_presentation(
                    Presentation {
                        soft_input_mode: 0x10,
                        screen_orientation: ScreenOrientation::Portrait,
                        translucent: true,
                    },
                ),
            )
            .build(),
    );
    host.runtime.set_up().unwrap();
    host.runtime.load_bundle(descriptor).unwrap();

    let request = host.bridge.start(LaunchRequest::explicit(real));
    assert_eq!(
        request.component,
        Some(ComponentName::new("bundlehost.stub.A1"))
    );

    let instance = create(&host, request);
    assert_eq!(instance.soft_input_mode, 0x10);
    assert_eq!(instance.orientation, ScreenOrientation::Portrait);
    assert_eq!(instance.delegate(), Some(host.runtime.interceptor().id()));
}

#[derive(Default)]
struct CountingDelegate {
    prepared: AtomicUsize,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl LifecycleDelegate for CountingDelegate {
    fn prepare_launch(&self, _request: &mut LaunchRequest) {
        self.prepared.fetch_add(1, Ordering::SeqCst);
    }

    fn on_create(&self, _instance: &mut dyn ComponentInstance) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    fn on_destroy(&self, _instance: &dyn ComponentInstance) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_callbacks_forward_to_previous_delegate() {
    let previous = Arc::new(CountingDelegate::default());
    let host = TestHost::with_bridge(FakeBridge::new().with_previous_delegate(previous.clone()));
    load_abc(&host);

    let request = host.bridge.start(LaunchRequest::explicit(B));
    let instance = create(&host, request);
    host.bridge.installed().on_destroy(&instance);

    assert_eq!(previous.prepared.load(Ordering::SeqCst), 1);
    assert_eq!(previous.created.load(Ordering::SeqCst), 1);
    assert_eq!(previous.destroyed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_set_up_is_idempotent() {
    let host = TestHost::new();
    host.runtime.set_up().unwrap();
    let first = host.bridge.installed();
    host.runtime.set_up().unwrap();

    assert!(Arc::ptr_eq(&first, &host.bridge.installed()));
    assert!(host.runtime.interceptor().is_installed());
}

#[tokio::test]
async fn test_concurrent_install_never_forwards_to_itself() {
    let host = TestHost::new();
    let interceptor = host.runtime.interceptor().clone();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let interceptor = interceptor.clone();
            scope.spawn(move || assert!(interceptor.install()));
        }
    });
    assert_eq!(host.bridge.delegate_installs.load(Ordering::SeqCst), 1);

    // A self-forwarding delegate would recurse here.
    let delegate = host.bridge.installed();
    let mut request = LaunchRequest::explicit(HOST_ACTIVITY);
    delegate.prepare_launch(&mut request);
    let instance = FakeInstance::new(HOST_ACTIVITY);
    delegate.on_stop(&instance);
    delegate.on_destroy(&instance);
}

#[tokio::test]
async fn test_refused_delegate_degrades_to_passthrough() {
    let host = TestHost::with_bridge(FakeBridge {
        refuse_delegate: true,
        ..FakeBridge::new()
    });
    load_abc(&host);

    let interceptor = host.runtime.interceptor();
    assert!(!interceptor.is_available());

    let mut request = LaunchRequest::explicit(B);
    assert_eq!(interceptor.rewrite_outgoing(&mut request), None);
    assert_eq!(request, LaunchRequest::explicit(B));
}
