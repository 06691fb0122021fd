//! In-memory fakes of the platform collaborators.

#![allow(dead_code)]

use bundlehost_api::{
    ApiError, ApiResult, BridgeError, BridgeResult, BundleContext, BundleDescriptor,
    BundleExtractor, BundleParser, CodeArchive, CodeArchiveLoader, ComponentDescriptor,
    ComponentInstance, ComponentName, DelegateId, Importance, IntentFilter, LaunchMode,
    LaunchRequest, LifecycleDelegate, ObjectKind, ParsedBundle, PlatformBridge, ProcessInfo,
    ProcessTable, ResourceHandleId, ScreenOrientation,
};
use bundlehost_core::prefs::MemoryStore;
use bundlehost_core::{BundleRuntime, RuntimeConfig};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const HOST_PACKAGE: &str = "com.example.host";
pub const HOST_RES: &str = "/host/base.pkg";
pub const HOST_ACTIVITY: &str = "com.example.host.MainActivity";

#[derive(Default)]
pub struct FakeBridge {
    pub host_actions: Mutex<HashSet<String>>,
    pub handles: Vec<ResourceHandleId>,
    pub resource_chains: Mutex<Vec<(ResourceHandleId, Vec<PathBuf>)>>,
    pub code_chain: Mutex<Vec<PathBuf>>,
    pub native_paths: Mutex<Vec<PathBuf>>,
    pub invalidations: AtomicUsize,
    pub delegate: Mutex<Option<Arc<dyn LifecycleDelegate>>>,
    pub delegate_installs: AtomicUsize,
    pub previous: Mutex<Option<Arc<dyn LifecycleDelegate>>>,
    pub refuse_delegate: bool,
    pub refuse_resources: bool,
    pub entries: Mutex<Vec<String>>,
    pub failing_entries: HashSet<String>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self {
            handles: vec![1, 2],
            ..Default::default()
        }
    }

    pub fn with_previous_delegate(self, previous: Arc<dyn LifecycleDelegate>) -> Self {
        *self.previous.lock().unwrap() = Some(previous);
        self
    }

    pub fn installed(&self) -> Arc<dyn LifecycleDelegate> {
        self.delegate
            .lock()
            .unwrap()
            .clone()
            .expect("no lifecycle delegate installed")
    }

    /// Drive a request through the installed delegate like the platform would.
    pub fn start(&self, mut request: LaunchRequest) -> LaunchRequest {
        self.installed().prepare_launch(&mut request);
        request
    }
}

impl PlatformBridge for FakeBridge {
    fn host_package(&self) -> &str {
        HOST_PACKAGE
    }

    fn host_components(&self) -> Vec<ComponentName> {
        vec![ComponentName::new(HOST_ACTIVITY)]
    }

    fn host_resource_path(&self) -> PathBuf {
        PathBuf::from(HOST_RES)
    }

    fn host_resolves(&self, request: &LaunchRequest) -> bool {
        let actions = self.host_actions.lock().unwrap();
        request
            .action
            .as_ref()
            .is_some_and(|a| actions.contains(a.as_str()))
    }

    fn live_resource_handles(&self) -> BridgeResult<Vec<ResourceHandleId>> {
        Ok(self.handles.clone())
    }

    fn install_resource_chain(
        &self,
        handle: ResourceHandleId,
        chain: &[PathBuf],
    ) -> BridgeResult<()> {
        if self.refuse_resources {
            return Err(BridgeError::Call("resource manager is sealed".into()));
        }
        self.resource_chains
            .lock()
            .unwrap()
            .push((handle, chain.to_vec()));
        Ok(())
    }

    fn invalidate_attribute_caches(&self) -> BridgeResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn install_code_chain(&self, archives: &[Arc<dyn CodeArchive>]) -> BridgeResult<()> {
        self.code_chain
            .lock()
            .unwrap()
            .extend(archives.iter().map(|a| a.path().to_path_buf()));
        Ok(())
    }

    fn install_native_library_paths(&self, paths: &[PathBuf]) -> BridgeResult<()> {
        self.native_paths.lock().unwrap().extend_from_slice(paths);
        Ok(())
    }

    fn install_lifecycle_delegate(
        &self,
        delegate: Arc<dyn LifecycleDelegate>,
    ) -> BridgeResult<Option<Arc<dyn LifecycleDelegate>>> {
        if self.refuse_delegate {
            return Err(BridgeError::Unsupported {
                capability: "lifecycle_delegate",
                detail: "field not found".into(),
            });
        }
        self.delegate_installs.fetch_add(1, Ordering::SeqCst);
        // Like the platform, hand back whatever delegate was in place.
        let replaced = self.delegate.lock().unwrap().replace(delegate);
        Ok(self.previous.lock().unwrap().clone().or(replaced))
    }

    fn start_bundle_entry(&self, context: &BundleContext) -> BridgeResult<()> {
        if self.failing_entries.contains(&context.package_name) {
            return Err(BridgeError::Call(format!("{} crashed", context.entry_point)));
        }
        self.entries
            .lock()
            .unwrap()
            .push(context.package_name.clone());
        Ok(())
    }

    fn instantiate_object(
        &self,
        _kind: &ObjectKind,
        class_name: &str,
    ) -> BridgeResult<Box<dyn Any + Send>> {
        Ok(Box::new(class_name.to_string()))
    }
}

pub struct FakeInstance {
    pub component: ComponentName,
    pub soft_input_mode: u32,
    pub orientation: ScreenOrientation,
    pub delegate: Option<DelegateId>,
}

impl FakeInstance {
    pub fn new(component: impl Into<ComponentName>) -> Self {
        Self {
            component: component.into(),
            soft_input_mode: 0,
            orientation: ScreenOrientation::Unspecified,
            delegate: None,
        }
    }
}

impl ComponentInstance for FakeInstance {
    fn component(&self) -> &ComponentName {
        &self.component
    }

    fn set_soft_input_mode(&mut self, mode: u32) {
        self.soft_input_mode = mode;
    }

    fn set_screen_orientation(&mut self, orientation: ScreenOrientation) {
        self.orientation = orientation;
    }

    fn delegate(&self) -> Option<DelegateId> {
        self.delegate
    }

    fn set_delegate(&mut self, delegate: DelegateId) {
        self.delegate = Some(delegate);
    }
}

#[derive(Default)]
pub struct FakeProcesses {
    pub processes: Mutex<Vec<ProcessInfo>>,
    pub killed: Mutex<Vec<u32>>,
}

impl FakeProcesses {
    pub fn with(processes: Vec<(u32, Importance)>) -> Self {
        Self {
            processes: Mutex::new(
                processes
                    .into_iter()
                    .map(|(pid, importance)| ProcessInfo {
                        pid,
                        packages: vec![HOST_PACKAGE.to_string()],
                        importance,
                    })
                    .collect(),
            ),
            killed: Mutex::new(Vec::new()),
        }
    }
}

impl ProcessTable for FakeProcesses {
    fn running_processes(&self) -> Vec<ProcessInfo> {
        self.processes.lock().unwrap().clone()
    }

    fn kill(&self, pid: u32) -> std::io::Result<()> {
        self.killed.lock().unwrap().push(pid);
        Ok(())
    }
}

/// Parser answering from a table keyed by file path.
#[derive(Default)]
pub struct FakeParser {
    pub bundles: Mutex<HashMap<PathBuf, ParsedBundle>>,
    pub rejected: Mutex<HashSet<String>>,
    pub verified: Mutex<Vec<String>>,
}

impl FakeParser {
    pub fn add(&self, parsed: ParsedBundle) {
        self.bundles
            .lock()
            .unwrap()
            .insert(parsed.source_path.clone(), parsed);
    }

    pub fn reject(&self, package_name: &str) {
        self.rejected.lock().unwrap().insert(package_name.to_string());
    }
}

impl BundleParser for FakeParser {
    fn parse(&self, file: &Path, package_name: &str) -> Option<ParsedBundle> {
        self.bundles
            .lock()
            .unwrap()
            .get(file)
            .filter(|p| p.package_name == package_name)
            .cloned()
    }

    fn verify_and_extract(&self, parsed: &ParsedBundle, extractor: &dyn BundleExtractor) -> bool {
        self.verified
            .lock()
            .unwrap()
            .push(parsed.package_name.clone());
        if extractor.extract_path(&parsed.package_name).is_none() {
            return false;
        }
        !self.rejected.lock().unwrap().contains(&parsed.package_name)
    }
}

#[derive(Debug)]
pub struct FakeArchive(pub PathBuf);

impl CodeArchive for FakeArchive {
    fn path(&self) -> &Path {
        &self.0
    }
}

#[derive(Default)]
pub struct FakeLoader {
    pub opened: Mutex<Vec<PathBuf>>,
    pub broken: Mutex<HashSet<PathBuf>>,
}

impl CodeArchiveLoader for FakeLoader {
    fn open(&self, source: &Path, _optimized: &Path) -> ApiResult<Arc<dyn CodeArchive>> {
        if self.broken.lock().unwrap().contains(source) {
            return Err(ApiError::Internal(format!("bad archive {}", source.display())));
        }
        self.opened.lock().unwrap().push(source.to_path_buf());
        Ok(Arc::new(FakeArchive(source.to_path_buf())))
    }
}

/// Everything a test needs around one runtime.
pub struct TestHost {
    pub dir: TempDir,
    pub bridge: Arc<FakeBridge>,
    pub parser: Arc<FakeParser>,
    pub loader: Arc<FakeLoader>,
    pub processes: Arc<FakeProcesses>,
    pub runtime: BundleRuntime,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_bridge(FakeBridge::new())
    }

    pub fn with_bridge(bridge: FakeBridge) -> Self {
        Self::build(bridge, FakeProcesses::default(), Duration::from_millis(300))
    }

    pub fn build(bridge: FakeBridge, processes: FakeProcesses, delay: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(bridge);
        let parser = Arc::new(FakeParser::default());
        let loader = Arc::new(FakeLoader::default());
        let processes = Arc::new(processes);

        let config = RuntimeConfig::default()
            .with_storage_dir(dir.path())
            .with_recovery_delay(delay);
        let runtime = BundleRuntime::builder(config)
            .with_bridge(bridge.clone())
            .with_parser(parser.clone())
            .with_loader(loader.clone())
            .with_store(Arc::new(MemoryStore::new()))
            .with_process_table(processes.clone())
            .build()
            .unwrap();

        Self {
            dir,
            bridge,
            parser,
            loader,
            processes,
            runtime,
        }
    }

    /// Write a package file and teach the parser about it.
    pub fn package(&self, parsed: ParsedBundle) -> BundleDescriptor {
        let file = parsed.source_path.clone();
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file, parsed.version_code.to_string()).unwrap();
        let descriptor = BundleDescriptor::new(parsed.package_name.clone(), &file);
        self.parser.add(parsed);
        descriptor
    }

    pub fn pkg_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("bundles").join(format!("{name}.pkg"))
    }
}

/// Builder for parsed bundle fixtures.
pub struct BundleFixture {
    parsed: ParsedBundle,
}

impl BundleFixture {
    pub fn new(package_name: &str, source_path: PathBuf) -> Self {
        Self {
            parsed: ParsedBundle {
                package_name: package_name.to_string(),
                source_path,
                version_code: 1,
                ..Default::default()
            },
        }
    }

    pub fn component(mut self, name: &str, mode: LaunchMode) -> Self {
        self.parsed.components.push(
            ComponentDescriptor::new(name, self.parsed.package_name.clone()).with_launch_mode(mode),
        );
        self
    }

    pub fn descriptor(mut self, descriptor: ComponentDescriptor) -> Self {
        self.parsed.components.push(descriptor);
        self
    }

    pub fn filter(mut self, component: &str, filter: IntentFilter) -> Self {
        self.parsed
            .intent_filters
            .push((ComponentName::new(component), vec![filter]));
        self
    }

    pub fn version(mut self, version_code: i64) -> Self {
        self.parsed.version_code = version_code;
        self
    }

    pub fn entry_point(mut self, entry_point: &str) -> Self {
        self.parsed.entry_point = Some(entry_point.to_string());
        self
    }

    pub fn non_resources(mut self) -> Self {
        self.parsed.non_resources = true;
        self
    }

    pub fn library_directory(mut self, dir: &str) -> Self {
        self.parsed.library_directory = Some(dir.to_string());
        self
    }

    pub fn build(self) -> ParsedBundle {
        self.parsed
    }
}
