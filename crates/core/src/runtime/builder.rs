use super::BundleRuntime;
use crate::bridge::BridgeTable;
use crate::config::RuntimeConfig;
use crate::dispatch::InlineDispatcher;
use crate::error::{BundleHostError, Result};
use crate::launcher::BundleLauncher;
use crate::merge::NamespaceMerger;
use crate::prefs::{BundlePreferences, JsonFileStore};
use crate::redirect::{RedirectInterceptor, UpgradeRecovery};
use crate::registry::{BundleRegistry, ComponentTable};
use crate::resolve::{DataMatcher, FilterIndex};
use crate::stub::StubPool;
use bundlehost_api::{
    BundleParser, CodeArchiveLoader, MainDispatcher, PlatformBridge, PreferenceStore, ProcessTable,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::runtime::Handle;

pub struct BundleRuntimeBuilder {
    config: RuntimeConfig,
    bridge: Option<Arc<dyn PlatformBridge>>,
    bridge_table: Option<(BridgeTable, u32)>,
    parser: Option<Arc<dyn BundleParser>>,
    loader: Option<Arc<dyn CodeArchiveLoader>>,
    store: Option<Arc<dyn PreferenceStore>>,
    dispatcher: Option<Arc<dyn MainDispatcher>>,
    processes: Option<Arc<dyn ProcessTable>>,
    data_matcher: Option<Arc<dyn DataMatcher>>,
}

impl BundleRuntimeBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            bridge: None,
            bridge_table: None,
            parser: None,
            loader: None,
            store: None,
            dispatcher: None,
            processes: None,
            data_matcher: None,
        }
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn PlatformBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Pick the bridge for `platform_version` from `table` at build time.
    pub fn with_bridge_table(mut self, table: BridgeTable, platform_version: u32) -> Self {
        self.bridge_table = Some((table, platform_version));
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn BundleParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn CodeArchiveLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Defaults to a JSON file under the configured storage directory.
    pub fn with_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to [`InlineDispatcher`].
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn MainDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Without a process table, upgrades never force a restart.
    pub fn with_process_table(mut self, processes: Arc<dyn ProcessTable>) -> Self {
        self.processes = Some(processes);
        self
    }

    pub fn with_data_matcher(mut self, matcher: Arc<dyn DataMatcher>) -> Self {
        self.data_matcher = Some(matcher);
        self
    }

    /// Assemble the runtime. Must be called from within a tokio runtime.
    pub fn build(self) -> Result<BundleRuntime> {
        let handle = Handle::try_current().map_err(|_| BundleHostError::NoAsyncRuntime)?;

        let bridge = match (self.bridge, self.bridge_table) {
            (Some(bridge), _) => bridge,
            (None, Some((table, version))) => table.select(version)?,
            (None, None) => return Err(BundleHostError::MissingCollaborator("platform bridge")),
        };
        let parser = self
            .parser
            .ok_or(BundleHostError::MissingCollaborator("bundle parser"))?;
        let loader = self
            .loader
            .ok_or(BundleHostError::MissingCollaborator("code archive loader"))?;

        let store: Arc<dyn PreferenceStore> = match self.store {
            Some(store) => store,
            None => Arc::new(JsonFileStore::open(self.config.preferences_file())?),
        };
        let prefs = BundlePreferences::new(store);
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Arc::new(InlineDispatcher));

        let config = Arc::new(self.config);
        let stubs = Arc::new(StubPool::new(
            config.stub_prefix.clone(),
            config.slots_per_mode,
        ));
        let registry = Arc::new(BundleRegistry::new());
        let components = Arc::new(ComponentTable::new(bridge.host_components()));
        let filters = Arc::new(match self.data_matcher {
            Some(matcher) => FilterIndex::with_data_matcher(matcher),
            None => FilterIndex::new(),
        });

        let recovery = UpgradeRecovery::new(
            prefs.clone(),
            self.processes,
            bridge.host_package(),
            config.recovery_delay(),
            handle.clone(),
        );
        let interceptor = Arc::new(RedirectInterceptor::new(
            components.clone(),
            filters.clone(),
            stubs.clone(),
            bridge.clone(),
            recovery,
        ));
        let merger = Arc::new(NamespaceMerger::new(bridge.clone()));
        let launcher = BundleLauncher::new(
            config.clone(),
            prefs.clone(),
            parser,
            loader,
            registry.clone(),
            components.clone(),
            filters.clone(),
            handle,
        );

        tracing::debug!(
            "Built bundle runtime for {} ({} stub slots per mode)",
            bridge.host_package(),
            config.slots_per_mode
        );

        Ok(BundleRuntime {
            config,
            bridge,
            dispatcher,
            prefs,
            stubs,
            registry,
            components,
            filters,
            launcher,
            merger,
            interceptor,
            new_host: AtomicBool::new(false),
            set_up: AtomicBool::new(false),
        })
    }
}
