pub mod archive;
pub mod error;
pub mod models;
pub mod platform;
pub mod store;

// Re-export commonly used types
pub use archive::{BundleExtractor, BundleParser, CodeArchive, CodeArchiveLoader, ParsedBundle};
pub use error::{ApiError, ApiResult, BridgeError, BridgeResult};
pub use models::*;
pub use platform::{
    ComponentInstance, DelegateId, Importance, LifecycleDelegate, MainDispatcher, MainTask,
    NoopDelegate, PlatformBridge, ProcessInfo, ProcessTable, ResourceHandleId,
};
pub use store::PreferenceStore;
