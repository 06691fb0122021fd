pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod merge;
pub mod prefs;
pub mod redirect;
pub mod registry;
pub mod resolve;
pub mod runtime;
pub mod stub;

pub use config::RuntimeConfig;
pub use error::{BundleHostError, Result};
pub use runtime::{BundleRuntime, BundleRuntimeBuilder};
