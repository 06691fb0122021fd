//! Loaded-bundle registry and the component table it feeds.

pub mod bundles;
pub mod components;

pub use bundles::{BundleRegistry, LoadedBundle};
pub use components::ComponentTable;
