use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A discovered bundle package, before preload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDescriptor {
    pub package_name: String,
    /// Declared type (`app`, `lib`, ...). When absent the type is inferred
    /// from the package name.
    #[serde(default)]
    pub bundle_type: Option<String>,
    /// Package shipped with the host.
    pub builtin_file: PathBuf,
    /// Downloaded upgrade; used when its version is newer.
    pub patch_file: PathBuf,
}

impl BundleDescriptor {
    pub fn new(package_name: impl Into<String>, builtin_file: impl Into<PathBuf>) -> Self {
        let builtin_file = builtin_file.into();
        let patch_file = builtin_file.with_extension("patch");
        Self {
            package_name: package_name.into(),
            bundle_type: None,
            builtin_file,
            patch_file,
        }
    }

    pub fn with_type(mut self, bundle_type: impl Into<String>) -> Self {
        self.bundle_type = Some(bundle_type.into());
        self
    }

    pub fn with_patch(mut self, patch_file: impl Into<PathBuf>) -> Self {
        self.patch_file = patch_file.into();
        self
    }
}

/// Environment handed to a bundle's own entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleContext {
    pub package_name: String,
    pub resource_path: PathBuf,
    pub entry_point: String,
}

/// Kind of object a bundle can be asked to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Fragment { support: bool },
    Other(String),
}

impl ObjectKind {
    /// Parses type strings such as `fragment`, `fragment-v4`.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("fragment") {
            ObjectKind::Fragment {
                support: s.ends_with("v4"),
            }
        } else {
            ObjectKind::Other(s.to_string())
        }
    }
}
