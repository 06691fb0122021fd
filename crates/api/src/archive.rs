//! Bundle package collaborators: parsing, verification, extraction and
//! code-archive opening.

use crate::error::ApiResult;
use crate::models::{ComponentDescriptor, ComponentName, IntentFilter};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle to a code archive opened by the platform loader.
pub trait CodeArchive: Send + Sync + Debug {
    fn path(&self) -> &Path;
}

/// Opens code archives. Called from a blocking worker thread.
pub trait CodeArchiveLoader: Send + Sync {
    fn open(&self, source: &Path, optimized: &Path) -> ApiResult<Arc<dyn CodeArchive>>;
}

/// What a parser learned about a bundle package.
#[derive(Debug, Clone, Default)]
pub struct ParsedBundle {
    pub package_name: String,
    pub source_path: PathBuf,
    pub version_code: i64,
    pub version_name: Option<String>,
    pub components: Vec<ComponentDescriptor>,
    pub intent_filters: Vec<(ComponentName, Vec<IntentFilter>)>,
    pub default_component: Option<ComponentName>,
    /// Class of the bundle's own initialisation entry point.
    pub entry_point: Option<String>,
    /// Native library directory, relative to the extract path.
    pub library_directory: Option<String>,
    /// The package carries no resource table.
    pub non_resources: bool,
}

/// Parses and verifies bundle packages.
pub trait BundleParser: Send + Sync {
    /// `None` when `file` is missing or is not a package for `package_name`.
    fn parse(&self, file: &Path, package_name: &str) -> Option<ParsedBundle>;

    /// Verify signatures and extract entries. `false` disables the bundle.
    fn verify_and_extract(&self, parsed: &ParsedBundle, extractor: &dyn BundleExtractor) -> bool;
}

/// Locates where bundle entries are extracted to.
pub trait BundleExtractor: Send + Sync {
    fn extract_path(&self, package_name: &str) -> Option<PathBuf>;

    fn extract_file(&self, package_name: &str, entry_name: &str) -> Option<PathBuf>;
}
