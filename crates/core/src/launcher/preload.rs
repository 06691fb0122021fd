//! Pre-load checks run for each discovered bundle before it is loaded.

use bundlehost_api::{BundleDescriptor, BundleParser, ParsedBundle};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Whether a bundle of `descriptor` can be handled by this runtime.
///
/// A declared type must be listed in `supported`. Without one the type is
/// read from the package name: `com.example.app.main` and
/// `com.example.appmain` are both `app` bundles.
pub fn is_supported(descriptor: &BundleDescriptor, supported: &[String]) -> bool {
    if let Some(declared) = &descriptor.bundle_type {
        return supported.iter().any(|t| t == declared);
    }

    let mut segments = descriptor.package_name.rsplit('.');
    let Some(last) = segments.next() else {
        return false;
    };
    let second_to_last = segments.next();

    supported.iter().any(|t| {
        second_to_last == Some(t.as_str()) || (!t.is_empty() && last.starts_with(t.as_str()))
    })
}

/// Package file picked for loading along with what was parsed from it.
#[derive(Debug)]
pub struct Selected {
    pub file: PathBuf,
    pub parsed: ParsedBundle,
    pub from_patch: bool,
}

/// Pick between the built-in package and a downloaded patch.
///
/// The higher version code wins. A patch that is not newer than the built-in
/// package is stale and gets deleted.
pub fn select_file(descriptor: &BundleDescriptor, parser: &dyn BundleParser) -> Option<Selected> {
    let name = descriptor.package_name.as_str();
    let builtin = parser.parse(&descriptor.builtin_file, name);
    let patch = if descriptor.patch_file.exists() {
        parser.parse(&descriptor.patch_file, name)
    } else {
        None
    };

    match (builtin, patch) {
        (Some(builtin), Some(patch)) if patch.version_code > builtin.version_code => {
            tracing::debug!(
                "Using patch {} for {} ({} > {})",
                descriptor.patch_file.display(),
                name,
                patch.version_code,
                builtin.version_code
            );
            Some(Selected {
                file: descriptor.patch_file.clone(),
                parsed: patch,
                from_patch: true,
            })
        }
        (Some(builtin), patch) => {
            if patch.is_some() {
                remove_stale_patch(&descriptor.patch_file);
            }
            Some(Selected {
                file: descriptor.builtin_file.clone(),
                parsed: builtin,
                from_patch: false,
            })
        }
        (None, Some(patch)) => Some(Selected {
            file: descriptor.patch_file.clone(),
            parsed: patch,
            from_patch: true,
        }),
        (None, None) => None,
    }
}

fn remove_stale_patch(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!("Removed stale patch {}", path.display()),
        Err(e) => tracing::warn!("Failed to remove stale patch {}: {}", path.display(), e),
    }
}

/// Modification time in milliseconds since the epoch, 0 when unreadable.
pub fn modified_millis(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
