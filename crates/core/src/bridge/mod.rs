//! Platform bridge selection by platform version.
//!
//! Platform internals change shape between releases. Each supported range
//! gets its own [`PlatformBridge`]; the runtime picks one at construction and
//! never branches on versions afterwards.

use bundlehost_api::{BridgeError, PlatformBridge};
use std::fmt;
use std::sync::Arc;

/// Inclusive range of platform API levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl VersionRange {
    /// `min` and every later version.
    pub fn from(min: u32) -> Self {
        Self { min, max: None }
    }

    pub fn between(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn contains(&self, version: u32) -> bool {
        version >= self.min && self.max.is_none_or(|max| version <= max)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..={}", self.min, max),
            None => write!(f, "{}..", self.min),
        }
    }
}

#[derive(Default)]
pub struct BridgeTable {
    entries: Vec<(VersionRange, Arc<dyn PlatformBridge>)>,
}

impl BridgeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bridge. Earlier registrations win on overlap.
    pub fn register(mut self, range: VersionRange, bridge: Arc<dyn PlatformBridge>) -> Self {
        self.entries.push((range, bridge));
        self
    }

    pub fn select(&self, version: u32) -> Result<Arc<dyn PlatformBridge>, BridgeError> {
        self.entries
            .iter()
            .find(|(range, _)| range.contains(version))
            .map(|(range, bridge)| {
                tracing::debug!("Selected platform bridge for {} (range {})", version, range);
                bridge.clone()
            })
            .ok_or_else(|| BridgeError::Unsupported {
                capability: "platform_bridge",
                detail: format!("no bridge registered for platform version {version}"),
            })
    }

    pub fn ranges(&self) -> Vec<VersionRange> {
        self.entries.iter().map(|(r, _)| *r).collect()
    }
}
