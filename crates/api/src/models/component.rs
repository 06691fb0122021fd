use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Globally unique name of a launchable component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentName(SmolStr);

impl ComponentName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a new name with `suffix` appended.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self::new(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ComponentName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Re-entrancy policy of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// Reusable; any number of instances may share one stub.
    #[default]
    Standard,
    SingleTop,
    SingleTask,
    /// Singleton instance.
    SingleInstance,
}

impl LaunchMode {
    /// Modes that need an exclusive stub slot per live component.
    pub const EXCLUSIVE: [LaunchMode; 3] = [
        LaunchMode::SingleTop,
        LaunchMode::SingleTask,
        LaunchMode::SingleInstance,
    ];

    /// Numeric code used in stub identities. `Standard` is 0.
    pub fn code(self) -> u8 {
        match self {
            LaunchMode::Standard => 0,
            LaunchMode::SingleTop => 1,
            LaunchMode::SingleTask => 2,
            LaunchMode::SingleInstance => 3,
        }
    }

    pub fn is_exclusive(self) -> bool {
        self != LaunchMode::Standard
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LaunchMode::Standard => "standard",
            LaunchMode::SingleTop => "single_top",
            LaunchMode::SingleTask => "single_task",
            LaunchMode::SingleInstance => "single_instance",
        };
        f.write_str(s)
    }
}

/// Requested screen orientation of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenOrientation {
    #[default]
    Unspecified,
    Portrait,
    Landscape,
    Sensor,
    Locked,
}

/// Platform-visible attributes that must match the real component after
/// redirection through a stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Presentation {
    pub soft_input_mode: u32,
    pub screen_orientation: ScreenOrientation,
    /// Whether the component's window is see-through. Picks the reusable stub.
    pub translucent: bool,
}

/// Immutable description of a component declared by a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub name: ComponentName,
    pub bundle: String,
    pub launch_mode: LaunchMode,
    #[serde(default)]
    pub presentation: Presentation,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<ComponentName>, bundle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundle: bundle.into(),
            launch_mode: LaunchMode::Standard,
            presentation: Presentation::default(),
        }
    }

    pub fn with_launch_mode(mut self, mode: LaunchMode) -> Self {
        self.launch_mode = mode;
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }
}
