use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Abstract action token carried by implicit requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(Cow<'static, str>);

impl Action {
    pub const MAIN: Action = Action(Cow::Borrowed("action.MAIN"));
    pub const VIEW: Action = Action(Cow::Borrowed("action.VIEW"));
    pub const SEND: Action = Action(Cow::Borrowed("action.SEND"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// View-style actions may carry data that the filter must match.
    pub fn is_view(&self) -> bool {
        *self == Self::VIEW
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Category token declared by filters and requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(Cow<'static, str>);

impl Category {
    pub const DEFAULT: Category = Category(Cow::Borrowed("category.DEFAULT"));
    pub const BROWSABLE: Category = Category(Cow::Borrowed("category.BROWSABLE"));
    pub const LAUNCHER: Category = Category(Cow::Borrowed("category.LAUNCHER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// An action/category filter declared by a bundle component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentFilter {
    pub actions: Vec<Action>,
    pub categories: Vec<Category>,
    /// Data schemes accepted for view-style requests. Empty means any.
    #[serde(default)]
    pub schemes: Vec<String>,
}

impl IntentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    pub fn has_action(&self, action: &Action) -> bool {
        self.actions.contains(action)
    }

    pub fn has_category(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }
}
