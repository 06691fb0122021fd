use super::component::{ComponentDescriptor, ComponentName};
use super::filter::{Action, Category};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request to start a component, as seen by the platform.
///
/// `redirect` is the engine's side channel: when a request is routed
/// through a stub it holds the real component name, and it survives the
/// platform round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub component: Option<ComponentName>,
    pub action: Option<Action>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub data: Option<String>,
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
    #[serde(default)]
    pub redirect: Option<ComponentName>,
}

impl LaunchRequest {
    /// Request naming its target component.
    pub fn explicit(component: impl Into<ComponentName>) -> Self {
        Self {
            component: Some(component.into()),
            ..Self::default()
        }
    }

    /// Request described only by action, categories and data.
    pub fn implicit(action: impl Into<Action>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn is_explicit(&self) -> bool {
        self.component.is_some()
    }

    /// Scheme of `data`, e.g. `https` for `https://host/path`.
    pub fn data_scheme(&self) -> Option<&str> {
        let data = self.data.as_deref()?;
        let (scheme, _) = data.split_once(':')?;
        if scheme.is_empty() { None } else { Some(scheme) }
    }
}

/// Platform-side record of a component about to be instantiated.
///
/// The platform fills `descriptor` from what it knows (the stub); the
/// engine swaps it for the real component's descriptor before creation.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub request: LaunchRequest,
    pub descriptor: Option<ComponentDescriptor>,
}

impl LaunchRecord {
    pub fn new(request: LaunchRequest) -> Self {
        Self {
            request,
            descriptor: None,
        }
    }
}

/// Caller-facing request to launch a component of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRequest {
    pub bundle: String,
    pub component: ComponentName,
    pub query: Option<String>,
}

impl ComponentRequest {
    pub fn new(bundle: impl Into<String>, component: impl Into<ComponentName>) -> Self {
        Self {
            bundle: bundle.into(),
            component: component.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}
