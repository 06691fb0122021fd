//! In-memory index of action/category filters declared by bundles.
//!
//! Resolves requests that do not name a component. Entries are kept in
//! registration order and the first match wins.

use bundlehost_api::{Action, Category, ComponentName, IntentFilter, LaunchRequest};
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Decides whether a filter accepts the data of a view-style request.
pub trait DataMatcher: Send + Sync {
    fn matches(&self, filter: &IntentFilter, data: &str, scheme: Option<&str>) -> bool;
}

/// Accepts when the filter declares no schemes or declares the data's scheme.
#[derive(Debug, Default)]
pub struct SchemeMatcher;

impl DataMatcher for SchemeMatcher {
    fn matches(&self, filter: &IntentFilter, _data: &str, scheme: Option<&str>) -> bool {
        if filter.schemes.is_empty() {
            return true;
        }
        match scheme {
            Some(scheme) => filter.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme)),
            None => false,
        }
    }
}

pub struct FilterIndex {
    entries: RwLock<IndexMap<ComponentName, Vec<IntentFilter>>>,
    data_matcher: Arc<dyn DataMatcher>,
}

impl FilterIndex {
    pub fn new() -> Self {
        Self::with_data_matcher(Arc::new(SchemeMatcher))
    }

    pub fn with_data_matcher(data_matcher: Arc<dyn DataMatcher>) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            data_matcher,
        }
    }

    /// Register the filters of one component. The first registration of a
    /// name wins, matching the component table.
    pub fn register(&self, component: ComponentName, filters: Vec<IntentFilter>) {
        self.register_batch([(component, filters)]);
    }

    /// Register a batch in order.
    pub fn register_batch(
        &self,
        batch: impl IntoIterator<Item = (ComponentName, Vec<IntentFilter>)>,
    ) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (component, filters) in batch {
            if filters.is_empty() {
                continue;
            }
            if entries.contains_key(&component) {
                tracing::warn!("Filters for {} already registered; keeping the first", component);
                continue;
            }
            entries.insert(component, filters);
        }
    }

    /// First component whose filters accept `action` with `categories`.
    pub fn resolve(
        &self,
        action: &Action,
        categories: &[Category],
        data: Option<&str>,
    ) -> Option<ComponentName> {
        let scheme = data.and_then(|d| d.split_once(':')).map(|(s, _)| s);
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|(_, filters)| {
                filters
                    .iter()
                    .any(|f| self.filter_matches(f, action, categories, data, scheme))
            })
            .map(|(component, _)| component.clone())
    }

    /// Resolve an implicit request. Explicit requests and requests without
    /// an action never match.
    pub fn resolve_request(&self, request: &LaunchRequest) -> Option<ComponentName> {
        if request.is_explicit() {
            return None;
        }
        let action = request.action.as_ref()?;
        self.resolve(action, &request.categories, request.data.as_deref())
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter_matches(
        &self,
        filter: &IntentFilter,
        action: &Action,
        categories: &[Category],
        data: Option<&str>,
        scheme: Option<&str>,
    ) -> bool {
        if !filter.has_action(action) {
            return false;
        }
        if !(filter.has_category(&Category::DEFAULT) || filter.has_category(&Category::BROWSABLE))
        {
            return false;
        }
        if !categories.iter().all(|c| filter.has_category(c)) {
            return false;
        }
        match data {
            Some(data) if action.is_view() => self.data_matcher.matches(filter, data, scheme),
            _ => true,
        }
    }
}

impl Default for FilterIndex {
    fn default() -> Self {
        Self::new()
    }
}
