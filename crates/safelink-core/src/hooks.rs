//! Named-event filter registry.
//!
//! The host owns a [`HookRegistry`] and runs [`HookRegistry::apply_filters`]
//! whenever it renders something hookable. Callbacks run in ascending
//! priority, ties in registration order, each receiving the previous output.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Hook applied to every rendered article body.
pub const THE_CONTENT: &str = "the_content";

/// Priority used when a caller has no preference.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Handle returned by [`HookRegistry::add_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(u64);

/// Per-render information handed to filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Host name of the site being rendered.
    pub site_host: String,
}

impl RenderContext {
    pub fn new(site_host: impl Into<String>) -> Self {
        Self {
            site_host: site_host.into(),
        }
    }
}

/// A filter callback.
pub type FilterFn = Arc<dyn Fn(&str, &RenderContext) -> String + Send + Sync>;

struct RegisteredFilter {
    id: FilterId,
    priority: i32,
    callback: FilterFn,
}

/// Filters keyed by hook name.
#[derive(Default)]
pub struct HookRegistry {
    filters: HashMap<String, Vec<RegisteredFilter>>,
    next_id: u64,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` on `hook`.
    pub fn add_filter<F>(&mut self, hook: &str, priority: i32, callback: F) -> FilterId
    where
        F: Fn(&str, &RenderContext) -> String + Send + Sync + 'static,
    {
        self.next_id += 1;
        let id = FilterId(self.next_id);

        let chain = self.filters.entry(hook.to_string()).or_default();
        let position = chain
            .iter()
            .position(|f| f.priority > priority)
            .unwrap_or(chain.len());
        chain.insert(
            position,
            RegisteredFilter {
                id,
                priority,
                callback: Arc::new(callback),
            },
        );

        debug!(hook, priority, ?id, "Registered filter");
        id
    }

    /// Unregisters a filter. Returns whether it was registered.
    pub fn remove_filter(&mut self, hook: &str, id: FilterId) -> bool {
        let Some(chain) = self.filters.get_mut(hook) else {
            return false;
        };

        let before = chain.len();
        chain.retain(|f| f.id != id);
        let removed = chain.len() != before;

        if chain.is_empty() {
            self.filters.remove(hook);
        }
        if removed {
            debug!(hook, ?id, "Removed filter");
        }

        removed
    }

    /// Whether any filter is registered on `hook`.
    pub fn has_filter(&self, hook: &str) -> bool {
        self.filter_count(hook) > 0
    }

    /// Number of filters registered on `hook`.
    pub fn filter_count(&self, hook: &str) -> usize {
        self.filters.get(hook).map_or(0, Vec::len)
    }

    /// Runs every filter on `hook` over `value`.
    pub fn apply_filters(&self, hook: &str, value: &str, ctx: &RenderContext) -> String {
        let Some(chain) = self.filters.get(hook) else {
            return value.to_string();
        };

        chain
            .iter()
            .fold(value.to_string(), |acc, f| (f.callback)(&acc, ctx))
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .filters
            .iter()
            .map(|(hook, chain)| (hook.as_str(), chain.len()))
            .collect();
        f.debug_struct("HookRegistry")
            .field("filters", &counts)
            .finish()
    }
}
