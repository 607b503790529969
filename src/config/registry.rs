//! Name → definition lookup for per-job webhooks.

use std::collections::HashMap;
use std::sync::Arc;

use super::WebhookDefinition;

/// Every loaded webhook definition, by name.
///
/// Built once while loading and read-only afterwards; dispatchers borrow it
/// during construction and keep their own `Arc`s to the definitions they use.
#[derive(Debug, Default, Clone)]
pub struct WebhookRegistry {
    webhooks: HashMap<String, Arc<WebhookDefinition>>,
}

impl WebhookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition. A later definition with the same name replaces
    /// the earlier one.
    pub fn register(&mut self, definition: Arc<WebhookDefinition>) {
        self.webhooks
            .insert(definition.name.clone(), definition);
    }

    /// Looks a definition up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<WebhookDefinition>> {
        self.webhooks.get(name)
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.webhooks.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.webhooks.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.webhooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
