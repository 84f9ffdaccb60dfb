//! Registry of report settings providers.
//!
//! Replaces the original runtime script evaluation: a report's
//! settings script names a provider registered here at startup, and
//! resolution looks the provider up instead of executing code.

use crate::api::models::{FilterDef, ReportDocument};
use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Per-report behavior contributed alongside the server document.
///
/// All hooks are optional; a report without a provider runs with the
/// server-configured defaults.
pub trait ReportSettingsProvider: Send + Sync {
    /// Filters defined by the provider. `None` defers to the
    /// doctype-configured filters from the server.
    fn filters(&self) -> Option<Vec<FilterDef>> {
        None
    }

    /// Invoked once the report document has loaded.
    fn on_load(&self, _doc: &ReportDocument) {}
}

/// Thread-safe registry of settings providers, keyed by provider name.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn ReportSettingsProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a provider under a name.
    ///
    /// Returns an error if the name is already taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn ReportSettingsProvider>,
    ) -> Result<()> {
        let name = name.into();
        let mut providers = self.providers.write().unwrap();
        if providers.contains_key(&name) {
            anyhow::bail!("Settings provider '{}' is already registered", name);
        }
        log::debug!("Registered settings provider: {}", name);
        providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ReportSettingsProvider>> {
        self.providers.read().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().unwrap().contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.providers.read().unwrap().len()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static PROVIDER_REGISTRY: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::new);

/// Process-wide provider registry. Providers are registered once at
/// startup; lookups happen during settings resolution.
pub fn global_registry() -> &'static ProviderRegistry {
    &PROVIDER_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFilters(Vec<FilterDef>);

    impl ReportSettingsProvider for FixedFilters {
        fn filters(&self) -> Option<Vec<FilterDef>> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = ProviderRegistry::new();
        registry
            .register(
                "sales_summary",
                Arc::new(FixedFilters(vec![FilterDef::new("company", "Company")])),
            )
            .unwrap();

        assert!(registry.contains("sales_summary"));
        let provider = registry.get("sales_summary").unwrap();
        assert_eq!(provider.filters().unwrap().len(), 1);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ProviderRegistry::new();
        registry
            .register("dup", Arc::new(FixedFilters(vec![])))
            .unwrap();
        assert!(registry.register("dup", Arc::new(FixedFilters(vec![]))).is_err());
        assert_eq!(registry.count(), 1);
    }
}
