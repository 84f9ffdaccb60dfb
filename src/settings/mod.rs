//! Report settings: resolution, provider hooks, process-wide cache.
//!
//! Settings are resolved once per report name and cached for the
//! process session. Entries are inserted on first resolution and
//! cleared only at teardown; there is no eviction at this scale.

pub mod registry;

pub use registry::{ProviderRegistry, ReportSettingsProvider, global_registry};

use crate::api::error::ApiError;
use crate::api::models::{FilterDef, ReportDocument};
use crate::api::client::ReportTransport;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Resolved per-report settings.
pub struct ReportSettings {
    pub report_name: String,
    pub filters: Vec<FilterDef>,
    pub html_format: Option<String>,
    /// Last observed server-side execution time, in seconds. Drives
    /// the progress indicator for long-running reports.
    pub execution_time: u64,
    pub provider: Option<Arc<dyn ReportSettingsProvider>>,
}

impl ReportSettings {
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }
}

impl fmt::Debug for ReportSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportSettings")
            .field("report_name", &self.report_name)
            .field("filters", &self.filters)
            .field("execution_time", &self.execution_time)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

/// Process-wide settings cache, keyed by report name.
pub struct SettingsCache {
    entries: Mutex<HashMap<String, Arc<ReportSettings>>>,
}

impl SettingsCache {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, report_name: &str) -> Option<Arc<ReportSettings>> {
        self.entries.lock().unwrap().get(report_name).cloned()
    }

    pub fn insert(&self, settings: Arc<ReportSettings>) {
        self.entries
            .lock()
            .unwrap()
            .insert(settings.report_name.clone(), settings);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Drop all entries. Session teardown only.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

static SETTINGS_CACHE: Lazy<SettingsCache> = Lazy::new(SettingsCache::new);

pub fn settings_cache() -> &'static SettingsCache {
    &SETTINGS_CACHE
}

/// Resolve settings for a report document.
///
/// Cache hit returns the shared entry unchanged. On a miss the script
/// RPC is fetched, the named provider looked up in the registry, and
/// doctype-configured filters merged in when the provider defines
/// none. Concurrent misses for the same report are not deduplicated;
/// the last insert wins on identical data.
pub async fn resolve(
    transport: &dyn ReportTransport,
    doc: &ReportDocument,
) -> Result<Arc<ReportSettings>, ApiError> {
    if let Some(settings) = settings_cache().get(&doc.name) {
        log::debug!("Settings cache hit: {}", doc.name);
        return Ok(settings);
    }

    let script = transport.get_script(&doc.name).await?;

    let provider = script
        .script
        .as_deref()
        .and_then(|name| {
            let found = global_registry().get(name);
            if found.is_none() && !name.is_empty() {
                log::debug!("No settings provider registered for '{}'", name);
            }
            found
        });

    let filters = provider
        .as_ref()
        .and_then(|p| p.filters())
        .unwrap_or_else(|| {
            if !script.filters.is_empty() {
                script.filters.clone()
            } else {
                doc.filters.clone()
            }
        });

    let settings = Arc::new(ReportSettings {
        report_name: doc.name.clone(),
        filters,
        html_format: script.html_format.clone(),
        execution_time: script.execution_time,
        provider,
    });

    settings_cache().insert(settings.clone());
    log::info!(
        "Resolved settings for {} ({} filters, execution_time {}s)",
        doc.name,
        settings.filters.len(),
        settings.execution_time
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ReportScript;
    use crate::api::testing::MockTransport;
    use std::sync::atomic::Ordering;

    fn doc(name: &str) -> ReportDocument {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "ref_doctype": "Sales Invoice",
            "filters": [{"fieldname": "company", "label": "Company"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolution_is_cached() {
        let transport = MockTransport::new().with_doc(doc("Cache Probe"));

        let first = resolve(&transport, &doc("Cache Probe")).await.unwrap();
        let second = resolve(&transport, &doc("Cache Probe")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.script_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_doctype_filters_used_without_provider() {
        let transport = MockTransport::new().with_doc(doc("Fallback Filters"));

        let settings = resolve(&transport, &doc("Fallback Filters")).await.unwrap();
        assert!(!settings.has_provider());
        assert_eq!(settings.filters.len(), 1);
        assert_eq!(settings.filters[0].fieldname, "company");
    }

    #[tokio::test]
    async fn test_provider_filters_win() {
        struct Provider;
        impl ReportSettingsProvider for Provider {
            fn filters(&self) -> Option<Vec<FilterDef>> {
                Some(vec![
                    FilterDef::new("from_date", "From Date"),
                    FilterDef::new("to_date", "To Date"),
                ])
            }
        }

        global_registry()
            .register("provider_filters_win", Arc::new(Provider))
            .unwrap();

        let transport = MockTransport::new().with_doc(doc("Provider Filters")).with_script(
            "Provider Filters",
            ReportScript {
                script: Some("provider_filters_win".to_string()),
                ..Default::default()
            },
        );

        let settings = resolve(&transport, &doc("Provider Filters")).await.unwrap();
        assert!(settings.has_provider());
        assert_eq!(settings.filters.len(), 2);
        assert_eq!(settings.filters[0].fieldname, "from_date");
    }

    #[tokio::test]
    async fn test_unknown_provider_falls_back_to_script_filters() {
        let transport = MockTransport::new().with_doc(doc("Unknown Provider")).with_script(
            "Unknown Provider",
            ReportScript {
                script: Some("nobody_registered_this".to_string()),
                filters: vec![FilterDef::new("status", "Status")],
                execution_time: 2,
                ..Default::default()
            },
        );

        let settings = resolve(&transport, &doc("Unknown Provider")).await.unwrap();
        assert!(!settings.has_provider());
        assert_eq!(settings.filters[0].fieldname, "status");
        assert_eq!(settings.execution_time, 2);
    }

    #[tokio::test]
    async fn test_script_fetch_failure_propagates() {
        let transport = MockTransport::new().with_doc(doc("Script Fails")).failing_scripts();
        let result = resolve(&transport, &doc("Script Fails")).await;
        assert!(matches!(
            result,
            Err(ApiError::ScriptFetchFailure { .. })
        ));
        assert!(settings_cache().get("Script Fails").is_none());
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = SettingsCache::new();
        cache.insert(Arc::new(ReportSettings {
            report_name: "Clear Probe".to_string(),
            filters: vec![],
            html_format: None,
            execution_time: 0,
            provider: None,
        }));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("Clear Probe").is_none());
    }
}
