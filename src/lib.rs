pub mod api;
pub mod config;
pub mod realtime;
pub mod route;
pub mod settings;
pub mod tui;

use arc_swap::ArcSwap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

// Global RuntimeConfig instance (ArcSwap for lock-free atomic updates)
static RUNTIME_CONFIG: OnceCell<ArcSwap<tui::RuntimeConfig>> = OnceCell::new();

/// Get a clone of the current RuntimeConfig Arc. Falls back to the
/// defaults when nothing was initialized (tests, library use).
pub fn global_runtime_config() -> Arc<tui::RuntimeConfig> {
    RUNTIME_CONFIG
        .get_or_init(|| ArcSwap::from_pointee(tui::RuntimeConfig::default()))
        .load_full()
}

/// Initialize the global RuntimeConfig (called once at startup)
pub fn init_runtime_config(config: tui::RuntimeConfig) {
    RUNTIME_CONFIG
        .get_or_init(|| ArcSwap::from_pointee(tui::RuntimeConfig::default()))
        .store(Arc::new(config));
}

/// Swap the global RuntimeConfig (called when settings change)
pub fn reload_runtime_config(config: tui::RuntimeConfig) {
    init_runtime_config(config);
}
