//! Application state
//!
//! Shared across all handlers.

use std::sync::Arc;

use parking_lot::RwLock;

use loanmate_agent::CollectionsAgent;
use loanmate_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// The single collections agent; its internal session lock serializes
    /// turns, so handlers never coordinate beyond sharing this handle
    pub agent: Arc<CollectionsAgent>,
    /// Configuration
    pub settings: Arc<RwLock<Settings>>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, agent: Arc<CollectionsAgent>) -> Self {
        Self {
            agent,
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Get a read guard to the current configuration
    pub fn get_settings(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.settings.read()
    }
}
