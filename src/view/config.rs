//! View configuration options.

use crate::config::AppConfig;

/// View configuration.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub app: AppConfig,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
}

impl ViewConfig {
    pub fn new(app: AppConfig) -> Self {
        Self {
            app,
            max_events: 10_000,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
