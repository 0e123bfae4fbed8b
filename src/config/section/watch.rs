//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 300        # Quiet period per category before a rebuild
//! route_debounce_ms = 100  # Quiet period per route before regeneration
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
    pub route_debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            route_debounce_ms: 100,
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn route_debounce(&self) -> Duration {
        Duration::from_millis(self.route_debounce_ms)
    }
}
