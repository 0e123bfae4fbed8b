//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! base_url = "https://example.com"      # Absolute URL injected as `url` prop
//! api_base_url = "https://api.example.com"
//! ```
//!
//! Both are optional; the environment and `[server]` fill the gaps.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Public base URL of the generated site.
    pub base_url: Option<String>,

    /// Base URL that API endpoints are reachable under.
    pub api_base_url: Option<String>,
}
