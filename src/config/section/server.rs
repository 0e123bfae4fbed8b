//! `[server]` section configuration.
//!
//! Host and port of the server that serves the output tree. Only used to
//! derive the default base URL (`http://host:port`).
//!
//! ```toml
//! [server]
//! host = "localhost"
//! port = 3000
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
        }
    }
}
