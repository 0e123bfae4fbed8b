//! JSON sidecar written next to each route's `index.html`.
//!
//! ```json
//! {"kind":"hydrate","entry":"/src/about/index.client.js",
//!  "layouts":[{"module":"/src/about/index.layout.js","props":{..}}],
//!  "page":{"meta":{..},"props":{..}}}
//!
//! {"kind":"static","head":"<title>..</title>","body":"<main>..</main>"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::host::LayoutDescriptor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    pub meta: Map<String, Value>,
    pub props: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Sidecar {
    /// Hydration descriptor for the browser bootstrap.
    Hydrate {
        entry: String,
        layouts: Vec<LayoutDescriptor>,
        page: PageData,
    },
    /// Finished markup of a render-only route.
    Static { head: String, body: String },
}

impl Sidecar {
    pub fn is_hydrate(&self) -> bool {
        matches!(self, Self::Hydrate { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}
