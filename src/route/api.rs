//! API endpoints declared by `.api` modules.
//!
//! Every named export of `about/index.api.ts` becomes an endpoint under the
//! module's route: `getAboutData` → `GET /about/getAboutData`.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Infer the method from an export name prefix; defaults to GET.
    pub fn from_export(name: &str) -> Self {
        const PREFIXES: &[(&str, HttpMethod)] = &[
            ("delete", HttpMethod::Delete),
            ("del", HttpMethod::Delete),
            ("patch", HttpMethod::Patch),
            ("post", HttpMethod::Post),
            ("put", HttpMethod::Put),
            ("get", HttpMethod::Get),
        ];

        PREFIXES
            .iter()
            .find(|(prefix, _)| has_word_prefix(name, prefix))
            .map(|(_, method)| *method)
            .unwrap_or(Self::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `prefix` followed by end-of-name or a word boundary (`getData`, `get_data`),
/// so `getter` and `poster` do not count.
fn has_word_prefix(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => rest
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_lowercase()),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiEndpoint {
    pub method: HttpMethod,
    /// Slash-collapsed, no trailing slash.
    pub path: String,
    pub export: String,
    pub module: PathBuf,
    /// Relative to the source root.
    #[serde(skip)]
    pub rel: PathBuf,
}

impl ApiEndpoint {
    pub fn new(route: &Route, export: &str, module: PathBuf, rel: PathBuf) -> Self {
        Self {
            method: HttpMethod::from_export(export),
            path: route.join(export).without_trailing_slash().to_string(),
            export: export.to_string(),
            module,
            rel,
        }
    }

    /// Conflict key: `GET /about/getAboutData`.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_inference() {
        assert_eq!(HttpMethod::from_export("getAboutData"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_export("postMessage"), HttpMethod::Post);
        assert_eq!(HttpMethod::from_export("put_item"), HttpMethod::Put);
        assert_eq!(HttpMethod::from_export("patchUser"), HttpMethod::Patch);
        assert_eq!(HttpMethod::from_export("deleteUser"), HttpMethod::Delete);
        assert_eq!(HttpMethod::from_export("delUser"), HttpMethod::Delete);
        assert_eq!(HttpMethod::from_export("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::from_export("getter"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_export("poster"), HttpMethod::Get);
        assert_eq!(HttpMethod::from_export("list"), HttpMethod::Get);
    }

    #[test]
    fn test_endpoint_path_collapsed() {
        let endpoint = ApiEndpoint::new(
            &Route::new("/about/"),
            "getAboutData",
            PathBuf::from("/site/.trellis/src/about/index.api.js"),
            PathBuf::from("about/index.api.js"),
        );
        assert_eq!(endpoint.path, "/about/getAboutData");
        assert_eq!(endpoint.key(), "GET /about/getAboutData");

        let root = ApiEndpoint::new(&Route::root(), "health", PathBuf::new(), PathBuf::new());
        assert_eq!(root.path, "/health");
    }

    #[test]
    fn test_serialize_method() {
        assert_eq!(serde_json::to_string(&HttpMethod::Delete).unwrap(), "\"DELETE\"");
    }
}
