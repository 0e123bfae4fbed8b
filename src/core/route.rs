//! Route path type.
//!
//! - Always starts and ends with `/` (root is `/`)
//! - Never contains empty segments
//! - Normalization is idempotent: `Route::new(r.as_str()) == r`

use std::borrow::Borrow;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalized URL route (leading and trailing slash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route(Arc<str>);

impl Route {
    /// Normalize any slash-separated path into a route.
    ///
    /// Strips query string and fragment, collapses repeated slashes.
    pub fn new(raw: &str) -> Self {
        let path = raw.trim().split(['?', '#']).next().unwrap_or_default();
        Self::from_segments(path.split('/'))
    }

    /// Build a route from path segments, skipping empty ones.
    pub fn from_segments<'a, I>(segments: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = String::from("/");
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() || segment == "." {
                continue;
            }
            out.push_str(segment);
            out.push('/');
        }
        Self(Arc::from(out))
    }

    /// Root route `/`.
    pub fn root() -> Self {
        Self(Arc::from("/"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.as_ref() == "/"
    }

    /// Route segments without slashes.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Slash-aware prefix test: `/foo/` contains `/foo/bar/` but not `/foobar/`.
    #[inline]
    pub fn contains(&self, other: &Route) -> bool {
        other.0.starts_with(self.0.as_ref())
    }

    /// Append a path below this route.
    pub fn join(&self, child: &str) -> Self {
        Self::new(&format!("{}{}", self.0, child))
    }

    /// Route rendered without trailing slash (`/a/b`), root stays `/`.
    pub fn without_trailing_slash(&self) -> &str {
        if self.is_root() {
            "/"
        } else {
            self.0.trim_end_matches('/')
        }
    }

    /// Browser-facing, percent-encoded form (unreserved characters kept).
    pub fn to_encoded(&self) -> String {
        use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
        const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
            .remove(b'-')
            .remove(b'.')
            .remove(b'_')
            .remove(b'~');
        self.0
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::root()
    }
}

impl AsRef<str> for Route {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Route {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Route {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}
