//! File path → route derivation.

use std::path::{Component, Path};

use crate::core::{Route, stem_without_role};

/// Derive the route of a file given its path relative to the source root.
///
/// - directory segments starting with `_` are organisational and dropped
/// - the role suffix and extension are stripped
/// - an `index` basename collapses to its directory
///
/// ```text
/// index.page.tsx                 -> /
/// about/index.client.jsx         -> /about/
/// blog/_drafts/post.md           -> /blog/post/
/// _components/nav.layout.tsx     -> /nav/
/// ```
pub fn derive_route(rel: &Path) -> Route {
    let mut segments: Vec<&str> = Vec::new();
    let mut components = rel.components().peekable();

    while let Some(component) = components.next() {
        let Component::Normal(name) = component else {
            continue;
        };
        let Some(name) = name.to_str() else {
            continue;
        };

        if components.peek().is_some() {
            if !name.starts_with('_') {
                segments.push(name);
            }
            continue;
        }

        let stem = stem_without_role(name);
        if stem != "index" {
            segments.push(stem);
        }
    }

    Route::from_segments(segments)
}

/// Number of directory segments between the source root and the file.
pub fn depth_of(rel: &Path) -> usize {
    rel.parent()
        .map(|p| {
            p.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn route(rel: &str) -> String {
        derive_route(&PathBuf::from(rel)).as_str().to_string()
    }

    #[test]
    fn test_derive_route() {
        assert_eq!(route("index.page.tsx"), "/");
        assert_eq!(route("about/index.client.jsx"), "/about/");
        assert_eq!(route("about/index.static.js"), "/about/");
        assert_eq!(route("about.page.tsx"), "/about/");
        assert_eq!(route("blog/post.md"), "/blog/post/");
        assert_eq!(route("blog/_drafts/post.md"), "/blog/post/");
        assert_eq!(route("_layouts/index.layout.js"), "/");
        assert_eq!(route("events/index.page.js"), "/events/");
    }

    #[test]
    fn test_derive_route_idempotent() {
        for rel in ["index.page.tsx", "a/b/c.page.js", "_x/y/index.md", "docs/guide.markdown"] {
            let once = derive_route(&PathBuf::from(rel));
            let again = derive_route(&PathBuf::from(once.as_str().trim_matches('/')));
            assert_eq!(Route::new(once.as_str()), once);
            assert_eq!(again, once);
        }
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth_of(&PathBuf::from("index.layout.js")), 0);
        assert_eq!(depth_of(&PathBuf::from("about/index.layout.js")), 1);
        assert_eq!(depth_of(&PathBuf::from("a/_b/c.layout.js")), 2);
    }
}
