//! Source file roles.
//!
//! A module declares its role with a suffix before the extension:
//! `about.page.tsx`, `index.static.js`, `root.layout.jsx`.

use std::path::Path;

use serde::Serialize;

/// Script extensions recognised as modules.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "jsx", "ts", "mts", "tsx"];

/// Markdown content extensions.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Role of a file inside the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// Render-only page component.
    Page,
    /// Browser hydration entry, paired with a `Static` module.
    Client,
    /// Server-rendered component and data source.
    Static,
    /// Server-only helper module.
    Server,
    /// Wrapper composed around pages below its directory.
    Layout,
    /// Exported functions become API endpoints.
    Api,
    /// Markdown document.
    Markdown,
    /// Script without a role suffix.
    Module,
}

impl FileRole {
    /// Classify a path. Returns `None` for non-module files (css, images, ...).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (stem, ext) = name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();

        if MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
            return Some(Self::Markdown);
        }
        if !SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }

        let role = match stem.rsplit_once('.') {
            Some((_, suffix)) => Self::from_suffix(suffix).unwrap_or(Self::Module),
            None => Self::Module,
        };
        Some(role)
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "page" => Some(Self::Page),
            "client" => Some(Self::Client),
            "static" => Some(Self::Static),
            "server" => Some(Self::Server),
            "layout" => Some(Self::Layout),
            "api" => Some(Self::Api),
            _ => None,
        }
    }

    /// Modules that must never reach the browser.
    #[inline]
    pub fn is_server_only(self) -> bool {
        matches!(self, Self::Server | Self::Static | Self::Api)
    }

    /// Modules loaded by the browser-side bootstrap.
    #[inline]
    pub fn is_client_facing(self) -> bool {
        matches!(self, Self::Client | Self::Layout)
    }

    /// Roles that produce a route entry.
    #[inline]
    pub fn is_content(self) -> bool {
        matches!(self, Self::Page | Self::Client | Self::Static | Self::Markdown)
    }
}

/// Strip extension and role suffix from a file name: `index.page.tsx` -> `index`.
pub fn stem_without_role(name: &str) -> &str {
    let Some((stem, _ext)) = name.rsplit_once('.') else {
        return name;
    };
    match stem.rsplit_once('.') {
        Some((base, suffix)) if FileRole::from_suffix(suffix).is_some() => base,
        _ => stem,
    }
}

/// Whether the path has a script extension.
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn role(p: &str) -> Option<FileRole> {
        FileRole::from_path(&PathBuf::from(p))
    }

    #[test]
    fn test_roles_by_suffix() {
        assert_eq!(role("src/index.page.tsx"), Some(FileRole::Page));
        assert_eq!(role("src/about/index.client.jsx"), Some(FileRole::Client));
        assert_eq!(role("src/about/index.static.js"), Some(FileRole::Static));
        assert_eq!(role("src/db.server.ts"), Some(FileRole::Server));
        assert_eq!(role("src/index.layout.mjs"), Some(FileRole::Layout));
        assert_eq!(role("src/about/data.api.ts"), Some(FileRole::Api));
        assert_eq!(role("src/blog/post.md"), Some(FileRole::Markdown));
        assert_eq!(role("src/utils/format.ts"), Some(FileRole::Module));
        assert_eq!(role("src/styles/site.css"), None);
        assert_eq!(role("README"), None);
    }

    #[test]
    fn test_unknown_suffix_is_plain_module() {
        assert_eq!(role("src/jquery.min.js"), Some(FileRole::Module));
    }

    #[test]
    fn test_server_and_client_sets() {
        assert!(FileRole::Api.is_server_only());
        assert!(FileRole::Static.is_server_only());
        assert!(!FileRole::Page.is_server_only());
        assert!(FileRole::Layout.is_client_facing());
        assert!(!FileRole::Page.is_client_facing());
    }

    #[test]
    fn test_stem_without_role() {
        assert_eq!(stem_without_role("index.page.tsx"), "index");
        assert_eq!(stem_without_role("post.md"), "post");
        assert_eq!(stem_without_role("jquery.min.js"), "jquery.min");
        assert_eq!(stem_without_role("noext"), "noext");
    }
}
