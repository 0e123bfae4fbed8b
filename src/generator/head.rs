//! Document head and shell.
//!
//! Head order: renderer head markup, collected styles, import map,
//! `modulepreload` links.

use crate::utils::html::escape_attr;

/// Assemble the `<head>` contents.
pub fn assemble_head(rendered: &str, styles: &[String], import_map: &str, preloads: &[String]) -> String {
    let mut head = String::from(rendered);
    for style in styles.iter().filter(|s| !s.trim().is_empty()) {
        head.push_str("<style>");
        head.push_str(&style.replace("</style", "<\\/style"));
        head.push_str("</style>");
    }
    head.push_str(import_map);
    for url in preloads {
        head.push_str(&format!(r#"<link rel="modulepreload" href="{}">"#, escape_attr(url)));
    }
    head
}

/// Module script that boots hydration from the sidecar.
pub fn bootstrap_script(hydrate_url: &str, descriptor_url: &str) -> String {
    format!(
        r#"<script type="module" src="{}" data-descriptor="{}"></script>"#,
        escape_attr(hydrate_url),
        escape_attr(descriptor_url)
    )
}

pub fn document(head: &str, body: &str, bootstrap: &str) -> String {
    format!(
        r#"<!doctype html><html><head>{head}</head><body><div id="root">{body}</div>{bootstrap}</body></html>"#
    )
}
