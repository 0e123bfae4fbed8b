//! In-process module host and renderer for tests.
//!
//! The host reads directives from the module's own source, so a fixture is
//! one file:
//!
//! ```js
//! // props: {"items": [1, 2]}
//! // meta: {"title": "About"}
//! export default function About() {}
//! ```
//!
//! `// props: panic` panics inside the unit, `// props: throw` fails like a
//! throwing export. Modules without `export default` are data-only.

use std::path::Path;

use serde_json::{Map, Value};

use super::host::{
    Element, ExportKind, HostError, ModuleHost, ModuleShape, PropsContext, RenderOutput,
    RenderRequest, Renderer,
};

pub struct FakeHost;

fn directive(source: &str, name: &str) -> Option<String> {
    let prefix = format!("// {name}:");
    source
        .lines()
        .find_map(|line| line.trim().strip_prefix(&prefix))
        .map(|rest| rest.trim().to_string())
}

fn read(module: &Path) -> Result<String, HostError> {
    std::fs::read_to_string(module).map_err(|e| HostError::Spawn(e.to_string()))
}

impl ModuleHost for FakeHost {
    fn describe(&self, module: &Path) -> Result<ModuleShape, HostError> {
        let source = read(module)?;
        let meta = directive(&source, "meta")
            .map(|raw| serde_json::from_str(&raw).map_err(|e| HostError::Reply(e.to_string())))
            .transpose()?;
        Ok(ModuleShape {
            default_export: if source.contains("export default") {
                ExportKind::Function
            } else {
                ExportKind::Missing
            },
            props: match directive(&source, "props") {
                Some(_) => ExportKind::Function,
                None => ExportKind::Missing,
            },
            title: None,
            meta,
        })
    }

    fn call_props(&self, module: &Path, _ctx: &PropsContext) -> Result<Value, HostError> {
        let source = read(module)?;
        match directive(&source, "props").as_deref() {
            Some("panic") => panic!("props exploded in {}", module.display()),
            Some("throw") => Err(HostError::Thrown("props threw".into())),
            Some(raw) => serde_json::from_str(raw).map_err(|e| HostError::Reply(e.to_string())),
            None => Ok(Value::Object(Map::new())),
        }
    }
}

/// Renders components as `<div data-module="file name">children</div>`.
pub struct FakeRenderer;

fn render_element(element: &Element, out: &mut String) {
    match element {
        Element::Html { html } => out.push_str(html),
        Element::Component {
            module, children, ..
        } => {
            let name = module
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push_str(&format!(r#"<div data-module="{name}">"#));
            if let Some(child) = children {
                render_element(child, out);
            }
            out.push_str("</div>");
        }
    }
}

impl Renderer for FakeRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, HostError> {
        let mut body = String::new();
        render_element(&request.element, &mut body);
        let head = request
            .meta
            .get("title")
            .and_then(Value::as_str)
            .map(|title| format!("<title>{title}</title>"))
            .unwrap_or_default();
        Ok(RenderOutput {
            head,
            body,
            styles: Vec::new(),
        })
    }
}
