//! Collaborator boundary: module loading and rendering.
//!
//! The generator never inspects module values itself. A [`ModuleHost`]
//! reports each module's [`ModuleShape`], which is validated once into a
//! [`ModuleDescriptor`] or a reason it cannot be used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::Route;

/// Name of the optional props-producing export.
pub const PROPS_EXPORT: &str = "props";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("no runtime command configured (set [build.runtime].command)")]
    NotConfigured,

    #[error("failed to run runtime: {0}")]
    Spawn(String),

    #[error("runtime exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("malformed runtime reply: {0}")]
    Reply(String),

    /// The module itself threw.
    #[error("{0}")]
    Thrown(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    #[default]
    Missing,
    Function,
    Value,
}

/// What a loaded module exposes, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleShape {
    pub default_export: ExportKind,
    pub props: ExportKind,
    /// Raw `title` export.
    pub title: Option<Value>,
    /// Raw `meta` export.
    pub meta: Option<Value>,
}

/// A module that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    pub module: PathBuf,
    pub has_props: bool,
    pub meta: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Valid(ModuleDescriptor),
    Invalid(String),
}

impl ModuleShape {
    /// Check the shape once. `component` modules must export a callable
    /// default; every module's props export, when present, must be callable.
    pub fn validate(self, module: &Path, component: bool) -> Validated {
        if component && self.default_export != ExportKind::Function {
            return Validated::Invalid(match self.default_export {
                ExportKind::Missing => "missing a default export".into(),
                _ => "default export is not a component function".into(),
            });
        }
        if self.props == ExportKind::Value {
            return Validated::Invalid(format!("`{PROPS_EXPORT}` export is not callable"));
        }

        let mut meta = match self.meta {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Validated::Invalid("`meta` export is not an object".into()),
        };
        match self.title {
            None | Some(Value::Null) => {}
            Some(Value::String(title)) => {
                meta.insert("title".into(), Value::String(title));
            }
            Some(_) => return Validated::Invalid("`title` export is not a string".into()),
        }

        Validated::Valid(ModuleDescriptor {
            module: module.to_path_buf(),
            has_props: self.props == ExportKind::Function,
            meta,
        })
    }
}

/// Passed to props-producing exports.
#[derive(Debug, Clone, Serialize)]
pub struct PropsContext {
    pub route: Route,
    pub url: String,
    pub api_base_url: String,
}

/// Loads compiled modules and runs their exports.
pub trait ModuleHost: Send + Sync {
    fn describe(&self, module: &Path) -> Result<ModuleShape, HostError>;

    fn call_props(&self, module: &Path, ctx: &PropsContext) -> Result<Value, HostError>;

    /// Compiled modules changed; forget anything loaded before.
    fn reload(&self) {}
}

/// Element tree handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Component {
        module: PathBuf,
        props: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        children: Option<Box<Element>>,
    },
    /// Pre-rendered markup (markdown bodies).
    Html { html: String },
}

/// A layout in the chain, as the renderer and the hydration bootstrap see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub module: String,
    pub props: Value,
}

/// Read-only location. Navigation is stubbed out during rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationInfo {
    pub url: String,
    pub route: Route,
    pub base_url: String,
    pub navigation: &'static str,
}

impl LocationInfo {
    pub fn new(url: String, route: Route, base_url: String) -> Self {
        Self {
            url,
            route,
            base_url,
            navigation: "disabled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub element: Element,
    pub meta: Map<String, Value>,
    pub layouts: Vec<LayoutDescriptor>,
    pub location: LocationInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOutput {
    pub head: String,
    pub body: String,
    /// Collected stylesheet text, one entry per `<style>` block.
    pub styles: Vec<String>,
}

pub trait Renderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, HostError>;
}
