use std::path::PathBuf;

use thiserror::Error;

use super::host::HostError;
use super::markdown::FrontMatterError;
use crate::core::Route;

/// Failure of one route's generation. Never aborts sibling units.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("route `{0}` is not in the route table")]
    UnknownRoute(Route),

    #[error("`{}` cannot be used: {reason}", .module.display())]
    Invalid { module: PathBuf, reason: String },

    #[error("`{}` props must be an object, got {found}", .module.display())]
    NotObject { module: PathBuf, found: &'static str },

    #[error("`{}`: {source}", .module.display())]
    Host {
        module: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("`{}`: {source}", .path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("failed to read `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render failed: {0}")]
    Render(#[source] HostError),

    #[error("failed to write `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generation panicked: {0}")]
    Panic(String),
}

impl UnitError {
    pub(crate) fn host(module: &std::path::Path, source: HostError) -> Self {
        Self::Host {
            module: module.to_path_buf(),
            source,
        }
    }
}

/// JSON type name for diagnostics.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
