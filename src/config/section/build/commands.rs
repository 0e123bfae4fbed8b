//! `[build.runtime]` and `[build.compiler]`: external collaborator commands.
//!
//! ```toml
//! [build.runtime]
//! command = ["node", "scripts/render.mjs"]
//!
//! [build.compiler]
//! command = ["npx", "tsc", "-p", "$TRELLIS_COMPILER_CONFIG", "--outDir", "$TRELLIS_OUT_ROOT"]
//! config = "tsconfig.json"
//! out_extension = "js"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process that loads modules and renders element trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub command: Vec<String>,
}

/// Source-to-module compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Empty: sources are copied unchanged.
    pub command: Vec<String>,

    /// Compiler configuration file, watched for changes.
    pub config: PathBuf,

    /// Extension of emitted modules (`tsx` -> `js`). `None` keeps the source extension.
    pub out_extension: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            config: "tsconfig.json".into(),
            out_extension: None,
        }
    }
}

impl CompilerConfig {
    pub fn is_enabled(&self) -> bool {
        !self.command.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_commands() {
        let config = test_parse_config(
            "[build.runtime]\ncommand = [\"node\", \"render.mjs\"]\n\
             [build.compiler]\ncommand = [\"tsc\"]\nout_extension = \"js\"",
        );
        assert_eq!(config.build.runtime.command, vec!["node", "render.mjs"]);
        assert!(config.build.compiler.is_enabled());
        assert_eq!(config.build.compiler.out_extension.as_deref(), Some("js"));
    }

    #[test]
    fn test_commands_defaults() {
        let config = test_parse_config("");
        assert!(config.build.runtime.command.is_empty());
        assert!(!config.build.compiler.is_enabled());
        assert_eq!(config.build.compiler.config.to_str(), Some("tsconfig.json"));
    }
}
