//! Source-to-module compilation.
//!
//! The compiler is an external collaborator. Two implementations:
//!
//! - [`CommandCompiler`]: runs `[build.compiler].command` once per batch with
//!   `$TRELLIS_*` variables (expanded in arguments and set in the environment).
//!   Non-script files are copied alongside, since most compilers skip them.
//! - [`CopyCompiler`]: mirrors the source tree unchanged.
//!
//! Every file handed to a compiler is rewritten, even when its output looks
//! newer: a file restored from a backup keeps its old mtime.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::asset::{Refresh, copy_file};
use crate::config::{CompilerConfig, Settings};
use crate::core::{FileRole, is_script};
use crate::utils::exec::{Cmd, output_lines};
use crate::utils::path::to_slash;

/// Outcome of one compile batch.
#[derive(Debug, Default, Clone)]
pub struct CompileReport {
    /// Output files written (or expected) for the batch.
    pub outputs: Vec<PathBuf>,
    /// Diagnostic lines emitted by the compiler.
    pub diagnostics: Vec<String>,
    pub success: bool,
}

impl CompileReport {
    fn ok(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            diagnostics: Vec::new(),
            success: true,
        }
    }
}

pub trait Compiler: Send + Sync {
    fn name(&self) -> &str;

    /// Compile `files` (absolute, below `src_root`) into `out_root`.
    fn compile(&self, files: &[PathBuf], src_root: &Path, out_root: &Path) -> Result<CompileReport>;

    /// Where the output of `source` lands.
    fn output_path(&self, source: &Path, src_root: &Path, out_root: &Path) -> PathBuf {
        out_root.join(source.strip_prefix(src_root).unwrap_or(source))
    }
}

/// Whether a source file is handed to the compiler at all.
///
/// Markdown is read straight from the source tree by the generator.
pub fn is_compilable(path: &Path) -> bool {
    FileRole::from_path(path) != Some(FileRole::Markdown)
}

pub struct CopyCompiler;

impl Compiler for CopyCompiler {
    fn name(&self) -> &str {
        "copy"
    }

    fn compile(&self, files: &[PathBuf], src_root: &Path, out_root: &Path) -> Result<CompileReport> {
        let mut outputs = Vec::with_capacity(files.len());
        for file in files.iter().filter(|f| is_compilable(f)) {
            let to = self.output_path(file, src_root, out_root);
            copy_file(file, &to, false, Refresh::Always)?;
            outputs.push(to);
        }
        Ok(CompileReport::ok(outputs))
    }
}

pub struct CommandCompiler {
    command: Vec<String>,
    config: PathBuf,
    out_extension: Option<String>,
    cwd: PathBuf,
}

impl CommandCompiler {
    pub fn new(config: &CompilerConfig, cwd: &Path) -> Self {
        Self {
            command: config.command.clone(),
            config: config.config.clone(),
            out_extension: config.out_extension.clone(),
            cwd: cwd.to_path_buf(),
        }
    }

    fn vars(&self, files: &[PathBuf], src_root: &Path, out_root: &Path) -> Vec<(String, String)> {
        let files = files
            .iter()
            .map(|f| to_slash(f))
            .collect::<Vec<_>>()
            .join("\n");
        vec![
            ("TRELLIS_SRC_ROOT".into(), to_slash(src_root)),
            ("TRELLIS_OUT_ROOT".into(), to_slash(out_root)),
            ("TRELLIS_COMPILER_CONFIG".into(), to_slash(&self.config)),
            ("TRELLIS_FILES".into(), files),
        ]
    }
}

/// Replace `$NAME` / `${NAME}` placeholders with values from `vars`.
fn expand(arg: &str, vars: &[(String, String)]) -> String {
    let mut out = arg.to_string();
    // longest names first so `$TRELLIS_SRC_ROOT_X` is not half-replaced
    let mut sorted: Vec<&(String, String)> = vars.iter().collect();
    sorted.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
    for (name, value) in sorted {
        out = out
            .replace(&format!("${{{name}}}"), value)
            .replace(&format!("${name}"), value);
    }
    out
}

impl Compiler for CommandCompiler {
    fn name(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("compiler")
    }

    fn compile(&self, files: &[PathBuf], src_root: &Path, out_root: &Path) -> Result<CompileReport> {
        let files: Vec<PathBuf> = files.iter().filter(|f| is_compilable(f)).cloned().collect();
        let (scripts, others): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| is_script(f));

        let mut report = CompileReport::ok(Vec::new());
        for file in &others {
            let to = self.output_path(file, src_root, out_root);
            copy_file(file, &to, false, Refresh::Always)?;
            report.outputs.push(to);
        }
        if scripts.is_empty() {
            return Ok(report);
        }

        let vars = self.vars(&scripts, src_root, out_root);
        let args: Vec<String> = self.command.iter().map(|a| expand(a, &vars)).collect();
        let output = Cmd::from_slice(&args).cwd(&self.cwd).envs(vars).output()?;

        report.success = output.status.success();
        report.diagnostics = output_lines(&output.stderr);
        report.diagnostics.extend(output_lines(&output.stdout));
        report.outputs.extend(
            scripts
                .iter()
                .map(|f| self.output_path(f, src_root, out_root)),
        );
        Ok(report)
    }

    fn output_path(&self, source: &Path, src_root: &Path, out_root: &Path) -> PathBuf {
        let rel = source.strip_prefix(src_root).unwrap_or(source);
        let out = out_root.join(rel);
        match &self.out_extension {
            Some(ext) if is_script(source) => out.with_extension(ext),
            _ => out,
        }
    }
}

/// The compiler configured for this site.
pub fn from_settings(settings: &Settings) -> Box<dyn Compiler> {
    let config = &settings.config.build.compiler;
    if config.is_enabled() {
        Box::new(CommandCompiler::new(config, settings.root()))
    } else {
        Box::new(CopyCompiler)
    }
}
