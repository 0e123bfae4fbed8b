//! Minification of vendored package files (`build.minify`).
//!
//! Only files copied into `<external>/<name>@<version>/` go through here.
//! A file that fails to parse is copied verbatim; the reason is logged with
//! `--verbose`.

use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.js` / `.mjs`, parsed as an ES module
    Module,
    Stylesheet,
}

impl AssetKind {
    /// Kind of a vendored file worth minifying. Files a package already
    /// ships minified (`index.min.js`) are left alone.
    pub fn of(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        if stem.ends_with(".min") {
            return None;
        }
        match path.extension()?.to_str()? {
            "js" | "mjs" => Some(Self::Module),
            "css" => Some(Self::Stylesheet),
            _ => None,
        }
    }
}

/// Minify `source` as `kind`. `path` only names the file in errors.
pub fn minify(kind: AssetKind, path: &Path, source: &str) -> Result<String, String> {
    match kind {
        AssetKind::Module => minify_module(source),
        AssetKind::Stylesheet => minify_stylesheet(path, source),
    }
}

/// Top-level names are not mangled, so a package's exports keep their names.
fn minify_module(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(error.to_string());
    }

    let mut program = parsed.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let scoping = Minifier::new(options).minify(&allocator, &mut program).scoping;

    Ok(Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(scoping)
        .build(&program)
        .code)
}

fn minify_stylesheet(path: &Path, source: &str) -> Result<String, String> {
    let options = ParserOptions {
        filename: path.to_string_lossy().into_owned(),
        ..ParserOptions::default()
    };
    let sheet = StyleSheet::parse(source, options).map_err(|e| e.to_string())?;
    sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map(|printed| printed.code)
        .map_err(|e| e.to_string())
}
