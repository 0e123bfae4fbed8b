//! Static import/export scan with oxc.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::ast::ast::{Declaration, ModuleDeclaration};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Module-level facts read from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleScan {
    /// Specifiers of static imports and re-exports, in source order.
    pub imports: Vec<String>,
    /// Named exports (not including `default`).
    pub exports: Vec<String>,
    pub has_default: bool,
}

/// Parse `source` and list its static imports and exports.
///
/// Type-only imports are skipped: they vanish at compile time.
pub fn scan_module(path: &Path, source: &str) -> Result<ModuleScan, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = ret.errors.first() {
        return Err(err.to_string());
    }

    let mut scan = ModuleScan::default();
    for stmt in &ret.program.body {
        let Some(decl) = stmt.as_module_declaration() else {
            continue;
        };
        match decl {
            ModuleDeclaration::ImportDeclaration(import) => {
                if !import.import_kind.is_type() {
                    scan.imports.push(import.source.value.to_string());
                }
            }
            ModuleDeclaration::ExportDefaultDeclaration(_) => scan.has_default = true,
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                if named.export_kind.is_type() {
                    continue;
                }
                if let Some(src) = &named.source {
                    scan.imports.push(src.value.to_string());
                }
                if let Some(decl) = &named.declaration {
                    collect_declaration(decl, &mut scan.exports);
                }
                for spec in &named.specifiers {
                    let name = spec.exported.name().to_string();
                    if name == "default" {
                        scan.has_default = true;
                    } else {
                        scan.exports.push(name);
                    }
                }
            }
            ModuleDeclaration::ExportAllDeclaration(all) => {
                scan.imports.push(all.source.value.to_string());
                if let Some(exported) = &all.exported {
                    scan.exports.push(exported.name().to_string());
                }
            }
            _ => {}
        }
    }
    Ok(scan)
}

fn collect_declaration(decl: &Declaration<'_>, exports: &mut Vec<String>) {
    match decl {
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                exports.push(id.name.to_string());
            }
        }
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                if let Some(ident) = declarator.id.get_binding_identifier() {
                    exports.push(ident.name.to_string());
                }
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                exports.push(id.name.to_string());
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scan(name: &str, src: &str) -> ModuleScan {
        scan_module(&PathBuf::from(name), src).unwrap()
    }

    #[test]
    fn test_imports_and_reexports() {
        let result = scan(
            "a.js",
            r#"import React from "react";
import "./side-effect.js";
export { helper } from "./helper.js";
export * from "./all.js";
const lazy = () => import("./lazy.js");
"#,
        );
        assert_eq!(
            result.imports,
            vec!["react", "./side-effect.js", "./helper.js", "./all.js"]
        );
        assert_eq!(result.exports, vec!["helper"]);
    }

    #[test]
    fn test_exports() {
        let result = scan(
            "about.api.ts",
            r#"export async function getAboutData() { return {}; }
export const postMessage = async () => {};
export class Store {}
const meta = { title: "x" };
export { meta, meta as default };
"#,
        );
        assert_eq!(
            result.exports,
            vec!["getAboutData", "postMessage", "Store", "meta"]
        );
        assert!(result.has_default);
    }

    #[test]
    fn test_type_imports_skipped() {
        let result = scan(
            "page.tsx",
            r#"import type { Props } from "./types";
import { h } from "preact";
export default function Page(props: Props) { return h("div", null); }
"#,
        );
        assert_eq!(result.imports, vec!["preact"]);
        assert!(result.has_default);
    }

    #[test]
    fn test_syntax_error() {
        assert!(scan_module(&PathBuf::from("bad.js"), "import { from ;").is_err());
    }
}
