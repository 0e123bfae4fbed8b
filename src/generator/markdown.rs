//! Markdown routes: front matter + body.
//!
//! ```text
//! ---                     +++
//! title: Hello            title = "Hello"
//! tags: a, b              tags = ["a", "b"]
//! ---                     +++
//! # Body                  # Body
//! ```

use pulldown_cmark::{Options, Parser, html};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid TOML front matter: {0}")]
pub struct FrontMatterError(#[from] toml::de::Error);

/// A markdown file split into metadata and rendered body.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownDoc {
    pub meta: Map<String, Value>,
    pub html: String,
}

impl MarkdownDoc {
    pub fn parse(content: &str, options: Options) -> Result<Self, FrontMatterError> {
        let (meta, body) = match split_front_matter(content) {
            Some(FrontMatter::Yaml(fm, body)) => (parse_yaml_like(fm), body),
            Some(FrontMatter::Toml(fm, body)) => (parse_toml(fm)?, body),
            None => (Map::new(), content),
        };
        Ok(Self {
            meta,
            html: to_html(body, options),
        })
    }
}

pub fn to_html(body: &str, options: Options) -> String {
    let parser = Parser::new_ext(body, options);
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

enum FrontMatter<'a> {
    Yaml(&'a str, &'a str),
    Toml(&'a str, &'a str),
}

fn split_front_matter(content: &str) -> Option<FrontMatter<'_>> {
    let trimmed = content.trim_start();
    let fence = trimmed.get(..3)?;
    if fence != "---" && fence != "+++" {
        return None;
    }

    let end = trimmed[3..].find(&format!("\n{fence}"))?;
    let fm = trimmed[3..3 + end].trim();
    let body = trimmed[3 + end + 4..].trim_start_matches(['\r', '\n']);
    Some(if fence == "---" {
        FrontMatter::Yaml(fm, body)
    } else {
        FrontMatter::Toml(fm, body)
    })
}

/// `key: value` lines; nested YAML is out of scope.
fn parse_yaml_like(content: &str) -> Map<String, Value> {
    let mut meta = Map::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            meta.insert(key.trim().to_string(), parse_yaml_value(value.trim()));
        }
    }
    meta
}

fn parse_yaml_value(s: &str) -> Value {
    let unquoted = s
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    if let Some(text) = unquoted {
        return Value::String(text.to_string());
    }

    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s == "~" {
        return Value::Null;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = s.parse::<f64>()
        && let Some(num) = serde_json::Number::from_f64(n)
    {
        return Value::Number(num);
    }

    let list = s
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .or_else(|| s.contains(',').then_some(s));
    if let Some(list) = list {
        return Value::Array(
            list.split(',')
                .map(|item| item.trim().trim_matches(['"', '\'']))
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        );
    }

    Value::String(s.to_string())
}

fn parse_toml(content: &str) -> Result<Map<String, Value>, FrontMatterError> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(table
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(content: &str) -> MarkdownDoc {
        MarkdownDoc::parse(content, Options::empty()).unwrap()
    }

    #[test]
    fn test_yaml_front_matter() {
        let doc = parse("---\ntitle: Hello\ncount: 42\ndraft: false\ntags: a, b\nquoted: \"x, y\"\n---\n\n# Body\n");
        assert_eq!(doc.meta["title"], json!("Hello"));
        assert_eq!(doc.meta["count"], json!(42));
        assert_eq!(doc.meta["draft"], json!(false));
        assert_eq!(doc.meta["tags"], json!(["a", "b"]));
        assert_eq!(doc.meta["quoted"], json!("x, y"));
        assert_eq!(doc.html, "<h1>Body</h1>\n");
    }

    #[test]
    fn test_toml_front_matter() {
        let doc = parse("+++\ntitle = \"Hello\"\ndate = 2024-01-01\ntags = [\"a\"]\n+++\nText\n");
        assert_eq!(doc.meta["title"], json!("Hello"));
        assert_eq!(doc.meta["date"], json!("2024-01-01"));
        assert_eq!(doc.meta["tags"], json!(["a"]));
        assert_eq!(doc.html, "<p>Text</p>\n");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(MarkdownDoc::parse("+++\ntitle = \n+++\n", Options::empty()).is_err());
    }

    #[test]
    fn test_no_front_matter() {
        let doc = parse("plain *text*");
        assert!(doc.meta.is_empty());
        assert_eq!(doc.html, "<p>plain <em>text</em></p>\n");
    }

    #[test]
    fn test_options_applied() {
        let table = "| a |\n|---|\n| 1 |\n";
        assert!(!parse(table).html.contains("<table>"));
        let doc = MarkdownDoc::parse(table, Options::ENABLE_TABLES).unwrap();
        assert!(doc.html.contains("<table>"));
    }
}
