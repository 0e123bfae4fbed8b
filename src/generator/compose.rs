//! Props injection and layout composition.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::error::{UnitError, json_kind};
use super::host::Element;

/// Values the pipeline adds to every props object.
#[derive(Debug, Clone, Copy)]
pub struct Injected<'a> {
    pub url: &'a str,
    pub meta: &'a Map<String, Value>,
    pub renderer: &'static str,
}

/// Check the props contract and add `url`, `meta` and `renderer`.
///
/// Injected keys override same-named keys returned by the module.
pub fn inject(module: &Path, props: Value, injected: Injected<'_>) -> Result<Value, UnitError> {
    let mut map = match props {
        Value::Object(map) => map,
        other => {
            return Err(UnitError::NotObject {
                module: module.to_path_buf(),
                found: json_kind(&other),
            });
        }
    };
    map.insert("url".into(), Value::String(injected.url.to_string()));
    map.insert("meta".into(), Value::Object(injected.meta.clone()));
    map.insert("renderer".into(), Value::String(injected.renderer.into()));
    Ok(Value::Object(map))
}

/// Wrap `content` in `layouts` (outermost first): the innermost layout
/// receives the content as children, each outer layout the result so far.
pub fn compose(content: Element, layouts: &[(PathBuf, Value)]) -> Element {
    layouts
        .iter()
        .rev()
        .fold(content, |inner, (module, props)| Element::Component {
            module: module.clone(),
            props: props.clone(),
            children: Some(Box::new(inner)),
        })
}
