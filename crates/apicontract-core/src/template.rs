//! `{{name.path}}` template interpolation
//!
//! Pure functions of (bindings, template). Nothing is resolved until one of
//! the `render*` functions runs, so a request can reference a binding that
//! only exists after an earlier step has executed.

use serde_json::Value;

use crate::binding::{BindingError, Bindings, split_root};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, BindingError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or_else(|| BindingError::Malformed(template.to_string()))?;
        let name = after_open[..end].trim();
        if name.is_empty() {
            return Err(BindingError::Malformed(template.to_string()));
        }
        segments.push(Segment::Placeholder(name));
        rest = &after_open[end + CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Render a text template. Bound strings are inserted unquoted; other
/// JSON values in their JSON form.
///
/// # Errors
///
/// Returns [`BindingError`] for malformed templates or unresolvable placeholders.
pub fn render(template: &str, bindings: &Bindings) -> Result<String, BindingError> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(path) => out.push_str(&to_text(bindings.resolve(path)?)),
        }
    }
    Ok(out)
}

/// Render a JSON body template.
///
/// A string that is exactly one placeholder is replaced by the bound value
/// itself, keeping its JSON type. Any other string is rendered as text.
/// Object keys are never interpolated.
///
/// # Errors
///
/// Returns [`BindingError`] for malformed templates or unresolvable placeholders.
pub fn render_json(template: &Value, bindings: &Bindings) -> Result<Value, BindingError> {
    match template {
        Value::String(s) => {
            let segments = parse(s)?;
            match segments.as_slice() {
                [Segment::Placeholder(path)] => Ok(bindings.resolve(path)?.clone()),
                _ => render(s, bindings).map(Value::String),
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_json(item, bindings))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), render_json(value, bindings)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Placeholder paths referenced by a text template, in order of appearance.
///
/// # Errors
///
/// Returns [`BindingError::Malformed`] for malformed templates.
pub fn placeholders(template: &str) -> Result<Vec<String>, BindingError> {
    Ok(parse(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(path) => Some(path.to_string()),
            Segment::Literal(_) => None,
        })
        .collect())
}

/// Placeholder paths referenced anywhere inside a JSON template.
///
/// # Errors
///
/// Returns [`BindingError::Malformed`] for malformed templates.
pub fn json_placeholders(template: &Value) -> Result<Vec<String>, BindingError> {
    let mut found = Vec::new();
    collect_json(template, &mut found)?;
    Ok(found)
}

fn collect_json(value: &Value, found: &mut Vec<String>) -> Result<(), BindingError> {
    match value {
        Value::String(s) => found.extend(placeholders(s)?),
        Value::Array(items) => {
            for item in items {
                collect_json(item, found)?;
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_json(item, found)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Binding name a placeholder path starts from: `"mercado.id"` → `"mercado"`.
#[must_use]
pub fn root_of(path: &str) -> &str {
    split_root(path).0
}

/// Text form of a JSON value for paths, headers and substring checks.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
