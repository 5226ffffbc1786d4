//! Per-scenario variable bindings
//!
//! A binding is a value captured from an earlier response and addressed by
//! name (`mercado`) or by dotted path into it (`mercado.id`). Bindings belong
//! to exactly one scenario context and are dropped with it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::response::Response;

/// Named values captured during one scenario.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<String, Value>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name`, replacing any previous value.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Capture the parsed response body (or the sub-object at `path`) under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Capture`] if the body is not JSON or `path` is absent.
    pub fn capture(
        &mut self,
        name: &str,
        response: &Response,
        path: Option<&str>,
    ) -> Result<&Value, BindingError> {
        let body = response.json().ok_or_else(|| BindingError::Capture {
            name: name.to_string(),
            reason: format!("response body is not JSON ({} bytes)", response.body.len()),
        })?;

        let value = match path {
            Some(p) => lookup(body, p).ok_or_else(|| BindingError::Capture {
                name: name.to_string(),
                reason: format!("field '{p}' not present in response body"),
            })?,
            None => body,
        };

        self.values.insert(name.to_string(), value.clone());
        Ok(&self.values[name])
    }

    /// Resolve `name` or `name.field.sub` to a bound value.
    ///
    /// # Errors
    ///
    /// [`BindingError::Unbound`] if the root name was never bound,
    /// [`BindingError::MissingField`] if the nested path does not exist.
    pub fn resolve(&self, path: &str) -> Result<&Value, BindingError> {
        let (root, rest) = split_root(path);
        let value = self
            .values
            .get(root)
            .ok_or_else(|| BindingError::Unbound(root.to_string()))?;

        match rest {
            None => Ok(value),
            Some(rest) => lookup(value, rest).ok_or_else(|| BindingError::MissingField {
                root: root.to_string(),
                path: rest.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Navigate `value` by a dotted path. Numeric segments index arrays.
///
/// An empty path returns `value` itself.
#[must_use]
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// `"mercado.id"` → `("mercado", Some("id"))`
pub(crate) fn split_root(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((root, rest)) => (root, Some(rest)),
        None => (path, None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("unbound variable '{0}'")]
    Unbound(String),
    #[error("variable '{root}' has no field '{path}'")]
    MissingField { root: String, path: String },
    #[error("malformed template '{0}': unterminated or empty placeholder")]
    Malformed(String),
    #[error("cannot capture '{name}': {reason}")]
    Capture { name: String, reason: String },
}
