//! HTTP call builder
//!
//! A [`RequestSpec`] is a description only: method, path template, header
//! templates, optional body template, expectations and an optional capture.
//! Templates are resolved lazily by [`RequestSpec::resolve`].

use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::{BindingError, Bindings};
use crate::expect::Expectation;
use crate::template;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a passing response is stored for later steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Binding name
    pub name: String,
    /// Dotted path of the sub-object to keep; `None` keeps the whole body
    pub path: Option<String>,
}

/// Declarative description of one HTTP call and what its response must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    expectations: Vec<Expectation>,
    capture: Option<Capture>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            expectations: Vec::new(),
            capture: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Add a header; the value may contain placeholders.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body template. Leaving it unset sends no body at all.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    #[must_use]
    pub fn expect_status(self, code: u16) -> Self {
        self.expect(Expectation::StatusEquals { code })
    }

    #[must_use]
    pub fn expect_body_contains(self, text: impl Into<String>) -> Self {
        self.expect(Expectation::BodyContains { text: text.into() })
    }

    /// Field at `path` must exist; null counts as present.
    #[must_use]
    pub fn expect_field(self, path: impl Into<String>) -> Self {
        self.expect(Expectation::BodyField {
            path: path.into(),
            expected: None,
        })
    }

    /// Field at `path` must be neither null nor `""`.
    #[must_use]
    pub fn expect_non_empty(self, path: impl Into<String>) -> Self {
        self.expect(Expectation::FieldNonEmpty { path: path.into() })
    }

    #[must_use]
    pub fn expect_field_eq(self, path: impl Into<String>, expected: Value) -> Self {
        self.expect(Expectation::BodyField {
            path: path.into(),
            expected: Some(expected),
        })
    }

    /// Capture the whole response body under `name`.
    #[must_use]
    pub fn returns(mut self, name: impl Into<String>) -> Self {
        self.capture = Some(Capture {
            name: name.into(),
            path: None,
        });
        self
    }

    /// Capture the sub-object at `path` under `name`.
    #[must_use]
    pub fn returns_at(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.capture = Some(Capture {
            name: name.into(),
            path: Some(path.into()),
        });
        self
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    #[must_use]
    pub fn capture(&self) -> Option<&Capture> {
        self.capture.as_ref()
    }

    /// `"POST /mercado/{{mercado.id}}"`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Every placeholder path referenced by the path, headers, body and expectations.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Malformed`] if any template is malformed.
    pub fn placeholders(&self) -> Result<Vec<String>, BindingError> {
        let mut found = template::placeholders(&self.path)?;
        for (_, value) in &self.headers {
            found.extend(template::placeholders(value)?);
        }
        if let Some(body) = &self.body {
            found.extend(template::json_placeholders(body)?);
        }
        for expectation in &self.expectations {
            found.extend(expectation.placeholders()?);
        }
        Ok(found)
    }

    /// Resolve templates into a concrete request.
    ///
    /// `default_headers` apply first; headers declared on the request override them.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`] if a placeholder is unbound or a template is malformed.
    pub fn resolve(
        &self,
        base_url: &str,
        default_headers: &HashMap<String, String>,
        bindings: &Bindings,
    ) -> Result<ResolvedRequest, BindingError> {
        let path = template::render(&self.path, bindings)?;

        let mut headers: BTreeMap<String, String> = default_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), template::render(value, bindings)?);
        }

        let body = self
            .body
            .as_ref()
            .map(|b| template::render_json(b, bindings))
            .transpose()?;

        Ok(ResolvedRequest {
            method: self.method,
            url: join_url(base_url, &path),
            headers,
            body,
        })
    }
}

/// A fully resolved request, ready to send and to record in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
