//! Expectations and the evaluator
//!
//! No I/O. Every expectation is checked against the same response; all
//! mismatches are returned in declaration order and the first one is the
//! one reported for the step.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::{BindingError, Bindings, lookup};
use crate::response::{Response, truncate};
use crate::template;

/// What a response must satisfy.
///
/// `text` and `expected` may contain `{{...}}` placeholders; they are
/// resolved against the scenario bindings right before evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// Exact status code match
    StatusEquals { code: u16 },
    /// Literal, case-sensitive substring of the body text
    BodyContains { text: String },
    /// Field at a dotted path exists, optionally deep-equal to `expected`
    BodyField {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected: Option<Value>,
    },
    /// Field at a dotted path is neither null nor an empty string
    FieldNonEmpty { path: String },
}

impl Expectation {
    /// Resolve placeholders in `text` / `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`] if a placeholder cannot be resolved.
    pub fn resolve(&self, bindings: &Bindings) -> Result<Self, BindingError> {
        Ok(match self {
            Self::StatusEquals { code } => Self::StatusEquals { code: *code },
            Self::BodyContains { text } => Self::BodyContains {
                text: template::render(text, bindings)?,
            },
            Self::BodyField { path, expected } => Self::BodyField {
                path: path.clone(),
                expected: expected
                    .as_ref()
                    .map(|e| template::render_json(e, bindings))
                    .transpose()?,
            },
            Self::FieldNonEmpty { path } => Self::FieldNonEmpty { path: path.clone() },
        })
    }

    /// Placeholder paths this expectation references.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::Malformed`] for malformed templates.
    pub fn placeholders(&self) -> Result<Vec<String>, BindingError> {
        match self {
            Self::StatusEquals { .. } | Self::FieldNonEmpty { .. } => Ok(Vec::new()),
            Self::BodyContains { text } => template::placeholders(text),
            Self::BodyField { expected, .. } => expected
                .as_ref()
                .map_or_else(|| Ok(Vec::new()), template::json_placeholders),
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatusEquals { code } => write!(f, "status == {code}"),
            Self::BodyContains { text } => write!(f, "body contains {text:?}"),
            Self::BodyField {
                path,
                expected: None,
            } => write!(f, "field {path} exists"),
            Self::BodyField {
                path,
                expected: Some(v),
            } => write!(f, "field {path} == {v}"),
            Self::FieldNonEmpty { path } => write!(f, "field {path} non-empty"),
        }
    }
}

/// A failed expectation with enough context to debug it from the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Mismatch {
    /// Position of the expectation within its step
    pub index: usize,
    /// The expectation as evaluated (placeholders resolved)
    pub expectation: Expectation,
    pub expected: String,
    pub actual: String,
    /// Response body, truncated
    pub snippet: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expectation #{} ({}) failed: expected {}, got {}",
            self.index, self.expectation, self.expected, self.actual
        )
    }
}

/// Evaluate every expectation against `response`.
///
/// Returns all mismatches in declaration order; empty means pass.
#[must_use]
pub fn evaluate(response: &Response, expectations: &[Expectation]) -> Vec<Mismatch> {
    expectations
        .iter()
        .enumerate()
        .filter_map(|(index, expectation)| check(index, expectation, response))
        .collect()
}

fn check(index: usize, expectation: &Expectation, response: &Response) -> Option<Mismatch> {
    let mismatch = |expected: String, actual: String| Mismatch {
        index,
        expectation: expectation.clone(),
        expected,
        actual,
        snippet: response.snippet(),
    };

    match expectation {
        Expectation::StatusEquals { code } => (response.status != *code)
            .then(|| mismatch(code.to_string(), response.status.to_string())),

        Expectation::BodyContains { text } => (!response.body.contains(text.as_str()))
            .then(|| mismatch(format!("body containing {text:?}"), body_excerpt(response))),

        Expectation::BodyField { path, expected } => {
            let Some(doc) = response.json() else {
                return Some(mismatch(
                    describe_field(path, expected.as_ref()),
                    "body is not JSON".to_string(),
                ));
            };
            match (lookup(doc, path), expected) {
                (None, _) => Some(mismatch(
                    describe_field(path, expected.as_ref()),
                    format!("field {path} absent"),
                )),
                (Some(actual), Some(want)) if actual != want => {
                    Some(mismatch(want.to_string(), actual.to_string()))
                }
                _ => None,
            }
        }

        Expectation::FieldNonEmpty { path } => {
            let wanted = format!("field {path} non-empty");
            let Some(doc) = response.json() else {
                return Some(mismatch(wanted, "body is not JSON".to_string()));
            };
            match lookup(doc, path) {
                None => Some(mismatch(wanted, format!("field {path} absent"))),
                Some(Value::Null) => Some(mismatch(wanted, "null".to_string())),
                Some(Value::String(s)) if s.is_empty() => Some(mismatch(wanted, "\"\"".to_string())),
                Some(_) => None,
            }
        }
    }
}

fn describe_field(path: &str, expected: Option<&Value>) -> String {
    match expected {
        Some(v) => format!("{path} = {v}"),
        None => format!("field {path} present"),
    }
}

fn body_excerpt(response: &Response) -> String {
    if response.body.is_empty() {
        "empty body".to_string()
    } else {
        truncate(&response.body, 120)
    }
}
