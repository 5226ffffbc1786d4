//! Received HTTP response

use std::collections::BTreeMap;

use serde_json::Value;

/// Maximum body bytes kept in diagnostics.
pub const SNIPPET_BYTES: usize = 512;

/// A response from the system under test.
///
/// The body is kept as text; the parsed JSON document is computed once on
/// construction and is `None` for non-JSON bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
    json: Option<Value>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            headers: BTreeMap::new(),
            body,
            elapsed_ms: 0,
            json,
        }
    }

    /// Build a response from a JSON document (mostly for fakes and tests).
    #[must_use]
    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Parsed body, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body truncated to [`SNIPPET_BYTES`] on a char boundary.
    #[must_use]
    pub fn snippet(&self) -> String {
        truncate(&self.body, SNIPPET_BYTES)
    }
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…({} bytes total)", &text[..end], text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_is_parsed_once() {
        let r = Response::new(200, r#"{"ok":true}"#);
        assert_eq!(r.json(), Some(&json!({"ok": true})));
    }

    #[test]
    fn non_json_body_has_no_document() {
        let r = Response::new(500, "Internal Server Error");
        assert!(r.json().is_none());
        assert_eq!(r.body, "Internal Server Error");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let r = Response::new(200, "").with_headers(BTreeMap::from([(
            "content-type".to_string(),
            "application/json".to_string(),
        )]));
        assert_eq!(r.header("Content-Type"), Some("application/json"));
        assert_eq!(r.header("x-missing"), None);
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let body = "ã".repeat(SNIPPET_BYTES);
        let r = Response::new(200, body.clone());
        let snippet = r.snippet();
        assert!(snippet.contains("bytes total"));
        assert!(snippet.len() < body.len());
    }

    #[test]
    fn short_body_snippet_is_verbatim() {
        let r = Response::new(404, "not found");
        assert_eq!(r.snippet(), "not found");
    }
}
