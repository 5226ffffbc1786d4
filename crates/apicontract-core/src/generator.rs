//! HTTP file generator - renders failing scenarios as `.http` reproductions

use crate::outcome::ScenarioResult;
use crate::request::ResolvedRequest;

/// Generate .http file content from the failing and erroring scenarios in `results`.
///
/// Every step of a scenario is emitted in order, so replaying the file top to
/// bottom recreates its fixtures. Passing scenarios are skipped.
#[must_use]
pub fn to_http_file(results: &[ScenarioResult], base_url_var: &str) -> String {
    let failing: Vec<_> = results.iter().filter(|r| !r.outcome.is_pass()).collect();

    let mut lines = Vec::new();
    lines.push(format!(
        "# Auto-generated reproduction cases ({} scenarios)",
        failing.len()
    ));
    lines.push(format!("# Base URL variable: {{{{{base_url_var}}}}}"));
    lines.push(String::new());

    for (idx, result) in failing.iter().enumerate() {
        lines.push(format!(
            "### [{idx}] {} - {}",
            result.outcome.label(),
            result.id()
        ));
        if let Some(reason) = result.outcome.reason() {
            lines.push(format!("# {reason}"));
        }
        if result.steps.is_empty() {
            lines.push("# (no request was sent)".to_string());
        }

        for step in &result.steps {
            let status = step
                .status
                .map_or_else(|| "no response".to_string(), |s| s.to_string());
            lines.push(format!("# {} -> {status}", step.label));
            lines.push(request_line(&step.request, base_url_var));
            lines.extend(header_lines(&step.request));
            if let Some(body) = &step.request.body {
                lines.push(String::new());
                lines.push(body.to_string());
            }
            lines.push(String::new());
        }

        lines.push("###".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

fn request_line(request: &ResolvedRequest, base_url_var: &str) -> String {
    let url = if request.url.starts_with("http") {
        request.url.clone()
    } else {
        format!("{{{{{base_url_var}}}}}{}", request.url)
    };
    format!("{} {url}", request.method)
}

fn header_lines(request: &ResolvedRequest) -> Vec<String> {
    let mut lines: Vec<String> = request
        .headers
        .iter()
        .filter(|(k, _)| !matches!(k.to_lowercase().as_str(), "host" | "content-length"))
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    let has_content_type = request
        .headers
        .keys()
        .any(|k| k.eq_ignore_ascii_case("content-type"));
    if request.body.is_some() && !has_content_type {
        lines.push("Content-Type: application/json".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Outcome, Phase, ScenarioError, StepRecord};
    use crate::request::Method;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn create_store() -> StepRecord {
        StepRecord {
            phase: Phase::Setup,
            label: "setup[0] POST /mercado".into(),
            request: ResolvedRequest {
                method: Method::Post,
                url: "http://localhost:8080/mercado".into(),
                headers: BTreeMap::from([("Authorization".into(), "Bearer token".into())]),
                body: Some(json!({"nome": "Loja X"})),
            },
            status: Some(201),
            elapsed_ms: 12,
        }
    }

    fn errored() -> ScenarioResult {
        let mut r = ScenarioResult::new(
            "Mercado",
            "Obter mercado existente",
            Outcome::Error {
                error: ScenarioError::Timeout {
                    step: "act GET /mercado/5".into(),
                    timeout_ms: 30_000,
                },
            },
        );
        r.steps = vec![
            create_store(),
            StepRecord {
                phase: Phase::Act,
                label: "act GET /mercado/{{mercado.id}}".into(),
                request: ResolvedRequest {
                    method: Method::Get,
                    url: "http://localhost:8080/mercado/5".into(),
                    headers: BTreeMap::new(),
                    body: None,
                },
                status: None,
                elapsed_ms: 30_000,
            },
        ];
        r
    }

    #[test]
    fn generates_http_file_header() {
        let output = to_http_file(&[errored()], "base_url");

        assert!(output.contains("# Auto-generated reproduction cases (1 scenarios)"));
        assert!(output.contains("{{base_url}}"));
    }

    #[test]
    fn emits_every_step_in_order() {
        let output = to_http_file(&[errored()], "base_url");

        let post = output.find("POST http://localhost:8080/mercado").unwrap();
        let get = output.find("GET http://localhost:8080/mercado/5").unwrap();
        assert!(post < get);
        assert!(output.contains("# act GET /mercado/{{mercado.id}} -> no response"));
        assert!(output.contains("no response within 30000ms"));
    }

    #[test]
    fn includes_headers_and_body() {
        let output = to_http_file(&[errored()], "base_url");

        assert!(output.contains("Authorization: Bearer token"));
        assert!(output.contains("Content-Type: application/json"));
        assert!(output.contains(r#"{"nome":"Loja X"}"#));
    }

    #[test]
    fn skips_passing_scenarios() {
        let pass = ScenarioResult::new("Mercado", "ok", Outcome::Pass);
        let output = to_http_file(&[pass], "base_url");
        assert!(output.contains("(0 scenarios)"));
        assert!(!output.contains("### [0]"));
    }

    #[test]
    fn relative_url_uses_variable() {
        let mut step = create_store();
        step.request.url = "/mercado".into();
        let line = request_line(&step.request, "host");
        assert_eq!(line, "POST {{host}}/mercado");
    }
}
