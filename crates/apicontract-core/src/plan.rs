//! Dry run plan and suite validation
//!
//! Describes what a run *would* do without sending any requests.
//! Used for pre-flight validation and CI previews.

use std::collections::{BTreeSet, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::expect::Expectation;
use crate::outcome::Phase;
use crate::scenario::Scenario;
use crate::template::root_of;

// ── Plan types ──

/// Complete dry run plan: scenarios, request counts, and validations.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuitePlan {
    pub scenarios: Vec<ScenarioPlan>,
    /// Total requests that would be sent if everything passes
    pub total_requests: usize,
    pub validations: Vec<Validation>,
}

/// Execution plan for a single scenario.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioPlan {
    pub group: String,
    pub name: String,
    pub steps: Vec<StepPlan>,
}

/// One planned HTTP call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepPlan {
    pub phase: Phase,
    pub label: String,
    pub expectations: Vec<Expectation>,
    /// Binding name this step captures, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captures: Option<String>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status,
            message: message.into(),
        }
    }
}

// ── Building ──

impl SuitePlan {
    /// Plan `scenarios` and check that they can run at all.
    #[must_use]
    pub fn from_scenarios(scenarios: &[Scenario], config: &Config) -> Self {
        let mut validations = validate_config(config);

        if scenarios.is_empty() {
            validations.push(Validation::new(
                "suite",
                ValidationStatus::Error,
                "suite: no scenarios selected",
            ));
        }

        let mut seen = HashSet::new();
        for scenario in scenarios {
            if !seen.insert(scenario.id()) {
                validations.push(Validation::new(
                    "names",
                    ValidationStatus::Warning,
                    format!("duplicate scenario name: {}", scenario.id()),
                ));
            }
            validations.extend(validate_bindings(scenario));
        }

        let plans: Vec<ScenarioPlan> = scenarios.iter().map(plan_scenario).collect();
        let total_requests = plans.iter().map(|p| p.steps.len()).sum();

        Self {
            scenarios: plans,
            total_requests,
            validations,
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }
}

fn plan_scenario(scenario: &Scenario) -> ScenarioPlan {
    ScenarioPlan {
        group: scenario.group().to_string(),
        name: scenario.name().to_string(),
        steps: scenario
            .steps()
            .map(|(phase, label, step)| StepPlan {
                phase,
                label,
                expectations: step.expectations().to_vec(),
                captures: step.capture().map(|c| c.name.clone()),
            })
            .collect(),
    }
}

/// Every placeholder root must be captured by an earlier step of the same scenario.
fn validate_bindings(scenario: &Scenario) -> Vec<Validation> {
    let mut issues = Vec::new();
    let mut available: BTreeSet<String> = BTreeSet::new();

    for (_, label, step) in scenario.steps() {
        match step.placeholders() {
            Ok(paths) => {
                let missing: BTreeSet<&str> = paths
                    .iter()
                    .map(|p| root_of(p))
                    .filter(|root| !available.contains(*root))
                    .collect();
                for root in missing {
                    issues.push(Validation::new(
                        "bindings",
                        ValidationStatus::Error,
                        format!(
                            "{}: {label} references '{root}' before it is captured",
                            scenario.id()
                        ),
                    ));
                }
            }
            Err(e) => issues.push(Validation::new(
                "templates",
                ValidationStatus::Error,
                format!("{}: {label}: {e}", scenario.id()),
            )),
        }
        if let Some(capture) = step.capture() {
            available.insert(capture.name.clone());
        }
    }

    issues
}

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "YOUR_TOKEN",
    "your-api-key",
    "CHANGEME",
    "changeme",
    "placeholder",
    "replace-me",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {}", config.base_url),
        ));
    } else {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        ));
    }

    checks.push(Validation::new(
        "runner",
        ValidationStatus::Ok,
        format!(
            "timeout: {}s, concurrency: {}",
            config.timeout_secs, config.concurrency
        ),
    ));

    for (key, value) in &config.headers {
        if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| value.contains(*p)) {
            checks.push(Validation::new(
                "headers",
                ValidationStatus::Warning,
                format!("{key}: contains '{pattern}', may be a placeholder"),
            ));
        }
    }

    checks
}

// ── Display helpers ──

impl SuitePlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} scenarios, {} requests planned\n",
            self.scenarios.len(),
            self.total_requests,
        ));

        let mut group = None;
        for scenario in &self.scenarios {
            if group != Some(scenario.group.as_str()) {
                lines.push(format!("{}:", scenario.group));
                group = Some(scenario.group.as_str());
            }
            lines.push(format!("  {}", scenario.name));
            for step in &scenario.steps {
                let checks: Vec<String> =
                    step.expectations.iter().map(ToString::to_string).collect();
                let mut line = format!("    {}", step.label);
                if !checks.is_empty() {
                    line.push_str(&format!("  [{}]", checks.join(", ")));
                }
                if let Some(name) = &step.captures {
                    line.push_str(&format!("  -> {name}"));
                }
                lines.push(line);
            }
        }

        lines.push(String::new());
        lines.push("Validations:".to_string());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }
}
