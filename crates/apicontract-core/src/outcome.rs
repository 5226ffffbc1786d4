//! Scenario outcomes and the error taxonomy

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::binding::BindingError;
use crate::expect::Mismatch;
use crate::request::ResolvedRequest;

/// Which part of a scenario a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Act,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => f.write_str("setup"),
            Self::Act => f.write_str("act"),
        }
    }
}

/// One executed (or attempted) HTTP call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepRecord {
    pub phase: Phase,
    /// e.g. `"setup[0] POST /mercado"`
    pub label: String,
    pub request: ResolvedRequest,
    /// Received status; `None` when no response arrived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Coarse error category, used for counting and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Template referenced a binding that does not exist (harness bug)
    UnboundVariable,
    /// An expectation did not hold
    AssertionFailure,
    /// No response within the configured bound
    Timeout,
    /// Connection-level failure
    Transport,
    /// A response could not be captured as a binding
    Capture,
    /// Shutdown requested before the step ran
    Cancelled,
    /// The scenario panicked
    Panicked,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnboundVariable => "unbound_variable",
            Self::AssertionFailure => "assertion_failure",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Capture => "capture",
            Self::Cancelled => "cancelled",
            Self::Panicked => "panicked",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a scenario ended in `Error` rather than `Pass`/`Fail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioError {
    #[error("{step}: {message}")]
    UnboundVariable { step: String, message: String },
    #[error("{step}: setup expectation failed: {mismatch}")]
    SetupFailed { step: String, mismatch: Mismatch },
    #[error("{step}: {message}")]
    Capture { step: String, message: String },
    #[error("{step}: no response within {timeout_ms}ms")]
    Timeout { step: String, timeout_ms: u64 },
    #[error("{step}: transport error: {message}")]
    Transport { step: String, message: String },
    #[error("cancelled before {step}")]
    Cancelled { step: String },
    #[error("scenario panicked: {message}")]
    Panicked { message: String },
}

impl ScenarioError {
    /// Map a template/binding error raised while preparing `step`.
    #[must_use]
    pub fn from_binding(step: &str, err: BindingError) -> Self {
        match err {
            BindingError::Capture { .. } => Self::Capture {
                step: step.to_string(),
                message: err.to_string(),
            },
            BindingError::Unbound(_)
            | BindingError::MissingField { .. }
            | BindingError::Malformed(_) => Self::UnboundVariable {
                step: step.to_string(),
                message: err.to_string(),
            },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnboundVariable { .. } => ErrorKind::UnboundVariable,
            Self::SetupFailed { .. } => ErrorKind::AssertionFailure,
            Self::Capture { .. } => ErrorKind::Capture,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Panicked { .. } => ErrorKind::Panicked,
        }
    }
}

/// Terminal state of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    /// The act response violated an expectation
    Fail { mismatch: Mismatch },
    /// The scenario could not be carried out
    Error { error: ScenarioError },
}

impl Outcome {
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail { .. } => "FAIL",
            Self::Error { .. } => "ERROR",
        }
    }

    /// One-line explanation; `None` for a pass.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Pass => None,
            Self::Fail { mismatch } => Some(mismatch.to_string()),
            Self::Error { error } => Some(error.to_string()),
        }
    }
}

/// Result of one scenario, as handed to the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioResult {
    pub group: String,
    pub name: String,
    pub outcome: Outcome,
    /// RFC 3339 start timestamp
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
}

impl ScenarioResult {
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            outcome,
            started_at: String::new(),
            duration_ms: 0,
            steps: Vec::new(),
        }
    }

    /// `"group / name"`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{} / {}", self.group, self.name)
    }
}
