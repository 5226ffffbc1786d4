//! Suite verdict - pass/fail judgement and exit code

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::outcome::ScenarioResult;

/// Outcome counts for a suite run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl Summary {
    #[must_use]
    pub fn from_results(results: &[ScenarioResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            if r.outcome.is_pass() {
                acc.passed += 1;
            } else if r.outcome.is_fail() {
                acc.failed += 1;
            } else {
                acc.errored += 1;
            }
            acc
        })
    }

    /// Judge the run.
    ///
    /// Exit codes: 0 all passed, 1 assertion failures only, 2 any scenario
    /// errored, 3 nothing ran.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.total == 0 {
            return Verdict {
                status: VerdictStatus::Fail,
                exit_code: 3,
                reason: "No scenarios were run".to_string(),
            };
        }
        if self.passed == self.total {
            return Verdict {
                status: VerdictStatus::Pass,
                exit_code: 0,
                reason: format!("All {} scenarios passed", self.total),
            };
        }

        let mut parts = Vec::new();
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.errored > 0 {
            parts.push(format!("{} errored", self.errored));
        }
        Verdict {
            status: VerdictStatus::Fail,
            exit_code: if self.errored > 0 { 2 } else { 1 },
            reason: format!("{} of {} scenarios", parts.join(", "), self.total),
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
