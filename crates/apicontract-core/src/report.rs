//! Suite aggregation and report files
//!
//! Results arrive in completion order from concurrently running scenarios.
//! [`Reporter::record`] is safe under concurrent calls; the final
//! [`SuiteReport`] is sorted by `(group, name)`.
//!
//! ```text
//! <report_dir>/
//! ├── summary.json        verdict, counts, run metadata
//! ├── results.jsonl       one ScenarioResult per line (secrets masked)
//! └── reproductions.http  only when something failed
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generator::to_http_file;
use crate::outcome::ScenarioResult;
use crate::verdict::{Summary, Verdict};

/// Headers that should be masked in reports for security.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
const MASK: &str = "***";

/// Sink for scenario results.
pub trait Reporter: Send + Sync {
    /// Accept one finished scenario. Called from many tasks at once.
    fn record(&self, result: ScenarioResult);

    /// Produce the ordered report once every scenario has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the report cannot be persisted.
    fn finalize(&self) -> Result<SuiteReport, ReportError>;
}

/// Ordered results of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub summary: Summary,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    /// Build a report, sorting `results` by `(group, name)`.
    #[must_use]
    pub fn new(mut results: Vec<ScenarioResult>) -> Self {
        results.sort_by(|a, b| (&a.group, &a.name).cmp(&(&b.group, &b.name)));
        Self {
            summary: Summary::from_results(&results),
            results,
        }
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        self.summary.verdict()
    }

    /// Results that did not pass, in report order.
    pub fn problems(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.outcome.is_pass())
    }
}

/// In-memory, append-only collector.
#[derive(Debug, Default)]
pub struct Aggregator {
    results: Mutex<Vec<ScenarioResult>>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn snapshot(&self) -> SuiteReport {
        let results = self
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        SuiteReport::new(results)
    }
}

impl Reporter for Aggregator {
    fn record(&self, result: ScenarioResult) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    fn finalize(&self) -> Result<SuiteReport, ReportError> {
        Ok(self.snapshot())
    }
}

/// Run metadata written into `summary.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportMeta {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// RFC 3339
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub duration_ms: u64,
}

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryFile {
    pub verdict: Verdict,
    pub summary: Summary,
    pub meta: ReportMeta,
}

/// Collects like [`Aggregator`] and writes the report files on finalize.
#[derive(Debug)]
pub struct JsonReporter {
    inner: Aggregator,
    dir: PathBuf,
    meta: Mutex<ReportMeta>,
}

impl JsonReporter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Aggregator::new(),
            dir: dir.into(),
            meta: Mutex::new(ReportMeta::default()),
        }
    }

    #[must_use]
    pub fn with_meta(self, meta: ReportMeta) -> Self {
        *self.meta.lock().unwrap_or_else(PoisonError::into_inner) = meta;
        self
    }

    /// Update run duration once the suite is done.
    pub fn set_duration_ms(&self, duration_ms: u64) {
        self.meta
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .duration_ms = duration_ms;
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Reporter for JsonReporter {
    fn record(&self, result: ScenarioResult) {
        self.inner.record(result);
    }

    fn finalize(&self) -> Result<SuiteReport, ReportError> {
        let report = self.inner.snapshot();
        let meta = self
            .meta
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        write_report(&report, &meta, &self.dir)?;
        Ok(report)
    }
}

/// Write `summary.json`, `results.jsonl` and (if needed) `reproductions.http` into `dir`.
///
/// # Errors
///
/// Returns error if the directory cannot be created or files cannot be written.
pub fn write_report(report: &SuiteReport, meta: &ReportMeta, dir: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ReportError::Io(format!("create {}: {e}", dir.display())))?;

    let masked: Vec<ScenarioResult> = report.results.iter().map(mask_result).collect();

    let results_path = dir.join("results.jsonl");
    let file = std::fs::File::create(&results_path)
        .map_err(|e| ReportError::Io(format!("create {}: {e}", results_path.display())))?;
    let mut writer = std::io::BufWriter::new(file);
    for result in &masked {
        let line =
            serde_json::to_string(result).map_err(|e| ReportError::Serialize(e.to_string()))?;
        writeln!(writer, "{line}")
            .map_err(|e| ReportError::Io(format!("write {}: {e}", results_path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| ReportError::Io(format!("flush {}: {e}", results_path.display())))?;

    let summary = SummaryFile {
        verdict: report.verdict(),
        summary: report.summary,
        meta: meta.clone(),
    };
    let summary_path = dir.join("summary.json");
    let json =
        serde_json::to_string_pretty(&summary).map_err(|e| ReportError::Serialize(e.to_string()))?;
    std::fs::write(&summary_path, json)
        .map_err(|e| ReportError::Io(format!("write {}: {e}", summary_path.display())))?;

    if report.problems().next().is_some() {
        let http_path = dir.join("reproductions.http");
        std::fs::write(&http_path, to_http_file(&masked, "base_url"))
            .map_err(|e| ReportError::Io(format!("write {}: {e}", http_path.display())))?;
    }

    Ok(())
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

/// Replace the values of sensitive headers with `***`.
pub fn mask_headers<'a>(headers: impl IntoIterator<Item = (&'a String, &'a mut String)>) {
    for (key, value) in headers {
        if is_sensitive_header(key) {
            *value = MASK.to_string();
        }
    }
}

/// Mask sensitive request headers in every step of a result.
fn mask_result(result: &ScenarioResult) -> ScenarioResult {
    let mut masked = result.clone();
    for step in &mut masked.steps {
        mask_headers(&mut step.request.headers);
    }
    masked
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}
