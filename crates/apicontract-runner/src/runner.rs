//! Scenario execution
//!
//! A scenario is driven step by step: check shutdown, resolve templates
//! against the scenario's own bindings, send with a timeout, evaluate, then
//! capture. Setup mismatches end the scenario in `Error`; act mismatches in
//! `Fail`. Nothing escapes a scenario: every path ends in a
//! [`ScenarioResult`].

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;

use apicontract_core::{
    Config, Expectation, Outcome, Phase, Reporter, ResolvedRequest, Response, Scenario,
    ScenarioContext, ScenarioError, ScenarioResult, StepRecord, evaluate,
};

use crate::transport::{Transport, TransportError};

/// Runs a single scenario against a [`Transport`].
#[derive(Clone)]
pub struct ScenarioRunner {
    transport: Arc<dyn Transport>,
    base_url: String,
    headers: HashMap<String, String>,
    timeout: Duration,
    shutdown: Option<watch::Receiver<bool>>,
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            headers: config.headers.clone(),
            timeout: config.timeout(),
            shutdown: None,
        }
    }

    /// Stop before the next step once `shutdown` reads `true`.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one scenario to a terminal outcome.
    #[tracing::instrument(skip_all, fields(group = scenario.group(), scenario = scenario.name()))]
    pub async fn run(&self, scenario: &Scenario) -> ScenarioResult {
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        let mut ctx = ScenarioContext::new();

        let outcome = match self.drive(scenario, &mut ctx).await {
            Ok(outcome) => outcome,
            Err(error) => Outcome::Error { error },
        };

        match &outcome {
            Outcome::Pass => tracing::debug!("pass"),
            Outcome::Fail { mismatch } => tracing::warn!(%mismatch, "fail"),
            Outcome::Error { error } => tracing::warn!(kind = %error.kind(), %error, "error"),
        }

        let mut result = ScenarioResult::new(scenario.group(), scenario.name(), outcome);
        result.started_at = started_at;
        result.duration_ms = millis(start.elapsed());
        result.steps = ctx.into_steps();
        result
    }

    async fn drive(
        &self,
        scenario: &Scenario,
        ctx: &mut ScenarioContext,
    ) -> Result<Outcome, ScenarioError> {
        for (phase, label, step) in scenario.steps() {
            if self.is_shutting_down() {
                return Err(ScenarioError::Cancelled { step: label });
            }

            let request = step
                .resolve(&self.base_url, &self.headers, ctx.bindings())
                .map_err(|e| ScenarioError::from_binding(&label, e))?;
            let expectations = step
                .expectations()
                .iter()
                .map(|e| e.resolve(ctx.bindings()))
                .collect::<Result<Vec<Expectation>, _>>()
                .map_err(|e| ScenarioError::from_binding(&label, e))?;

            let response = self.execute(phase, &label, request, ctx).await?;

            if let Some(mismatch) = evaluate(&response, &expectations).into_iter().next() {
                return match phase {
                    Phase::Setup => Err(ScenarioError::SetupFailed {
                        step: label,
                        mismatch,
                    }),
                    Phase::Act => Ok(Outcome::Fail { mismatch }),
                };
            }

            if let Some(capture) = step.capture() {
                ctx.bindings_mut()
                    .capture(&capture.name, &response, capture.path.as_deref())
                    .map_err(|e| ScenarioError::from_binding(&label, e))?;
                tracing::debug!(step = %label, binding = %capture.name, "captured");
            }
        }

        Ok(Outcome::Pass)
    }

    /// Send one request under the timeout and record it in `ctx`.
    async fn execute(
        &self,
        phase: Phase,
        label: &str,
        request: ResolvedRequest,
        ctx: &mut ScenarioContext,
    ) -> Result<Response, ScenarioError> {
        tracing::debug!(step = %label, url = %request.url, "sending");
        let start = Instant::now();
        let sent = tokio::time::timeout(self.timeout, self.transport.send(&request)).await;
        let elapsed_ms = millis(start.elapsed());

        let status = match &sent {
            Ok(Ok(response)) => Some(response.status),
            _ => None,
        };
        ctx.record(StepRecord {
            phase,
            label: label.to_string(),
            request,
            status,
            elapsed_ms,
        });

        match sent {
            Ok(Ok(response)) => {
                tracing::debug!(step = %label, status = response.status, elapsed_ms, "received");
                Ok(response)
            }
            Err(_) | Ok(Err(TransportError::Timeout)) => Err(ScenarioError::Timeout {
                step: label.to_string(),
                timeout_ms: millis(self.timeout),
            }),
            Ok(Err(e)) => Err(ScenarioError::Transport {
                step: label.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Runs many scenarios concurrently, bounded by a semaphore.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    runner: Arc<ScenarioRunner>,
    concurrency: usize,
}

impl SuiteRunner {
    /// `concurrency` of 1 runs scenarios one at a time; 0 is treated as 1.
    #[must_use]
    pub fn new(runner: ScenarioRunner, concurrency: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            concurrency: concurrency.max(1),
        }
    }

    /// Run every scenario and record each result with `reporter`.
    ///
    /// Returns the number of results recorded. Scenarios still queued when
    /// shutdown is signalled are recorded as cancelled without sending
    /// anything.
    pub async fn run(&self, scenarios: Vec<Scenario>, reporter: Arc<dyn Reporter>) -> usize {
        let total = scenarios.len();
        tracing::info!(total, concurrency = self.concurrency, "running suite");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();

        for scenario in scenarios {
            let runner = Arc::clone(&self.runner);
            let semaphore = Arc::clone(&semaphore);
            let reporter = Arc::clone(&reporter);
            set.spawn(async move {
                // The semaphore is never closed, so a permit always arrives.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = AssertUnwindSafe(runner.run(&scenario))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| panicked(&scenario, payload.as_ref()));
                reporter.record(result);
            });
        }

        let mut recorded = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(()) => recorded += 1,
                Err(e) => tracing::error!(error = %e, "scenario task failed"),
            }
        }
        tracing::info!(recorded, "suite finished");
        recorded
    }
}

fn panicked(scenario: &Scenario, payload: &(dyn std::any::Any + Send)) -> ScenarioResult {
    let message = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    tracing::error!(scenario = %scenario.id(), %message, "scenario panicked");
    let mut result = ScenarioResult::new(
        scenario.group(),
        scenario.name(),
        Outcome::Error {
            error: ScenarioError::Panicked { message },
        },
    );
    result.started_at = chrono::Utc::now().to_rfc3339();
    result
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
