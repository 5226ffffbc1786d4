//! apicontract-core: scenario model, evaluation and reporting for API contract tests
//!
//! This crate has no I/O beyond writing report files. It describes HTTP calls
//! ([`RequestSpec`]), what their responses must satisfy ([`Expectation`]),
//! how values flow between calls ([`Bindings`]), and how results are
//! aggregated into a verdict ([`SuiteReport`]).

pub mod binding;
pub mod config;
pub mod expect;
pub mod generator;
pub mod outcome;
pub mod plan;
pub mod report;
pub mod request;
pub mod response;
pub mod scenario;
pub mod schema;
pub mod template;
pub mod verdict;

pub use binding::{BindingError, Bindings};
pub use config::{Config, ConfigError};
pub use expect::{Expectation, Mismatch, evaluate};
pub use generator::to_http_file;
pub use outcome::{ErrorKind, Outcome, Phase, ScenarioError, ScenarioResult, StepRecord};
pub use plan::SuitePlan;
pub use report::{Aggregator, JsonReporter, ReportError, ReportMeta, Reporter, SuiteReport};
pub use request::{Capture, Method, RequestSpec, ResolvedRequest};
pub use response::Response;
pub use scenario::{Scenario, ScenarioBuilder, ScenarioContext};
pub use verdict::{Summary, Verdict, VerdictStatus};
