//! Scenario descriptions and the per-scenario execution context

use crate::binding::Bindings;
use crate::outcome::{Phase, StepRecord};
use crate::request::RequestSpec;

/// One independent test case: zero or more setup calls, then exactly one act call.
///
/// ```
/// use apicontract_core::{RequestSpec, Scenario};
///
/// let scenario = Scenario::new("Mercado", "Obter mercado existente")
///     .given(
///         RequestSpec::post("/mercado")
///             .json(serde_json::json!({"nome": "Loja X"}))
///             .expect_status(201)
///             .returns_at("mercado", "novoMercado"),
///     )
///     .when(RequestSpec::get("/mercado/{{mercado.id}}").expect_status(200));
///
/// assert_eq!(scenario.setup().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    group: String,
    name: String,
    setup: Vec<RequestSpec>,
    act: RequestSpec,
}

/// Builder returned by [`Scenario::new`]; [`ScenarioBuilder::when`] finishes it.
#[derive(Debug, Clone)]
#[must_use = "a scenario needs an act step: call .when(...)"]
pub struct ScenarioBuilder {
    group: String,
    name: String,
    setup: Vec<RequestSpec>,
}

impl ScenarioBuilder {
    /// Append a setup (fixture) call.
    pub fn given(mut self, step: RequestSpec) -> Self {
        self.setup.push(step);
        self
    }

    /// Set the call under test and finish the scenario.
    #[must_use]
    pub fn when(self, act: RequestSpec) -> Scenario {
        Scenario {
            group: self.group,
            name: self.name,
            setup: self.setup,
            act,
        }
    }
}

impl Scenario {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            group: group.into(),
            name: name.into(),
            setup: Vec::new(),
        }
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn setup(&self) -> &[RequestSpec] {
        &self.setup
    }

    #[must_use]
    pub fn act(&self) -> &RequestSpec {
        &self.act
    }

    /// `"group / name"`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{} / {}", self.group, self.name)
    }

    /// All steps in execution order, tagged with their phase and label.
    pub fn steps(&self) -> impl Iterator<Item = (Phase, String, &RequestSpec)> {
        self.setup
            .iter()
            .enumerate()
            .map(|(i, step)| (Phase::Setup, step_label(Phase::Setup, i, step), step))
            .chain(std::iter::once((
                Phase::Act,
                step_label(Phase::Act, 0, &self.act),
                &self.act,
            )))
    }

    /// Case-insensitive substring match on `"group / name"`.
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        self.id().to_lowercase().contains(&filter.to_lowercase())
    }
}

/// `"setup[1] POST /mercado"` or `"act GET /mercado/{{mercado.id}}"`
#[must_use]
pub fn step_label(phase: Phase, index: usize, step: &RequestSpec) -> String {
    match phase {
        Phase::Setup => format!("setup[{index}] {}", step.label()),
        Phase::Act => format!("act {}", step.label()),
    }
}

/// State owned by one scenario run: its bindings and the steps executed so far.
///
/// Created fresh for every run and dropped with it, so nothing leaks
/// between scenarios.
#[derive(Debug, Default)]
pub struct ScenarioContext {
    bindings: Bindings,
    steps: Vec<StepRecord>,
}

impl ScenarioContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }

    pub fn record(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    #[must_use]
    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }
}
