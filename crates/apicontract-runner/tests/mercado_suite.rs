//! Full-suite runs against the in-process fake

mod common;

use std::sync::Arc;
use std::time::Duration;

use apicontract_core::{
    Aggregator, ErrorKind, JsonReporter, Outcome, Reporter, RequestSpec, Scenario, SuiteReport,
    VerdictStatus,
};
use apicontract_runner::mercado::{self, GROUP_SEM_ALCOOL};
use apicontract_runner::{Faker, ScenarioRunner, SuiteRunner};
use common::{FakeMercado, config};
use serde_json::json;
use tokio::sync::watch;

fn suite() -> Vec<Scenario> {
    mercado::suite(&mut Faker::seeded(42))
}

async fn run_suite(fake: Arc<FakeMercado>, concurrency: usize) -> SuiteReport {
    let runner = ScenarioRunner::new(fake, &config());
    let aggregator = Arc::new(Aggregator::new());
    SuiteRunner::new(runner, concurrency)
        .run(suite(), aggregator.clone() as Arc<dyn Reporter>)
        .await;
    aggregator.finalize().unwrap()
}

fn failures(report: &SuiteReport) -> Vec<String> {
    report
        .problems()
        .map(|r| format!("{}: {:?}", r.id(), r.outcome))
        .collect()
}

#[tokio::test]
async fn full_suite_passes_against_contract() {
    let fake = Arc::new(FakeMercado::new());
    let report = run_suite(fake.clone(), 4).await;

    assert!(report.problems().next().is_none(), "{:#?}", failures(&report));
    assert_eq!(report.summary.total, 20);
    let verdict = report.verdict();
    assert_eq!(verdict.status, VerdictStatus::Pass);
    assert_eq!(verdict.exit_code, 0);
    assert!(fake.requests() > 20);
}

#[tokio::test]
async fn results_are_ordered_regardless_of_completion() {
    let report = run_suite(Arc::new(FakeMercado::new()), 8).await;
    let keys: Vec<_> = report
        .results
        .iter()
        .map(|r| (r.group.clone(), r.name.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[tokio::test]
async fn concurrency_does_not_change_outcomes() {
    let sequential_fake = Arc::new(FakeMercado::new().with_latency(Duration::from_millis(2)));
    let sequential = run_suite(sequential_fake.clone(), 1).await;

    let parallel_fake = Arc::new(FakeMercado::new().with_latency(Duration::from_millis(2)));
    let parallel = run_suite(parallel_fake.clone(), 8).await;

    assert_eq!(sequential.summary, parallel.summary);
    assert_eq!(sequential_fake.max_in_flight(), 1);
    assert!(parallel_fake.max_in_flight() <= 8);
    let outcomes = |r: &SuiteReport| -> Vec<String> {
        r.results
            .iter()
            .map(|s| format!("{} {}", s.id(), s.outcome.label()))
            .collect()
    };
    assert_eq!(outcomes(&sequential), outcomes(&parallel));
}

#[tokio::test]
async fn store_lifecycle_runs_every_step() {
    let fake = Arc::new(FakeMercado::new());
    let scenario = suite()
        .into_iter()
        .find(|s| s.name() == "Ciclo de vida do mercado")
        .unwrap();

    let result = ScenarioRunner::new(fake.clone(), &config())
        .run(&scenario)
        .await;

    assert!(result.outcome.is_pass(), "{:?}", result.outcome);
    let statuses: Vec<_> = result.steps.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![Some(201), Some(200), Some(200), Some(404)]);
    assert_eq!(fake.store_count(), 0);

    let put_body = result.steps[1].request.body.as_ref().unwrap();
    assert_eq!(put_body["nome"], result.steps[0].request.body.as_ref().unwrap()["nome"]);
}

#[tokio::test]
async fn loja_x_update_then_double_delete() {
    let fake = Arc::new(FakeMercado::new());
    let store = "/mercado/{{mercado.id}}";
    let scenario = Scenario::new(mercado::GROUP_MERCADO, "Loja X")
        .given(
            RequestSpec::post("/mercado")
                .json(json!({"nome": "Loja X", "cnpj": "12345678901234", "endereco": "01001-000"}))
                .expect_status(201)
                .expect_body_contains("sucesso")
                .expect_non_empty("novoMercado.id")
                .returns_at("mercado", "novoMercado"),
        )
        .given(
            RequestSpec::put(store)
                .json(json!({"nome": "Loja X", "cnpj": "12345678901234", "endereco": "02002-000"}))
                .expect_status(200)
                .expect_body_contains("sucesso")
                .expect_body_contains("02002-000"),
        )
        .given(RequestSpec::delete(store).expect_status(200))
        .when(RequestSpec::delete(store).expect_status(404));

    let result = ScenarioRunner::new(fake.clone(), &config())
        .run(&scenario)
        .await;

    assert!(result.outcome.is_pass(), "{:?}", result.outcome);
    let statuses: Vec<_> = result.steps.iter().map(|s| s.status).collect();
    assert_eq!(statuses, vec![Some(201), Some(200), Some(200), Some(404)]);
    let id = &result.steps[1].request.url;
    assert_eq!(&result.steps[3].request.url, id);
    assert!(!id.ends_with("/mercado/"));
    assert_eq!(fake.store_count(), 0);
}

#[tokio::test]
async fn scenarios_do_not_share_fixtures() {
    let fake = Arc::new(FakeMercado::new());
    let report = run_suite(fake.clone(), 4).await;

    let created: usize = report
        .results
        .iter()
        .flat_map(|r| &r.steps)
        .filter(|s| s.label == "setup[0] POST /mercado")
        .count();
    let needing_store = suite().iter().filter(|s| !s.setup().is_empty()).count();
    assert_eq!(created, needing_store);
}

#[tokio::test]
async fn semalcool_asymmetry_is_asserted() {
    let report = run_suite(Arc::new(FakeMercado::symmetric()), 4).await;

    let problems: Vec<_> = report.problems().collect();
    assert_eq!(problems.len(), 1, "{:#?}", failures(&report));
    assert_eq!(problems[0].group, GROUP_SEM_ALCOOL);
    assert_eq!(problems[0].name, "Obter bebidas sem álcool inexistentes");
    let Outcome::Fail { mismatch } = &problems[0].outcome else {
        panic!("expected assertion failure");
    };
    assert_eq!(mismatch.expected, "404");
    assert_eq!(mismatch.actual, "200");
    assert_eq!(report.verdict().exit_code, 1);
}

#[tokio::test]
async fn shutdown_before_start_cancels_everything() {
    let fake = Arc::new(FakeMercado::new());
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let runner = ScenarioRunner::new(fake.clone(), &config()).with_shutdown(rx);
    let aggregator = Arc::new(Aggregator::new());
    let recorded = SuiteRunner::new(runner, 4)
        .run(suite(), aggregator.clone() as Arc<dyn Reporter>)
        .await;

    assert_eq!(recorded, 20);
    assert_eq!(fake.requests(), 0);
    let report = aggregator.finalize().unwrap();
    assert!(report.results.iter().all(|r| matches!(
        &r.outcome,
        Outcome::Error { error } if error.kind() == ErrorKind::Cancelled
    )));
    assert_eq!(report.verdict().exit_code, 2);
}

#[tokio::test]
async fn filtered_run_only_executes_matches() {
    let fake = Arc::new(FakeMercado::new());
    let selected: Vec<_> = suite().into_iter().filter(|s| s.matches("inexistente")).collect();
    let expected = selected.len();

    let aggregator = Arc::new(Aggregator::new());
    SuiteRunner::new(ScenarioRunner::new(fake, &config()), 2)
        .run(selected, aggregator.clone() as Arc<dyn Reporter>)
        .await;

    let report = aggregator.finalize().unwrap();
    assert_eq!(report.summary.total, expected);
    assert!(report.results.iter().all(|r| r.name.contains("inexistente")));
}

#[tokio::test]
async fn json_reporter_persists_run() {
    let dir = tempfile::tempdir().unwrap();
    let reporter = Arc::new(JsonReporter::new(dir.path()));
    let runner = ScenarioRunner::new(Arc::new(FakeMercado::symmetric()), &config());

    SuiteRunner::new(runner, 4)
        .run(suite(), reporter.clone() as Arc<dyn Reporter>)
        .await;
    let report = reporter.finalize().unwrap();

    assert_eq!(report.summary.failed, 1);
    let lines = std::fs::read_to_string(dir.path().join("results.jsonl")).unwrap();
    assert_eq!(lines.lines().count(), 20);
    let http = std::fs::read_to_string(dir.path().join("reproductions.http")).unwrap();
    assert!(http.contains("Obter bebidas sem álcool inexistentes"));
    assert!(http.contains("POST http://mercado.fake/mercado"));
}
