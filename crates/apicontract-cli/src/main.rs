//! apicontract CLI - contract tests for the mercado REST API

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;

use apicontract_core::{
    Aggregator, Config, JsonReporter, ReportMeta, Reporter, Scenario, SuitePlan, SuiteReport,
    Verdict, VerdictStatus,
};
use apicontract_runner::datagen::fresh_seed;
use apicontract_runner::{Faker, HttpTransport, ScenarioRunner, SuiteRunner, mercado};

#[derive(Parser)]
#[command(name = "apicontract")]
#[command(about = "Contract tests for REST APIs, with chained fixture scenarios")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the contract suite
    Run {
        /// Config file (default: .apicontract.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Server under test (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Scenarios in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Seed for generated fixture data
        #[arg(long)]
        seed: Option<u64>,

        /// Only run scenarios whose "group / name" contains this (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Report directory base (default: ~/.apicontract/reports)
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Do not write report files
        #[arg(long)]
        no_report: bool,

        /// Show execution plan without sending requests
        #[arg(long)]
        dry_run: bool,
    },

    /// List scenarios in the suite
    List {
        /// Only list scenarios matching this filter
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(3)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "apicontract={level},apicontract_runner={level},apicontract_core={level},reqwest=warn"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            base_url,
            timeout,
            concurrency,
            seed,
            filter,
            report_dir,
            no_report,
            dry_run,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(&path)?,
                None => Config::load_default()?,
            };
            if let Some(url) = base_url {
                cfg.base_url = url;
            }
            if let Some(secs) = timeout {
                cfg.timeout_secs = secs;
            }
            if let Some(n) = concurrency {
                cfg.concurrency = n;
            }
            if seed.is_some() {
                cfg.seed = seed;
            }
            if report_dir.is_some() {
                cfg.report_dir = report_dir;
            }
            cfg.validate()?;

            let seed = *cfg.seed.get_or_insert_with(fresh_seed);
            let scenarios = select(mercado::suite(&mut Faker::seeded(seed)), filter.as_deref());

            if dry_run {
                let plan = SuitePlan::from_scenarios(&scenarios, &cfg);
                match cli.output {
                    OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Silent => {}
                }
                return Ok(i32::from(plan.has_errors()));
            }

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url:    {}", cfg.base_url);
                eprintln!("  timeout:     {}s", cfg.timeout_secs);
                eprintln!("  concurrency: {}", cfg.concurrency);
                eprintln!("  seed:        {seed}");
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:     {} configured", cfg.headers.len());
                }
                eprintln!("  scenarios:   {}", scenarios.len());
                eprintln!();
            }

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::warn!("received Ctrl+C, finishing in-flight requests");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(err) => tracing::error!(error = %err, "cannot listen for Ctrl+C"),
                }
            });

            let json_reporter = if no_report {
                None
            } else {
                let dir = storage::report_dir(&cfg)?;
                storage::save_config(&cfg, &dir)
                    .with_context(|| format!("cannot write report to {}", dir.display()))?;
                Some(Arc::new(JsonReporter::new(dir).with_meta(ReportMeta {
                    base_url: cfg.base_url.clone(),
                    seed: Some(seed),
                    started_at: chrono::Utc::now().to_rfc3339(),
                    duration_ms: 0,
                })))
            };
            let reporter: Arc<dyn Reporter> = match &json_reporter {
                Some(r) => Arc::clone(r) as Arc<dyn Reporter>,
                None => Arc::new(Aggregator::new()),
            };

            let transport = HttpTransport::from_config(&cfg)?;
            let runner = ScenarioRunner::new(Arc::new(transport), &cfg).with_shutdown(shutdown_rx);

            let start = Instant::now();
            SuiteRunner::new(runner, cfg.concurrency)
                .run(scenarios, Arc::clone(&reporter))
                .await;
            if let Some(r) = &json_reporter {
                r.set_duration_ms(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
            }

            let report = reporter.finalize()?;
            let verdict = report.verdict();

            match cli.output {
                OutputFormat::Terminal => {
                    print_terminal(&report, &verdict);
                    if let Some(r) = &json_reporter {
                        eprintln!("Report saved: {}", r.dir().display());
                    }
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": verdict,
                        "summary": report.summary,
                        "seed": seed,
                        "results": report.results,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(verdict.exit_code)
        }

        Commands::List { filter } => {
            let scenarios = select(mercado::suite(&mut Faker::seeded(0)), filter.as_deref());
            match cli.output {
                OutputFormat::Terminal => print!("{}", list_terminal(&scenarios)),
                OutputFormat::Json => {
                    let names: Vec<_> = scenarios
                        .iter()
                        .map(|s| {
                            serde_json::json!({
                                "group": s.group(),
                                "name": s.name(),
                                "steps": s.steps().count(),
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&names)?);
                }
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = Path::new(".apicontract.toml");
            if config_path.exists() {
                eprintln!("{} already exists", config_path.display());
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {}", config_path.display());
            println!("\nEdit the file to configure:");
            println!("  - base_url: server to test");
            println!("  - timeout_secs / concurrency: runner limits");
            println!("  - headers: auth tokens, API keys");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", apicontract_core::schema::generate_schema()?);
            Ok(0)
        }
    }
}

fn select(scenarios: Vec<Scenario>, filter: Option<&str>) -> Vec<Scenario> {
    match filter {
        Some(f) => scenarios.into_iter().filter(|s| s.matches(f)).collect(),
        None => scenarios,
    }
}

fn list_terminal(scenarios: &[Scenario]) -> String {
    let mut out = String::new();
    let mut group = None;
    for s in scenarios {
        if group != Some(s.group()) {
            out.push_str(s.group());
            out.push_str(":\n");
            group = Some(s.group());
        }
        out.push_str("  ");
        out.push_str(s.name());
        out.push('\n');
    }
    out
}

fn print_terminal(report: &SuiteReport, verdict: &Verdict) {
    let mut group = None;
    for result in &report.results {
        if group != Some(result.group.as_str()) {
            println!("\n{}", result.group);
            group = Some(result.group.as_str());
        }
        println!(
            "  {:<5} {} ({}ms)",
            result.outcome.label(),
            result.name,
            result.duration_ms
        );
        if let Some(reason) = result.outcome.reason() {
            println!("        {reason}");
        }
    }

    let icon = if verdict.status == VerdictStatus::Pass {
        "PASS"
    } else {
        "FAIL"
    };
    println!("\n{icon}: {}", verdict.reason);
    println!(
        "  Scenarios: {} total, {} passed, {} failed, {} errored",
        report.summary.total, report.summary.passed, report.summary.failed, report.summary.errored
    );
    println!("  Exit code: {}", verdict.exit_code);
}
