//! # Runner — Motor de Execução do TestPilot
//!
//! Ponto de entrada do Runner: o componente em Rust que dirige uma execução
//! de testes, seja o modo legado (um plano HTTP UTDL já pronto) ou o modo
//! autônomo (explora um alvo ao vivo, gera os cenários e executa tudo de
//! ponta a ponta).
//!
//! ## Subcomandos
//!
//! - `execute`: modo legado, mantém o comportamento original do Runner —
//!   carrega um plano UTDL em JSON, valida e executa seus steps HTTP.
//! - `run`: modo novo — recebe uma URL alvo (e credenciais opcionais),
//!   explora o site, gera cenários de teste e os executa via browser,
//!   persistindo tudo na árvore de artefatos.

mod artifacts;
mod config;
mod context;
mod driver;
mod errors;
mod executor;
mod executors;
mod explorer;
mod extractors;
mod limits;
mod llm;
mod loader;
mod orchestrator;
mod planner;
mod protocol;
mod report;
mod retry;
mod store;
mod telemetry;
mod validation;

use context::Context;
use executors::{http::HttpExecutor, wait::WaitExecutor, StepExecutor};
use limits::ExecutionLimits;
use protocol::http_legacy::{HttpExecutionReport, HttpStep, HttpStepStatus};
use telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, Level};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "testpilot")]
#[command(about = "Autonomous black-box web testing runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs a legacy UTDL HTTP plan sequentially.
    Execute {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "false")]
        otel: bool,
        #[arg(long)]
        otel_endpoint: Option<String>,
        #[arg(long, short = 's', default_value = "false")]
        silent: bool,
        #[arg(long, short = 'v', default_value = "false")]
        verbose: bool,
        #[arg(long)]
        execution_id: Option<String>,
    },

    /// Explores a live target, generates test scenarios, and executes them
    /// end to end.
    Run {
        /// Target URL to explore and test.
        #[arg(short, long)]
        url: String,
        /// Username for scenarios that require authentication.
        #[arg(long)]
        username: Option<String>,
        /// Password for scenarios that require authentication.
        #[arg(long)]
        password: Option<String>,
        /// Directory under which this run's artifact tree is written.
        #[arg(long, default_value = "./testpilot_runs")]
        scratch_dir: PathBuf,
        #[arg(long, default_value = "false")]
        silent: bool,
        #[arg(long, short = 'v', default_value = "false")]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Execute { file, output, otel, otel_endpoint, silent, verbose, execution_id } => {
            let exec_id = execution_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            let telemetry_config = build_telemetry_config(*otel, otel_endpoint.clone(), *silent, *verbose);
            init_telemetry_or_fallback(telemetry_config, *silent);

            execute_plan(file, output, &exec_id, *silent).await;

            shutdown_telemetry();
        }

        Commands::Run { url, username, password, scratch_dir, silent, verbose } => {
            let telemetry_config = build_telemetry_config(false, None, *silent, *verbose);
            init_telemetry_or_fallback(telemetry_config, *silent);

            run_autonomous(url, username.clone(), password.clone(), scratch_dir, *silent).await;

            shutdown_telemetry();
        }
    }
}

fn build_telemetry_config(otel: bool, otel_endpoint: Option<String>, silent: bool, verbose: bool) -> TelemetryConfig {
    let mut telemetry_config = TelemetryConfig::from_env();
    telemetry_config.log_level = if silent {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    if otel {
        if let Some(endpoint) = otel_endpoint {
            telemetry_config.otlp_endpoint = Some(endpoint);
        } else if telemetry_config.otlp_endpoint.is_none() {
            telemetry_config.otlp_endpoint = Some("http://localhost:4317".to_string());
        }
    }
    telemetry_config
}

fn init_telemetry_or_fallback(config: TelemetryConfig, silent: bool) {
    if let Err(e) = init_telemetry(config) {
        if !silent {
            eprintln!("Warning: Failed to initialize telemetry: {}", e);
        }
        let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init();
    }
}

// ============================================================================
// MODO NOVO: `run` — exploração autônoma de ponta a ponta
// ============================================================================

async fn run_autonomous(url: &str, username: Option<String>, password: Option<String>, scratch_dir: &PathBuf, silent: bool) {
    let runner_config = config::RunnerConfig::from_env();
    let credentials = if username.is_some() || password.is_some() { Some(protocol::Credentials { username, password }) } else { None };

    let run = protocol::Run::new(
        protocol::Target::Url(url.to_string()),
        credentials,
        protocol::RunMetadata::default(),
        scratch_dir,
        runner_config.max_retries,
    );
    let run_id = run.run_id.clone();

    if !silent {
        info!(run_id = %run_id, target = %url, "Starting autonomous run");
    }

    let store = store::RunStore::new(scratch_dir.join("_store"));
    let orchestrator = orchestrator::Orchestrator::new(store, runner_config);

    match orchestrator.execute_run(run).await {
        Ok(finished) => {
            if !silent {
                info!(run_id = %finished.run_id, status = ?finished.status, "Run finished");
                if let Some(report_path) = &finished.report_path {
                    println!("Report written to: {}", report_path.display());
                }
            }
            if finished.status != protocol::RunStatus::Completed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!(error = %e, "Run failed before completion");
            std::process::exit(1);
        }
    }
}

// ============================================================================
// MODO LEGADO: `execute` — plano UTDL HTTP já pronto
// ============================================================================

async fn execute_plan(file_path: &PathBuf, output_path: &Option<PathBuf>, execution_id: &str, silent: bool) {
    if !silent {
        info!(execution_id = %execution_id, "Runner initializing");
    }
    let start_time = Utc::now();

    let plan = match loader::load_http_plan_from_file(file_path) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to load plan");
            std::process::exit(1);
        }
    };
    if !silent {
        info!(plan_id = %plan.meta.id, plan_name = %plan.meta.name, "Plan loaded");
    }

    if let Err(errors) = validation::validate_plan(&plan) {
        error!("Plan validation failed with {} error(s):", errors.len());
        for err in &errors {
            error!("  - {}", err);
        }
        std::process::exit(1);
    }
    if !silent {
        info!("Plan validation passed");
    }

    let limits = ExecutionLimits::from_env();
    let total_retries: u32 = plan.steps.iter().map(|s| s.recovery_policy.as_ref().map(|p| p.max_attempts).unwrap_or(1)).sum();
    let limit_result = limits::validate_limits(plan.steps.len(), total_retries, &limits);
    if !limit_result.passed {
        error!("Plan exceeds execution limits:");
        for v in &limit_result.violations {
            error!("  - {}", v.message);
        }
        std::process::exit(1);
    }

    let mut context = Context::new();
    context.set("base_url", serde_json::Value::String(plan.config.base_url.clone()));
    context.set("execution_id", serde_json::Value::String(execution_id.to_string()));
    context.extend(&plan.config.variables);

    let http_executor = HttpExecutor::new();
    let wait_executor = WaitExecutor::new();
    let executors: Vec<Box<dyn StepExecutor + Send + Sync>> = vec![Box::new(http_executor), Box::new(wait_executor)];

    if !silent {
        info!("Starting execution");
    }

    let step_results = execute_sequential(plan.steps, executors, context).await;

    let all_passed = step_results.iter().all(|r| r.status == HttpStepStatus::Passed);

    let end_time = Utc::now();
    if !silent {
        info!("Execution finished");
    }

    let report = HttpExecutionReport {
        execution_id: execution_id.to_string(),
        plan_id: plan.meta.id.clone(),
        status: if all_passed { "passed".to_string() } else { "failed".to_string() },
        start_time: start_time.to_rfc3339(),
        end_time: end_time.to_rfc3339(),
        steps: step_results,
    };

    if let Some(path) = output_path {
        let json = serde_json::to_string_pretty(&report).expect("Failed to serialize report");
        if let Err(e) = fs::write(path, json) {
            eprintln!("Failed to write report: {}", e);
        } else if !silent {
            println!("Report saved to: {:?}", path);
        }
    } else if !silent {
        let json = serde_json::to_string_pretty(&report).expect("Failed to serialize report");
        println!("\n--- Execution Report ---\n{}", json);
    }

    if !all_passed {
        std::process::exit(1);
    }
}

async fn execute_sequential(
    steps: Vec<HttpStep>,
    executors: Vec<Box<dyn StepExecutor + Send + Sync>>,
    mut context: Context,
) -> Vec<protocol::http_legacy::HttpStepResult> {
    let mut step_results = Vec::new();

    for step in steps {
        info!(step_id = %step.id, action = %step.action, "Running step");

        let executor = executors.iter().find(|e| e.can_handle(&step.action));

        let result = match executor {
            Some(exec) => execute_step_with_retry(&step, exec.as_ref(), &mut context).await,
            None => {
                error!(step_id = %step.id, action = %step.action, "No executor found for action");
                let context_snapshot = context.variables.clone();
                protocol::http_legacy::HttpStepResult {
                    step_id: step.id.clone(),
                    status: HttpStepStatus::Failed,
                    duration_ms: 0,
                    error: Some(format!("Unknown action: {}", step.action)),
                    context_before: Some(context_snapshot.clone()),
                    context_after: Some(context_snapshot),
                    extractions: None,
                    attempt: 1,
                    http_details: None,
                }
            }
        };

        info!(step_id = %step.id, status = ?result.status, duration_ms = result.duration_ms, "Step finished");
        step_results.push(result);
    }

    step_results
}

async fn execute_step_with_retry(step: &HttpStep, executor: &dyn StepExecutor, context: &mut Context) -> protocol::http_legacy::HttpStepResult {
    let max_attempts = step.recovery_policy.as_ref().map(|p| p.max_attempts).unwrap_or(1);
    let strategy = step.recovery_policy.as_ref().map(|p| p.strategy.as_str()).unwrap_or("fail_fast");
    let backoff_ms = step.recovery_policy.as_ref().map(|p| p.backoff_ms).unwrap_or(0);
    let backoff_factor = step.recovery_policy.as_ref().map(|p| p.backoff_factor).unwrap_or(2.0);

    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let context_before = context.variables.clone();

        match executor.execute(step, context).await {
            Ok(result) => {
                if result.status == HttpStepStatus::Passed {
                    return result;
                }

                if strategy == "ignore" {
                    return protocol::http_legacy::HttpStepResult {
                        step_id: step.id.clone(),
                        status: HttpStepStatus::Passed,
                        duration_ms: result.duration_ms,
                        error: None,
                        context_before: result.context_before,
                        context_after: result.context_after,
                        extractions: result.extractions,
                        attempt,
                        http_details: result.http_details,
                    };
                }

                if strategy != "retry" || attempt >= max_attempts {
                    return result;
                }
            }
            Err(e) => {
                error!(step_id = %step.id, error = %e, attempt = attempt, "Step execution failed");
                let context_after = context.variables.clone();

                if strategy == "ignore" {
                    return protocol::http_legacy::HttpStepResult {
                        step_id: step.id.clone(),
                        status: HttpStepStatus::Passed,
                        duration_ms: 0,
                        error: None,
                        context_before: Some(context_before),
                        context_after: Some(context_after),
                        extractions: None,
                        attempt,
                        http_details: None,
                    };
                }

                if strategy != "retry" || attempt >= max_attempts {
                    return protocol::http_legacy::HttpStepResult {
                        step_id: step.id.clone(),
                        status: HttpStepStatus::Failed,
                        duration_ms: 0,
                        error: Some(e.to_string()),
                        context_before: Some(context_before),
                        context_after: Some(context_after),
                        extractions: None,
                        attempt,
                        http_details: None,
                    };
                }
            }
        }

        let backoff = (backoff_ms as f64 * backoff_factor.powi(attempt as i32 - 1)) as u64;
        info!(step_id = %step.id, attempt = attempt, max_attempts = max_attempts, backoff_ms = backoff, "Retrying after backoff");
        tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
    }
}
