//! Top-level run pipeline: bootstrap → explore → summarize → plan (parallel,
//! joined) → execute (retry loop) → report → finalize.
//!
//! Generalizes the legacy `main.rs::execute_plan` flow (load → validate →
//! execute → report) from "one flat HTTP plan" to "one end-to-end run
//! against a live target", with the branch-and-join portion driven by
//! `orchestrator::graph::StageGraph` and the remainder a plain sequence.

pub mod graph;

use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::config::RunnerConfig;
use crate::driver::FantocciniDriver;
use crate::errors::{ErrorCode, ErrorContext, StructuredError};
use crate::explorer;
use crate::limits::RetryCounter;
use crate::llm;
use crate::planner::{self, PlanKind};
use crate::protocol::{AppMap, Credentials, Plan, Progress, ProgressStatus, Run, RunStatus, ScenarioStatus};
use crate::report;
use crate::store::RunStore;
use graph::StageGraph;

/// Drives one `Run` to completion, persisting `Run`/`Plan`/`Progress`
/// snapshots to `store` and artifacts (app map, plans, report) to
/// `artifacts` as it goes, so a crash mid-run leaves an inspectable,
/// resumable trail rather than silently losing everything.
pub struct Orchestrator {
    store: RunStore,
    config: RunnerConfig,
}

impl Orchestrator {
    pub fn new(store: RunStore, config: RunnerConfig) -> Self {
        Self { store, config }
    }

    pub async fn execute_run(&self, mut run: Run) -> anyhow::Result<Run> {
        let artifacts = ArtifactStore::new(run.project_path.parent().unwrap_or(&run.project_path), &run.run_id);
        self.bootstrap(&mut run, &artifacts).await?;

        let base_url = match run.target.as_url() {
            Some(u) => u.to_string(),
            None => {
                run.status = RunStatus::Failed;
                run.error_log.push("local-path targets are not crawlable by this runner".to_string());
                self.store.put_run(run.clone()).await?;
                return Ok(run);
            }
        };

        let app_map = match self.explore_stage(&base_url).await {
            Ok(map) => map,
            Err(err) => return Ok(self.fail_run(run, err).await?),
        };
        self.persist_json(&artifacts.code_summary_json(), &app_map)?;
        run.steps_completed.push("analyze".to_string());

        let prd = llm::summarize(&app_map).await;
        self.persist_json(&artifacts.standard_prd_json(), &prd)?;
        run.steps_completed.push("prd".to_string());

        let plan = match self.plan_stage(&app_map, run.credentials.as_ref(), &artifacts).await {
            Ok(plan) => plan,
            Err(err) => return Ok(self.fail_run(run, err).await?),
        };
        self.store.put_plan(&run.run_id, plan.clone()).await?;
        run.steps_completed.push("join_plans".to_string());

        let mut progress = Progress::new(plan.total_scenarios);
        progress.status = ProgressStatus::Running;

        self.execute_stage(&run, &plan, &mut progress, &artifacts).await;
        self.persist_json(&artifacts.execution_progress_json(), &progress)?;
        run.steps_completed.push("execute".to_string());

        let tally = report::Tally::from_progress(&progress);
        progress.status = if tally.all_passed() { ProgressStatus::Completed } else { ProgressStatus::Failed };
        self.persist_json(&artifacts.execution_progress_json(), &progress)?;

        let report_md = report::render_markdown(&run, &progress);
        let report_html = report::render_html(&run, &progress);
        std::fs::write(artifacts.report_md(), report_md)?;
        std::fs::write(artifacts.report_html(), report_html)?;
        run.report_path = Some(artifacts.report_md());
        run.steps_completed.push("report".to_string());

        run.status = if tally.all_passed() { RunStatus::Completed } else { RunStatus::Failed };
        run.updated_at = chrono::Utc::now();
        self.store.put_run(run.clone()).await?;

        Ok(run)
    }

    async fn bootstrap(&self, run: &mut Run, artifacts: &ArtifactStore) -> anyhow::Result<()> {
        run.status = RunStatus::Running;
        artifacts.ensure_layout()?;
        self.store.put_run(run.clone()).await?;
        Ok(())
    }

    async fn fail_run(&self, mut run: Run, err: StructuredError) -> anyhow::Result<Run> {
        run.status = RunStatus::Failed;
        run.error_log.push(err.to_string());
        run.updated_at = chrono::Utc::now();
        self.store.put_run(run.clone()).await?;
        Ok(run)
    }

    /// Crawls the target with a throwaway driver connection — the Explorer
    /// needs no session state beyond the crawl itself, so it gets its own
    /// short-lived browser context rather than sharing one across the whole
    /// run.
    async fn explore_stage(&self, base_url: &str) -> Result<AppMap, StructuredError> {
        let driver = FantocciniDriver::connect(&self.config.webdriver_url, self.config.headless)
            .await
            .map_err(|e| StructuredError::new(ErrorCode::NAVIGATION_FAILED, e.to_string()))?;
        let result = explorer::explore(&driver, base_url, self.config.max_pages).await;
        let _ = Box::new(driver).close().await;
        result
    }

    /// Generates the frontend/backend/security plans concurrently and joins
    /// them into one merged `Plan`, using `StageGraph` for the fan-out even
    /// though the three plan stages happen to share no inputs beyond the
    /// `AppMap` — the graph is what lets `join_plans` express "wait for all
    /// three" without hand-rolling a `tokio::join!` that would need editing
    /// every time a new plan kind is added.
    async fn plan_stage(&self, app_map: &AppMap, credentials: Option<&Credentials>, artifacts: &ArtifactStore) -> Result<Plan, StructuredError> {
        let app_map = Arc::new(app_map.clone());
        let credentials = Arc::new(credentials.cloned());

        let mut graph = StageGraph::new();
        for (stage_name, kind) in [("frontend_plan", PlanKind::Frontend), ("backend_plan", PlanKind::Backend), ("security_plan", PlanKind::Security)] {
            let app_map = app_map.clone();
            let credentials = credentials.clone();
            graph.add_stage(stage_name, &[], move |_inputs| {
                let app_map = app_map.clone();
                let credentials = credentials.clone();
                async move {
                    let plan = planner::generate(&app_map, kind, credentials.as_ref().as_ref());
                    Ok(serde_json::to_value(plan)?)
                }
            });
        }
        graph.add_stage("join_plans", &["frontend_plan", "backend_plan", "security_plan"], |inputs| async move {
            let mut merged = Plan::empty("");
            for key in ["frontend_plan", "backend_plan", "security_plan"] {
                let plan: Plan = serde_json::from_value(inputs[key].clone())?;
                merged.base_url = plan.base_url.clone();
                merged = merged.merge(plan);
            }
            Ok(serde_json::to_value(merged)?)
        });

        let outputs = graph
            .run(self.config.max_concurrent_runs)
            .await
            .map_err(|e| StructuredError::new(ErrorCode::INTERNAL_ERROR, e.to_string()))?;

        let frontend: Plan = serde_json::from_value(outputs["frontend_plan"].clone())
            .map_err(|e| StructuredError::new(ErrorCode::SERIALIZATION_ERROR, e.to_string()))?;
        let backend: Plan = serde_json::from_value(outputs["backend_plan"].clone())
            .map_err(|e| StructuredError::new(ErrorCode::SERIALIZATION_ERROR, e.to_string()))?;
        let security: Plan = serde_json::from_value(outputs["security_plan"].clone())
            .map_err(|e| StructuredError::new(ErrorCode::SERIALIZATION_ERROR, e.to_string()))?;
        let merged: Plan = serde_json::from_value(outputs["join_plans"].clone())
            .map_err(|e| StructuredError::new(ErrorCode::SERIALIZATION_ERROR, e.to_string()))?;

        self.persist_json(&artifacts.frontend_test_plan_json(), &frontend).ok();
        self.persist_json(&artifacts.backend_test_plan_json(), &backend).ok();
        self.persist_json(&artifacts.security_test_plan_json(), &security).ok();

        Ok(merged)
    }

    /// Runs every scenario in id order, skipping a scenario whose
    /// `depends_on` did not pass, and retrying the whole remaining batch up
    /// to `run.max_retries` times when any scenario failed — the `execute ⇄
    /// fix_tests` loop. There is no code-mutation "fix" step in this runner
    /// (that belongs to a code-generation agent this crate does not carry);
    /// "fix_tests" here means re-running failed scenarios, which is the
    /// retry's only externally visible effect.
    async fn execute_stage(&self, run: &Run, plan: &Plan, progress: &mut Progress, artifacts: &ArtifactStore) {
        let retry_counter = RetryCounter::new(run.max_retries);
        let mut outcomes: std::collections::HashMap<String, ScenarioStatus> = std::collections::HashMap::new();

        loop {
            let mut any_failed = false;

            for scenario in plan.all_scenarios() {
                if matches!(outcomes.get(&scenario.id), Some(ScenarioStatus::Passed) | Some(ScenarioStatus::Skipped)) {
                    continue;
                }

                if let Some(dep) = &scenario.depends_on {
                    if !matches!(outcomes.get(dep), Some(ScenarioStatus::Passed)) {
                        let result = crate::protocol::ScenarioResult {
                            status: ScenarioStatus::Skipped,
                            name: scenario.name.clone(),
                            message: Some(
                                StructuredError::new(ErrorCode::DEPENDENCY_SKIPPED, format!("dependency '{dep}' did not pass"))
                                    .with_context(ErrorContext { step_id: Some(scenario.id.clone()), path: None, expected: None, actual: None })
                                    .to_string(),
                            ),
                            screenshot: None,
                            video: None,
                        };
                        outcomes.insert(scenario.id.clone(), ScenarioStatus::Skipped);
                        progress.mark_completed(&scenario.id);
                        progress.results.insert(scenario.id.clone(), result);
                        continue;
                    }
                }

                progress.current_test = Some(scenario.id.clone());
                let driver = match FantocciniDriver::connect(&self.config.webdriver_url, self.config.headless).await {
                    Ok(d) => d,
                    Err(e) => {
                        any_failed = true;
                        outcomes.insert(scenario.id.clone(), ScenarioStatus::Failed);
                        progress.mark_completed(&scenario.id);
                        progress.results.insert(
                            scenario.id.clone(),
                            crate::protocol::ScenarioResult {
                                status: ScenarioStatus::Failed,
                                name: scenario.name.clone(),
                                message: Some(format!("could not start a browser session: {e}")),
                                screenshot: None,
                                video: None,
                            },
                        );
                        continue;
                    }
                };

                let result = crate::executor::execute_scenario(scenario, &driver, run.credentials.as_ref(), &self.config, artifacts).await;
                let _ = Box::new(driver).close().await;

                if result.status != ScenarioStatus::Passed {
                    any_failed = true;
                }
                outcomes.insert(scenario.id.clone(), result.status);
                progress.mark_completed(&scenario.id);
                progress.results.insert(scenario.id.clone(), result);
            }

            if !any_failed || !retry_counter.try_increment() {
                break;
            }
        }
    }

    fn persist_json<T: serde::Serialize>(&self, path: &std::path::Path, value: &T) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
