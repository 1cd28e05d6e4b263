//! Dual-mode shortcut: a scenario made only of `Navigate`/`Assert`/`Wait`
//! steps needs no DOM interaction, so it is serviced as a plain HTTP
//! request instead of spinning a browser context. Reuses
//! the retained legacy HTTP step executor verbatim via the
//! `protocol::http_legacy` types.

use crate::context::Context;
use crate::executors::http::HttpExecutor;
use crate::executors::StepExecutor;
use crate::protocol::http_legacy::{HttpAssertion, HttpStep, HttpStepStatus};
use crate::protocol::{Scenario, ScenarioResult, ScenarioStatus, ScenarioStepAction};
use serde_json::json;

/// A scenario qualifies for the HTTP-only shortcut when none of its steps
/// need a live DOM (`Fill`/`Click`); the legacy HTTP executor then checks only
/// that each navigated URL resolves with a status below 500.
pub fn is_http_only(scenario: &Scenario) -> bool {
    scenario
        .steps
        .iter()
        .all(|s| matches!(s.action, ScenarioStepAction::Navigate | ScenarioStepAction::Assert | ScenarioStepAction::Wait))
        && scenario.steps.iter().any(|s| s.action == ScenarioStepAction::Navigate)
}

/// Runs every `Navigate` step as a `GET` request and asserts status < 500.
/// `Assert`/`Wait` steps are no-ops here: without a DOM there is
/// nothing further to check beyond reachability. A 4xx response (not found,
/// unauthorized) still counts as `passed` — only a server error fails the
/// shortcut, matching the dual-mode contract.
pub async fn run(scenario: &Scenario) -> ScenarioResult {
    let executor = HttpExecutor::new();
    let mut context = Context::new();

    for (i, step) in scenario.steps.iter().enumerate() {
        if step.action != ScenarioStepAction::Navigate {
            continue;
        }
        let http_step = HttpStep {
            id: format!("{}_{}", scenario.id, i),
            description: Some(step.description.clone()),
            depends_on: Vec::new(),
            action: "http_request".to_string(),
            params: json!({ "method": "GET", "path": step.target }),
            assertions: vec![HttpAssertion {
                assertion_type: "status_code".to_string(),
                operator: "lt".to_string(),
                value: json!(500),
                path: None,
            }],
            extract: Vec::new(),
            recovery_policy: None,
        };

        match executor.execute(&http_step, &mut context).await {
            Ok(result) if result.status == HttpStepStatus::Passed => continue,
            Ok(result) => {
                return ScenarioResult {
                    status: ScenarioStatus::Failed,
                    name: scenario.name.clone(),
                    message: result.error,
                    screenshot: None,
                    video: None,
                };
            }
            Err(err) => {
                return ScenarioResult {
                    status: ScenarioStatus::Failed,
                    name: scenario.name.clone(),
                    message: Some(err.to_string()),
                    screenshot: None,
                    video: None,
                };
            }
        }
    }

    ScenarioResult { status: ScenarioStatus::Passed, name: scenario.name.clone(), message: None, screenshot: None, video: None }
}
