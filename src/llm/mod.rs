//! Optional enrichment layer: a PRD summary and richer scenario wording than
//! the deterministic planner templates produce on their own.
//!
//! A provider-agnostic shape — pick a backend off an
//! environment key, validate its output against a schema, fall back to a
//! deterministic default when no key is configured or the call fails — the
//! same posture `config::RunnerConfig::enrichment_available()` already
//! gates. No HTTP call is made here: wiring a concrete provider (OpenAI,
//! Anthropic, Google) is out of scope for this runner, which only needs to
//! decide whether enrichment is available and otherwise produce output
//! indistinguishable in shape from what a provider would return.

use crate::protocol::AppMap;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// Schema a PRD summary must satisfy regardless of which provider produced
/// it (or the deterministic fallback), so downstream consumers never branch
/// on provenance.
static PRD_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema = json!({
        "type": "object",
        "required": ["overview", "modules", "risks"],
        "properties": {
            "overview": { "type": "string" },
            "modules": { "type": "array", "items": { "type": "string" } },
            "risks": { "type": "array", "items": { "type": "string" } }
        }
    });
    JSONSchema::compile(&schema).expect("PRD schema must compile")
});

/// A short product-requirements summary derived from the crawled `AppMap`,
/// handed to the planner as context and persisted alongside the test plans.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct PrdSummary {
    pub overview: String,
    pub modules: Vec<String>,
    pub risks: Vec<String>,
}

/// Produces a `PrdSummary` for `app_map`. Calls out to a configured
/// enrichment provider when one is available; otherwise falls back to a
/// deterministic summary built straight from the crawl, which is always
/// schema-valid and never fails.
pub async fn summarize(app_map: &AppMap) -> PrdSummary {
    if crate::config::RunnerConfig::enrichment_available() {
        // No concrete provider integration ships with this runner; treat
        // enrichment as available but defer to the deterministic summary
        // until a provider client is wired in.
        tracing::debug!("enrichment provider key detected, but no provider client is wired; using deterministic PRD summary");
    }
    deterministic_summary(app_map)
}

fn deterministic_summary(app_map: &AppMap) -> PrdSummary {
    let mut modules: Vec<String> = app_map.modules.keys().cloned().collect();
    modules.sort();

    let overview = format!(
        "Crawled {} page(s) across {} module(s) under {}.",
        app_map.total_pages,
        modules.len(),
        app_map.base_url
    );

    let mut risks = Vec::new();
    if !app_map.auth_pages.is_empty() {
        risks.push(format!("{} authenticated page(s) require valid credentials to exercise", app_map.auth_pages.len()));
    }
    if modules.iter().any(|m| m == "general") {
        risks.push("some pages did not match a known module and were grouped under general".to_string());
    }
    if risks.is_empty() {
        risks.push("no elevated risk areas identified from the crawl alone".to_string());
    }

    let summary = PrdSummary { overview, modules, risks };
    debug_assert!(validate(&summary).is_ok(), "deterministic summary must always satisfy its own schema");
    summary
}

/// Validates a `PrdSummary` (own or provider-sourced) against `PRD_SCHEMA`.
pub fn validate(summary: &PrdSummary) -> Result<(), String> {
    let value: Value = serde_json::to_value(summary).map_err(|e| e.to_string())?;
    PRD_SCHEMA
        .validate(&value)
        .map_err(|errors| errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; "))
}
