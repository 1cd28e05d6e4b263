//! Core data model: `Run`, `AppMap`, `Plan`, `Progress` and their nested
//! types, plus the legacy HTTP-step protocol retained for dual-mode scenario
//! execution (see `http_legacy` and `executor::http_mode`).
//!
//! Plain serde structs, no behavior beyond small constructors and defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

pub mod http_legacy;

// ============================================================================
// RUN
// ============================================================================

/// Either a remote target or a local project checkout. The Explorer only
/// crawls `Url`; `LocalPath` is accepted for forward compatibility with the
/// out-of-scope code-analysis path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    Url(String),
    LocalPath(PathBuf),
}

impl Target {
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Target::Url(u) => Some(u),
            Target::LocalPath(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunMetadata {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Top-level job record. The orchestrator exclusively owns mutation of a
/// given `Run`; once `status` is terminal no further write may occur
/// (enforced by `store::RunStore::put`, which refuses to overwrite a record
/// already in a terminal state).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Run {
    pub run_id: String,
    pub target: Target,
    pub credentials: Option<Credentials>,
    pub metadata: RunMetadata,
    pub status: RunStatus,
    pub steps_completed: Vec<String>,
    pub error_log: Vec<String>,
    pub retries: u32,
    pub max_retries: u32,
    pub project_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Run {
    pub fn new(
        target: Target,
        credentials: Option<Credentials>,
        metadata: RunMetadata,
        scratch_root: &std::path::Path,
        max_retries: u32,
    ) -> Self {
        let run_id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        Self {
            project_path: scratch_root.join(&run_id),
            run_id,
            target,
            credentials,
            metadata,
            status: RunStatus::Pending,
            steps_completed: Vec::new(),
            error_log: Vec::new(),
            retries: 0,
            max_retries,
            report_path: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// APP MAP (Explorer output)
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Login,
    Register,
    PasswordReset,
    Dashboard,
    Landing,
    Settings,
    Profile,
    Create,
    Edit,
    List,
    Detail,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Field {
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    /// Comma-separated CSS selector preference list.
    pub selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Form {
    pub id: Option<String>,
    pub selector: String,
    pub action: Option<String>,
    pub method: String,
    pub fields: Vec<Field>,
    pub submit_text: Option<String>,
    pub submit_selector: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Submit,
    Delete,
    Edit,
    Cancel,
    Login,
    Logout,
    Search,
    Download,
    Upload,
    Click,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub selector: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Input {
    #[serde(rename = "type")]
    pub input_type: String,
    pub name: Option<String>,
    pub selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavLink {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modal {
    pub selector: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub path: String,
    pub title: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub forms: Vec<Form>,
    pub buttons: Vec<Button>,
    pub inputs: Vec<Input>,
    pub nav_links: Vec<NavLink>,
    pub modals: Vec<Modal>,
    pub requires_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub requires_auth: bool,
    pub page_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppMap {
    pub base_url: String,
    pub total_pages: usize,
    pub pages: Vec<Page>,
    pub modules: HashMap<String, Module>,
    pub auth_pages: Vec<String>,
}

impl AppMap {
    pub fn empty(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            total_pages: 0,
            pages: Vec::new(),
            modules: HashMap::new(),
            auth_pages: Vec::new(),
        }
    }
}

// ============================================================================
// PLAN (Planner output)
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    HappyPath,
    ErrorPath,
    EdgeCase,
    Security,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStepAction {
    Navigate,
    Fill,
    Click,
    Wait,
    Assert,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioStep {
    pub action: ScenarioStepAction,
    pub target: String,
    pub value: Option<String>,
    pub description: String,
    /// Enrichment-only extension: a provider-generated step may attach a
    /// retry/backoff policy. Deterministic templates never set one, so the
    /// executor's default behavior stays fail-fast per step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_policy: Option<http_legacy::HttpRecoveryPolicy>,
}

impl ScenarioStep {
    pub fn navigate(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self { action: ScenarioStepAction::Navigate, target: target.into(), value: None, description: description.into(), recovery_policy: None }
    }
    pub fn fill(target: impl Into<String>, value: impl Into<String>, description: impl Into<String>) -> Self {
        Self { action: ScenarioStepAction::Fill, target: target.into(), value: Some(value.into()), description: description.into(), recovery_policy: None }
    }
    pub fn click(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self { action: ScenarioStepAction::Click, target: target.into(), value: None, description: description.into(), recovery_policy: None }
    }
    pub fn wait(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self { action: ScenarioStepAction::Wait, target: target.into(), value: None, description: description.into(), recovery_policy: None }
    }
    pub fn assert_that(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self { action: ScenarioStepAction::Assert, target: target.into(), value: None, description: description.into(), recovery_policy: None }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub module: String,
    #[serde(rename = "type")]
    pub scenario_type: ScenarioType,
    pub priority: Priority,
    pub depends_on: Option<String>,
    pub steps: Vec<ScenarioStep>,
    pub status: ScenarioStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlanModule {
    pub name: String,
    pub requires_auth: bool,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub base_url: String,
    pub total_scenarios: usize,
    pub modules: HashMap<String, PlanModule>,
}

/// The id prefix a module's scenarios are numbered under (`auth_001`,
/// `dash_001`, `profile_001`, `crud_001`, `gen_001`). Shared between the
/// planner (draft numbering within one `PlanKind::generate()` call) and
/// `Plan::merge` (final numbering across all three kinds), so a module
/// always gets one prefix regardless of which component is numbering it.
pub fn module_prefix(module_name: &str) -> &'static str {
    match module_name {
        "auth" => "auth",
        "dashboard" => "dash",
        "profile" => "profile",
        "crud" => "crud",
        _ => "gen",
    }
}

/// Splits `auth_007` into `("auth", 7)`. Returns `None` for an id that
/// doesn't end in a numeric suffix, which `merge` treats as "no number to
/// continue from".
fn split_scenario_id(id: &str) -> Option<(&str, u32)> {
    let (prefix, suffix) = id.rsplit_once('_')?;
    suffix.parse().ok().map(|n| (prefix, n))
}

impl Plan {
    pub fn empty(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), total_scenarios: 0, modules: HashMap::new() }
    }

    /// All scenarios, ordered by id. Ids are sequential
    /// per-prefix (`auth_001`, `dash_001`, ...) so sorting by id recovers
    /// the module-local emission order; cross-module ordering is otherwise
    /// unobserved by the executor, which only cares about `depends_on`.
    pub fn all_scenarios(&self) -> Vec<&Scenario> {
        let mut out: Vec<&Scenario> = self.modules.values().flat_map(|m| m.scenarios.iter()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Merges `other`'s modules into `self`, renumbering every incoming
    /// scenario to continue the shared per-module-prefix counter instead of
    /// keeping the draft id it was given inside its own `PlanKind::generate()`
    /// call. Without this, Frontend/Backend/Security each start counting a
    /// module's ids back at 1, so three unrelated scenarios can all end up
    /// `auth_001` after merging and silently clobber each other by id.
    /// A `depends_on` that pointed at one of the renumbered incoming ids is
    /// rewritten to match; a `depends_on` pointing at an id already settled
    /// in `self` (e.g. Frontend's `auth_001`, merged in first) needs no
    /// rewrite since that id never changes.
    pub fn merge(mut self, other: Plan) -> Plan {
        for (name, incoming) in other.modules {
            let prefix = module_prefix(&name);
            let existing = self.modules.entry(name.clone()).or_insert_with(|| PlanModule {
                name: name.clone(),
                requires_auth: incoming.requires_auth,
                scenarios: Vec::new(),
            });
            existing.requires_auth = existing.requires_auth || incoming.requires_auth;

            let mut next = existing
                .scenarios
                .iter()
                .filter_map(|s| split_scenario_id(&s.id))
                .map(|(_, n)| n)
                .max()
                .unwrap_or(0)
                + 1;

            let mut remap: HashMap<String, String> = HashMap::new();
            let mut renumbered = Vec::with_capacity(incoming.scenarios.len());
            for mut scenario in incoming.scenarios {
                let new_id = format!("{prefix}_{next:03}");
                next += 1;
                if new_id != scenario.id {
                    remap.insert(scenario.id.clone(), new_id.clone());
                }
                scenario.id = new_id;
                renumbered.push(scenario);
            }
            for scenario in &mut renumbered {
                if let Some(dep) = scenario.depends_on.as_ref().and_then(|d| remap.get(d)) {
                    scenario.depends_on = Some(dep.clone());
                }
            }
            existing.scenarios.extend(renumbered);
        }
        self.total_scenarios = self.modules.values().map(|m| m.scenarios.len()).sum();
        self
    }
}

// ============================================================================
// PROGRESS (live, per-run)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioResult {
    pub status: ScenarioStatus,
    pub name: String,
    pub message: Option<String>,
    pub screenshot: Option<PathBuf>,
    pub video: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub status: ProgressStatus,
    pub current_test: Option<String>,
    pub total: usize,
    pub completed: Vec<String>,
    pub results: HashMap<String, ScenarioResult>,
    pub current_screenshot: Option<PathBuf>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            status: ProgressStatus::Pending,
            current_test: None,
            total,
            completed: Vec::new(),
            results: HashMap::new(),
            current_screenshot: None,
        }
    }

    /// `completed` is a set: marking the same id twice is a no-op.
    pub fn mark_completed(&mut self, id: &str) {
        if !self.completed.iter().any(|c| c == id) {
            self.completed.push(id.to_string());
        }
    }
}

// ============================================================================
// AUXILIARY THIN RECORDS (Monitor / Suite) — ambient persistence only
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suite {
    pub id: String,
    pub name: String,
    pub scenario_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}
