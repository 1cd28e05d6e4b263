//! Deterministic scenario-catalog generator.
//!
//! Grounded on `original_source/testbounty_agent/src/agents/planner.py`: no
//! model call, no randomness — the same `AppMap` always produces the same
//! `Plan`. The orchestrator runs this three times in parallel, once per
//! `PlanKind`, and merges the results with `Plan::merge` in the
//! orchestrator's `join_plans` stage.

use crate::protocol::{
    module_prefix, AppMap, ButtonAction, Credentials, Page, PageType, Plan, PlanModule, Priority,
    Scenario, ScenarioStatus, ScenarioStep, ScenarioType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Frontend,
    Backend,
    Security,
}

/// Generates one `Plan` covering every module in `app_map`, scoped to
/// `kind`. `credentials` is consulted only to decide whether login-dependent
/// scenarios fill real values or leave the `{{username}}`/`{{password}}`
/// placeholders unresolved (the executor skips a scenario whose
/// placeholders remain unresolved).
///
/// Ids assigned here are draft ids, local to this one `PlanKind`: the
/// per-module counter starts at 1 regardless of what Frontend, Backend, or
/// Security emitted for the same module. `Plan::merge` renumbers them to a
/// shared counter once all three kinds are combined.
pub fn generate(app_map: &AppMap, kind: PlanKind, credentials: Option<&Credentials>) -> Plan {
    let mut plan = Plan::empty(app_map.base_url.clone());
    let has_credentials = credentials.map(|c| c.username.is_some() && c.password.is_some()).unwrap_or(false);

    for (name, module) in &app_map.modules {
        let prefix = module_prefix(name);
        let mut counter = 1u32;
        let mut scenarios = Vec::new();

        for url in &module.page_urls {
            let Some(page) = app_map.pages.iter().find(|p| &p.url == url) else { continue };
            let mut generated = match kind {
                PlanKind::Frontend => frontend_scenarios_for(page, name, prefix, &mut counter, has_credentials),
                PlanKind::Backend => backend_scenarios_for(page, name, prefix, &mut counter),
                PlanKind::Security => security_scenarios_for(page, name, prefix, &mut counter),
            };
            scenarios.append(&mut generated);
        }

        if scenarios.is_empty() {
            continue;
        }
        plan.modules.insert(
            name.clone(),
            PlanModule { name: name.clone(), requires_auth: module.requires_auth, scenarios },
        );
    }

    plan.total_scenarios = plan.modules.values().map(|m| m.scenarios.len()).sum();
    plan
}

fn next_id(prefix: &str, counter: &mut u32) -> String {
    let id = format!("{prefix}_{:03}", *counter);
    *counter += 1;
    id
}

fn credential_step(target: &str, placeholder: &str, description: &str) -> ScenarioStep {
    ScenarioStep::fill(target, format!("{{{{{placeholder}}}}}"), description)
}

/// Synthetic fill value by HTML input type, used everywhere a template
/// needs to populate a field with something plausible rather than a
/// literal credential.
fn synthetic_value_for(field_type: &str) -> String {
    match field_type {
        "password" => "TestPass123!".to_string(),
        "email" => "new.user+testpilot@example.com".to_string(),
        _ => "Test Value".to_string(),
    }
}

// ============================================================================
// FRONTEND — one template set per page type, per-page-type template rules.
// ============================================================================

fn frontend_scenarios_for(page: &Page, module: &str, prefix: &str, counter: &mut u32, has_credentials: bool) -> Vec<Scenario> {
    match page.page_type {
        PageType::Login => login_scenarios(page, module, prefix, counter, has_credentials),
        PageType::Register => register_scenarios(page, module, prefix, counter),
        PageType::Dashboard => dashboard_scenarios(page, module, prefix, counter),
        PageType::Landing => landing_scenarios(page, module, prefix, counter),
        PageType::Settings => settings_scenarios(page, module, prefix, counter),
        PageType::Profile => profile_scenarios(page, module, prefix, counter),
        PageType::Create => create_scenarios(page, module, prefix, counter),
        PageType::Edit => edit_scenarios(page, module, prefix, counter),
        PageType::List => list_scenarios(page, module, prefix, counter),
        PageType::PasswordReset | PageType::Detail | PageType::General => general_scenarios(page, module, prefix, counter),
    }
}

/// Login page: *Valid Login* (happy, high), *Invalid Password* (error,
/// high), *Empty Form* (edge, medium).
fn login_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32, has_credentials: bool) -> Vec<Scenario> {
    let Some(form) = page.forms.first() else { return Vec::new() };
    let username_field = form.fields.iter().find(|f| f.field_type != "password").map(|f| f.selector.clone());
    let password_field = form.fields.iter().find(|f| f.field_type == "password").map(|f| f.selector.clone());

    let mut valid_steps = vec![ScenarioStep::navigate(&page.url, "Open the login page")];
    if let Some(sel) = &username_field {
        valid_steps.push(credential_step(sel, "username", "Enter the test username"));
    }
    if let Some(sel) = &password_field {
        valid_steps.push(credential_step(sel, "password", "Enter the test password"));
    }
    valid_steps.push(ScenarioStep::click(&form.submit_selector, "Submit the login form"));
    valid_steps.push(ScenarioStep::assert_that("success_or_redirect", "Confirm the login succeeded"));
    let valid_login = Scenario {
        id: next_id(prefix, counter),
        name: "Valid Login".to_string(),
        description: format!("A user with valid credentials can log in from {}", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: if has_credentials { Priority::High } else { Priority::Medium },
        depends_on: None,
        steps: valid_steps,
        status: ScenarioStatus::Pending,
    };

    let mut invalid_steps = vec![ScenarioStep::navigate(&page.url, "Open the login page")];
    if let Some(sel) = &username_field {
        invalid_steps.push(credential_step(sel, "username", "Enter the test username"));
    }
    if let Some(sel) = &password_field {
        invalid_steps.push(ScenarioStep::fill(sel, "wrong-password-123", "Enter an incorrect password"));
    }
    invalid_steps.push(ScenarioStep::click(&form.submit_selector, "Submit the login form"));
    invalid_steps.push(ScenarioStep::assert_that("validation_error", "Confirm an error is shown instead of logging in"));
    let invalid_password = Scenario {
        id: next_id(prefix, counter),
        name: "Invalid Password".to_string(),
        description: format!("Submitting the wrong password on {} surfaces an error instead of logging in", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::ErrorPath,
        priority: Priority::High,
        depends_on: None,
        steps: invalid_steps,
        status: ScenarioStatus::Pending,
    };

    let empty_form = Scenario {
        id: next_id(prefix, counter),
        name: "Empty Form".to_string(),
        description: format!("Submitting {} with no credentials entered must be rejected, not silently accepted", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::EdgeCase,
        priority: Priority::Medium,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, "Open the login page"),
            ScenarioStep::click(&form.submit_selector, "Submit without entering any credentials"),
            ScenarioStep::assert_that("validation_error", "Confirm a validation error is shown"),
        ],
        status: ScenarioStatus::Pending,
    };

    vec![valid_login, invalid_password, empty_form]
}

/// Register page: *Valid Registration* (happy, high).
fn register_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let Some(form) = page.forms.first() else { return Vec::new() };
    let mut steps = vec![ScenarioStep::navigate(&page.url, "Open the registration page")];
    for field in &form.fields {
        steps.push(ScenarioStep::fill(&field.selector, synthetic_value_for(&field.field_type), format!("Fill the {} field", field.field_type)));
    }
    steps.push(ScenarioStep::click(&form.submit_selector, "Submit the registration form"));
    steps.push(ScenarioStep::assert_that("success_or_redirect", "Confirm the account was created"));

    vec![Scenario {
        id: next_id(prefix, counter),
        name: "Valid Registration".to_string(),
        description: format!("A visitor can create an account from {}", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::High,
        depends_on: None,
        steps,
        status: ScenarioStatus::Pending,
    }]
}

/// Dashboard: *View Dashboard* (happy, high) with `depends_on=auth_001` if
/// the page requires auth; one *Click <label>* per discovered non-cancel
/// button.
fn dashboard_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let depends_on = if page.requires_auth { Some("auth_001".to_string()) } else { None };
    let mut out = vec![Scenario {
        id: next_id(prefix, counter),
        name: "View Dashboard".to_string(),
        description: format!("The dashboard at {} renders for an authenticated user", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::High,
        depends_on,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::assert_that("user_info_visible", "Confirm the dashboard rendered for the logged-in user"),
        ],
        status: ScenarioStatus::Pending,
    }];

    for button in &page.buttons {
        if button.action == ButtonAction::Cancel {
            continue;
        }
        out.push(Scenario {
            id: next_id(prefix, counter),
            name: format!("Click {}", button.text),
            description: format!("Clicking '{}' on {} produces the expected result", button.text, page.url),
            module: module.to_string(),
            scenario_type: ScenarioType::HappyPath,
            priority: Priority::Medium,
            depends_on: None,
            steps: vec![
                ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
                ScenarioStep::click(&button.selector, format!("Click the '{}' button", button.text)),
                ScenarioStep::assert_that("action_result", "Confirm the action completed"),
            ],
            status: ScenarioStatus::Pending,
        });
    }
    out
}

/// Landing page: *View Landing Page* (happy, high) with no dependency; one
/// nav-link scenario per link.
fn landing_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let mut out = vec![Scenario {
        id: next_id(prefix, counter),
        name: "View Landing Page".to_string(),
        description: format!("The landing page at {} renders for an anonymous visitor", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::High,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::assert_that("cta_buttons_visible", "Confirm the landing page's call-to-action is visible"),
        ],
        status: ScenarioStatus::Pending,
    }];

    for link in &page.nav_links {
        out.push(Scenario {
            id: next_id(prefix, counter),
            name: format!("Navigate via {}", link.text),
            description: format!("Following the '{}' nav link from {} reaches its target", link.text, page.url),
            module: module.to_string(),
            scenario_type: ScenarioType::HappyPath,
            priority: Priority::Low,
            depends_on: None,
            steps: vec![
                ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
                ScenarioStep::click(format!("a[href='{}']", link.href), format!("Follow the '{}' nav link", link.text)),
                ScenarioStep::assert_that("navigation_success", "Confirm the nav link navigated successfully"),
            ],
            status: ScenarioStatus::Pending,
        });
    }
    out
}

/// Settings page: *View Settings*; per form one *Update <form_id>* with
/// synthetic values.
fn settings_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let mut out = vec![Scenario {
        id: next_id(prefix, counter),
        name: "View Settings".to_string(),
        description: format!("The settings page at {} renders its forms", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::Medium,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::assert_that("key_elements_visible", "Confirm the settings page rendered"),
        ],
        status: ScenarioStatus::Pending,
    }];

    for form in &page.forms {
        let form_id = form.id.clone().unwrap_or_else(|| form.selector.clone());
        let mut steps = vec![ScenarioStep::navigate(&page.url, format!("Open {}", page.url))];
        for field in &form.fields {
            steps.push(ScenarioStep::fill(&field.selector, synthetic_value_for(&field.field_type), format!("Fill the {} field", field.field_type)));
        }
        steps.push(ScenarioStep::click(&form.submit_selector, "Submit the form"));
        steps.push(ScenarioStep::assert_that("update_success", "Confirm the update was saved"));

        out.push(Scenario {
            id: next_id(prefix, counter),
            name: format!("Update {form_id}"),
            description: format!("Submitting synthetic values through the '{form_id}' form on {} saves successfully", page.url),
            module: module.to_string(),
            scenario_type: ScenarioType::HappyPath,
            priority: Priority::Medium,
            depends_on: None,
            steps,
            status: ScenarioStatus::Pending,
        });
    }
    out
}

/// Profile page: *View Profile*.
fn profile_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    vec![Scenario {
        id: next_id(prefix, counter),
        name: "View Profile".to_string(),
        description: format!("The profile page at {} renders the user's information", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::Medium,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::assert_that("user_info_visible", "Confirm the profile page rendered the user's information"),
        ],
        status: ScenarioStatus::Pending,
    }]
}

/// Crud create page: *Create New Item* (happy, high) and *Create with Empty
/// Form* (edge, medium).
fn create_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let Some(form) = page.forms.first() else { return Vec::new() };

    let mut create_steps = vec![ScenarioStep::navigate(&page.url, format!("Open {}", page.url))];
    for field in &form.fields {
        create_steps.push(ScenarioStep::fill(&field.selector, synthetic_value_for(&field.field_type), format!("Fill the {} field", field.field_type)));
    }
    create_steps.push(ScenarioStep::click(&form.submit_selector, "Submit the form"));
    create_steps.push(ScenarioStep::assert_that("create_success", "Confirm the item was created"));
    let create_new_item = Scenario {
        id: next_id(prefix, counter),
        name: "Create New Item".to_string(),
        description: format!("Filling every field on {} and submitting creates a new item", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::High,
        depends_on: None,
        steps: create_steps,
        status: ScenarioStatus::Pending,
    };

    let empty_form = Scenario {
        id: next_id(prefix, counter),
        name: "Create with Empty Form".to_string(),
        description: format!("Submitting {} with no fields filled must be rejected, not silently accepted", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::EdgeCase,
        priority: Priority::Medium,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::click(&form.submit_selector, "Submit without filling any fields"),
            ScenarioStep::assert_that("validation_error", "Confirm a validation error is shown"),
        ],
        status: ScenarioStatus::Pending,
    };

    vec![create_new_item, empty_form]
}

/// Crud edit page: *Edit Item*.
fn edit_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let Some(form) = page.forms.first() else { return Vec::new() };
    let mut steps = vec![ScenarioStep::navigate(&page.url, format!("Open {}", page.url))];
    for field in &form.fields {
        steps.push(ScenarioStep::fill(&field.selector, synthetic_value_for(&field.field_type), format!("Fill the {} field", field.field_type)));
    }
    steps.push(ScenarioStep::click(&form.submit_selector, "Submit the form"));
    steps.push(ScenarioStep::assert_that("save_success", "Confirm the edit was saved"));

    vec![Scenario {
        id: next_id(prefix, counter),
        name: "Edit Item".to_string(),
        description: format!("Editing the item at {} and submitting saves the changes", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::High,
        depends_on: None,
        steps,
        status: ScenarioStatus::Pending,
    }]
}

/// Crud list page: *View List*.
fn list_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    vec![Scenario {
        id: next_id(prefix, counter),
        name: "View List".to_string(),
        description: format!("The list page at {} renders its items", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::Medium,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::assert_that("list_visible", "Confirm the list rendered"),
        ],
        status: ScenarioStatus::Pending,
    }]
}

/// Catch-all for `General`, `PasswordReset`, and `Detail` pages, which the
/// templates above don't otherwise name: *View <title>*; one form-submit
/// per discovered form.
fn general_scenarios(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let mut out = vec![Scenario {
        id: next_id(prefix, counter),
        name: format!("View {}", page.title),
        description: format!("Navigating to {} renders without a client-side error", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::HappyPath,
        priority: Priority::Low,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
            ScenarioStep::assert_that("page_loaded", "Confirm the page rendered"),
        ],
        status: ScenarioStatus::Pending,
    }];

    for form in &page.forms {
        let mut steps = vec![ScenarioStep::navigate(&page.url, format!("Open {}", page.url))];
        for field in &form.fields {
            steps.push(ScenarioStep::fill(&field.selector, synthetic_value_for(&field.field_type), format!("Fill the {} field", field.field_type)));
        }
        steps.push(ScenarioStep::click(&form.submit_selector, "Submit the form"));
        steps.push(ScenarioStep::assert_that("form_submitted", "Confirm the form submitted successfully"));

        out.push(Scenario {
            id: next_id(prefix, counter),
            name: format!("Submit the form on {}", page.path),
            description: format!("Filling every field on {} and submitting completes without error", page.url),
            module: module.to_string(),
            scenario_type: ScenarioType::HappyPath,
            priority: Priority::Medium,
            depends_on: None,
            steps,
            status: ScenarioStatus::Pending,
        });
    }
    out
}

// ============================================================================
// BACKEND — form-validation coverage (required fields, malformed input).
// ============================================================================

fn backend_scenarios_for(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let mut out = Vec::new();
    for form in &page.forms {
        if let Some(required_field) = form.fields.iter().find(|f| f.required) {
            out.push(missing_required_field(page, form, required_field, module, prefix, counter));
        }
    }
    out
}

fn missing_required_field(page: &Page, form: &crate::protocol::Form, required: &crate::protocol::Field, module: &str, prefix: &str, counter: &mut u32) -> Scenario {
    let mut steps = vec![ScenarioStep::navigate(&page.url, format!("Open {}", page.url))];
    for field in &form.fields {
        if field.selector == required.selector {
            continue;
        }
        steps.push(ScenarioStep::fill(&field.selector, "Test Value", format!("Fill the {} field", field.field_type)));
    }
    steps.push(ScenarioStep::click(&form.submit_selector, "Submit without the required field"));
    steps.push(ScenarioStep::assert_that("validation_error", "Confirm a validation error is shown"));

    Scenario {
        id: next_id(prefix, counter),
        name: format!("Submitting {} without a required field is rejected", page.path),
        description: format!(
            "Omitting the required '{}' field on {} must surface a validation error, not a silent success",
            required.name.clone().unwrap_or_else(|| required.field_type.clone()),
            page.url
        ),
        module: module.to_string(),
        scenario_type: ScenarioType::ErrorPath,
        priority: Priority::High,
        depends_on: None,
        steps,
        status: ScenarioStatus::Pending,
    }
}

// ============================================================================
// SECURITY — injection probes and unauthenticated access attempts.
// ============================================================================

fn security_scenarios_for(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Vec<Scenario> {
    let mut out = Vec::new();
    for form in &page.forms {
        if let Some(field) = form.fields.iter().find(|f| f.field_type == "text" || f.field_type == "search" || f.field_type == "email") {
            out.push(sql_injection(page, form, field, module, prefix, counter));
        }
    }
    if page.requires_auth {
        out.push(unauthenticated_access_attempt(page, module, prefix, counter));
    }
    out
}

fn sql_injection(page: &Page, form: &crate::protocol::Form, field: &crate::protocol::Field, module: &str, prefix: &str, counter: &mut u32) -> Scenario {
    const PAYLOAD: &str = "' OR '1'='1";
    let steps = vec![
        ScenarioStep::navigate(&page.url, format!("Open {}", page.url)),
        ScenarioStep::fill(&field.selector, PAYLOAD, "Submit an injection payload in a text field"),
        ScenarioStep::click(&form.submit_selector, "Submit the form"),
        ScenarioStep::assert_that("no_unauthorized_access", "Confirm the payload is rejected rather than bypassing validation"),
    ];

    Scenario {
        id: next_id(prefix, counter),
        name: "SQL Injection".to_string(),
        description: format!(
            "Submitting a SQL-injection-style payload through the '{}' field on {} must not bypass validation or grant unauthorized access",
            field.name.clone().unwrap_or_else(|| field.field_type.clone()),
            page.url
        ),
        module: module.to_string(),
        scenario_type: ScenarioType::Security,
        priority: Priority::High,
        depends_on: None,
        steps,
        status: ScenarioStatus::Pending,
    }
}

fn unauthenticated_access_attempt(page: &Page, module: &str, prefix: &str, counter: &mut u32) -> Scenario {
    Scenario {
        id: next_id(prefix, counter),
        name: format!("{} is not reachable without authentication", page.path),
        description: format!("Navigating directly to {} without a prior login must not render protected content", page.url),
        module: module.to_string(),
        scenario_type: ScenarioType::Security,
        priority: Priority::High,
        depends_on: None,
        steps: vec![
            ScenarioStep::navigate(&page.url, format!("Open {} directly", page.url)),
            ScenarioStep::assert_that("no_unauthorized_access", "Confirm the request did not reach protected content"),
        ],
        status: ScenarioStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Button, Field, Form, NavLink};
    use std::collections::HashMap;

    fn login_page() -> Page {
        Page {
            url: "https://x.test/login".into(),
            path: "/login".into(),
            title: "Login".into(),
            page_type: PageType::Login,
            forms: vec![Form {
                id: Some("login-form".into()),
                selector: "#login-form".into(),
                action: None,
                method: "POST".into(),
                submit_text: None,
                submit_selector: "[type='submit']".into(),
                fields: vec![
                    Field { field_type: "text".into(), name: Some("username".into()), id: None, placeholder: None, required: true, selector: "[name='username']".into() },
                    Field { field_type: "password".into(), name: Some("password".into()), id: None, placeholder: None, required: true, selector: "[name='password']".into() },
                ],
            }],
            buttons: vec![],
            inputs: vec![],
            nav_links: vec![],
            modals: vec![],
            requires_auth: false,
        }
    }

    fn sample_app_map() -> AppMap {
        let page = login_page();
        let mut modules = HashMap::new();
        modules.insert("auth".to_string(), crate::protocol::Module { name: "auth".into(), requires_auth: false, page_urls: vec![page.url.clone()] });
        AppMap { base_url: "https://x.test".into(), total_pages: 1, pages: vec![page], modules, auth_pages: vec!["https://x.test/login".into()] }
    }

    #[test]
    fn frontend_plan_generates_the_three_login_templates() {
        let plan = generate(&sample_app_map(), PlanKind::Frontend, None);
        let scenarios = plan.all_scenarios();
        assert_eq!(scenarios.len(), 3);
        assert!(scenarios.iter().any(|s| s.name == "Valid Login" && s.scenario_type == ScenarioType::HappyPath));
        assert!(scenarios.iter().any(|s| s.name == "Invalid Password" && s.scenario_type == ScenarioType::ErrorPath));
        assert!(scenarios.iter().any(|s| s.name == "Empty Form" && s.scenario_type == ScenarioType::EdgeCase));
    }

    #[test]
    fn backend_plan_covers_required_field_validation() {
        let plan = generate(&sample_app_map(), PlanKind::Backend, None);
        let scenarios = plan.all_scenarios();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].scenario_type, ScenarioType::ErrorPath);
    }

    #[test]
    fn security_plan_generates_a_sql_injection_probe() {
        let plan = generate(&sample_app_map(), PlanKind::Security, None);
        let scenarios = plan.all_scenarios();
        assert!(scenarios.iter().any(|s| s.scenario_type == ScenarioType::Security && s.name == "SQL Injection"));
    }

    #[test]
    fn ids_are_sequential_within_a_module() {
        let plan = generate(&sample_app_map(), PlanKind::Frontend, None);
        let scenarios = plan.all_scenarios();
        assert_eq!(scenarios[0].id, "auth_001");
        assert_eq!(scenarios[1].id, "auth_002");
        assert_eq!(scenarios[2].id, "auth_003");
    }

    #[test]
    fn dashboard_depends_on_auth_001_when_it_requires_auth() {
        let page = Page {
            url: "https://x.test/dashboard".into(),
            path: "/dashboard".into(),
            title: "Dashboard".into(),
            page_type: PageType::Dashboard,
            forms: vec![],
            buttons: vec![
                Button { text: "Export".into(), selector: ".export".into(), action: ButtonAction::Click },
                Button { text: "Cancel".into(), selector: ".cancel".into(), action: ButtonAction::Cancel },
            ],
            inputs: vec![],
            nav_links: vec![],
            modals: vec![],
            requires_auth: true,
        };
        let mut modules = HashMap::new();
        modules.insert("dashboard".to_string(), crate::protocol::Module { name: "dashboard".into(), requires_auth: true, page_urls: vec![page.url.clone()] });
        let app_map = AppMap { base_url: "https://x.test".into(), total_pages: 1, pages: vec![page], modules, auth_pages: vec![] };

        let plan = generate(&app_map, PlanKind::Frontend, None);
        let scenarios = plan.all_scenarios();
        let view = scenarios.iter().find(|s| s.name == "View Dashboard").unwrap();
        assert_eq!(view.depends_on.as_deref(), Some("auth_001"));
        assert!(scenarios.iter().any(|s| s.name == "Click Export"));
        assert!(!scenarios.iter().any(|s| s.name == "Click Cancel"));
    }

    #[test]
    fn landing_generates_one_scenario_per_nav_link() {
        let page = Page {
            url: "https://x.test/".into(),
            path: "/".into(),
            title: "Home".into(),
            page_type: PageType::Landing,
            forms: vec![],
            buttons: vec![],
            inputs: vec![],
            nav_links: vec![
                NavLink { text: "Pricing".into(), href: "/pricing".into() },
                NavLink { text: "About".into(), href: "/about".into() },
            ],
            modals: vec![],
            requires_auth: false,
        };
        let mut modules = HashMap::new();
        modules.insert("dashboard".to_string(), crate::protocol::Module { name: "dashboard".into(), requires_auth: false, page_urls: vec![page.url.clone()] });
        let app_map = AppMap { base_url: "https://x.test".into(), total_pages: 1, pages: vec![page], modules, auth_pages: vec![] };

        let plan = generate(&app_map, PlanKind::Frontend, None);
        let scenarios = plan.all_scenarios();
        assert_eq!(scenarios.len(), 3);
        assert!(scenarios.iter().any(|s| s.name == "View Landing Page"));
        assert!(scenarios.iter().any(|s| s.name == "Navigate via Pricing"));
        assert!(scenarios.iter().any(|s| s.name == "Navigate via About"));
    }

    #[test]
    fn crud_create_page_generates_happy_and_edge_templates() {
        let page = Page {
            url: "https://x.test/items/new".into(),
            path: "/items/new".into(),
            title: "New Item".into(),
            page_type: PageType::Create,
            forms: vec![Form {
                id: Some("item-form".into()),
                selector: "#item-form".into(),
                action: None,
                method: "POST".into(),
                submit_text: None,
                submit_selector: "[type='submit']".into(),
                fields: vec![Field { field_type: "text".into(), name: Some("title".into()), id: None, placeholder: None, required: true, selector: "[name='title']".into() }],
            }],
            buttons: vec![],
            inputs: vec![],
            nav_links: vec![],
            modals: vec![],
            requires_auth: true,
        };
        let mut modules = HashMap::new();
        modules.insert("crud".to_string(), crate::protocol::Module { name: "crud".into(), requires_auth: true, page_urls: vec![page.url.clone()] });
        let app_map = AppMap { base_url: "https://x.test".into(), total_pages: 1, pages: vec![page], modules, auth_pages: vec![] };

        let plan = generate(&app_map, PlanKind::Frontend, None);
        let scenarios = plan.all_scenarios();
        assert_eq!(scenarios.len(), 2);
        assert!(scenarios.iter().any(|s| s.name == "Create New Item" && s.scenario_type == ScenarioType::HappyPath));
        assert!(scenarios.iter().any(|s| s.name == "Create with Empty Form" && s.scenario_type == ScenarioType::EdgeCase));
    }
}
