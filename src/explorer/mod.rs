//! Bounded same-origin crawler.
//!
//! Grounded directly on
//! `original_source/testbounty_agent/src/agents/explorer.py`: the page-type
//! classification table, the form/field/button/nav/modal extraction rules,
//! and the module-grouping table are carried over verbatim in meaning,
//! re-expressed against `driver::BrowserDriver` instead of a Playwright
//! page object.

use std::collections::{HashMap, HashSet, VecDeque};
use url::Url;

use crate::driver::BrowserDriver;
use crate::errors::{ErrorCode, StructuredError};
use crate::protocol::{AppMap, Button, ButtonAction, Field, Form, Input, Modal, Module, NavLink, Page, PageType};

/// `explore(base_url, max_pages) -> AppMap`. Fails with `NavigationFailed`
/// only if the initial base URL is unreachable; later per-URL failures are
/// logged and the crawl continues.
pub async fn explore(
    driver: &dyn BrowserDriver,
    base_url: &str,
    max_pages: usize,
) -> Result<AppMap, StructuredError> {
    if max_pages == 0 {
        return Ok(AppMap::empty(base_url));
    }

    let base = Url::parse(base_url).map_err(|e| {
        StructuredError::new(ErrorCode::NAVIGATION_FAILED, format!("invalid base url '{base_url}': {e}"))
    })?;
    let domain = base.host_str().unwrap_or("").to_string();

    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(base_url.to_string());
    let mut visited: HashSet<String> = HashSet::new();
    let mut pages: Vec<Page> = Vec::new();
    let mut base_reached = false;

    while let Some(url) = queue.pop_front() {
        if visited.contains(&url) || visited.len() >= max_pages {
            continue;
        }
        let parsed = match Url::parse(&url) {
            Ok(u) => u,
            Err(_) => continue,
        };
        if parsed.host_str().unwrap_or("") != domain {
            continue;
        }
        visited.insert(url.clone());

        match driver.goto(&url, 15_000).await {
            Ok(()) => {
                base_reached = true;
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "navigation failed during crawl, skipping");
                continue;
            }
        }
        let _ = driver.wait_load_state(15_000).await;

        let (page, crawl_links) = extract_page(driver, &url, &parsed).await;
        for link in &crawl_links {
            if let Ok(resolved) = parsed.join(&link.href) {
                let resolved = resolved.to_string();
                if !visited.contains(&resolved) {
                    queue.push_back(resolved);
                }
            }
        }
        pages.push(page);
    }

    if !base_reached {
        return Err(StructuredError::new(
            ErrorCode::NAVIGATION_FAILED,
            format!("base url '{base_url}' was unreachable"),
        ));
    }

    let modules = group_into_modules(&pages);
    let auth_pages = pages
        .iter()
        .filter(|p| matches!(p.page_type, PageType::Login | PageType::Register | PageType::PasswordReset))
        .map(|p| p.url.clone())
        .collect();

    Ok(AppMap { base_url: base_url.to_string(), total_pages: pages.len(), pages, modules, auth_pages })
}

/// Returns the extracted `Page` plus the separate, unscoped crawl frontier
/// (`Page.nav_links` is scoped to nav-ish containers and is not meant to
/// drive the crawl by itself).
async fn extract_page(driver: &dyn BrowserDriver, url: &str, parsed: &Url) -> (Page, Vec<NavLink>) {
    let title = driver.title().await.unwrap_or_default();
    let html = driver.content().await.unwrap_or_default();
    let page_type = classify_page_type(parsed.path(), &title, &html);
    let requires_auth = path_requires_auth(parsed.path());
    let crawl_links = extract_crawl_links(&html);

    let page = Page {
        url: url.to_string(),
        path: parsed.path().to_string(),
        title,
        page_type,
        forms: extract_forms(&html),
        buttons: extract_buttons(&html),
        inputs: extract_standalone_inputs(&html),
        nav_links: extract_nav_links(&html),
        modals: extract_modals(&html),
        requires_auth,
    };
    (page, crawl_links)
}

/// By URL path prefix, then title, then by form field names, per a fixed
/// rule table. `html` is consulted only for the field-name
/// fallback.
fn classify_page_type(path: &str, title: &str, html: &str) -> PageType {
    let p = path.to_lowercase();
    let t = title.to_lowercase();

    if p == "/" {
        return PageType::Landing;
    }
    let prefix_rules: &[(&str, PageType)] = &[
        ("/login", PageType::Login),
        ("/signin", PageType::Login),
        ("/register", PageType::Register),
        ("/signup", PageType::Register),
        ("/password-reset", PageType::PasswordReset),
        ("/forgot-password", PageType::PasswordReset),
        ("/dashboard", PageType::Dashboard),
        ("/settings", PageType::Settings),
        ("/profile", PageType::Profile),
        ("/account", PageType::Profile),
        ("/create", PageType::Create),
        ("/new", PageType::Create),
        ("/edit", PageType::Edit),
        ("/list", PageType::List),
    ];
    for (prefix, ty) in prefix_rules {
        if p.starts_with(prefix) {
            return *ty;
        }
    }

    let title_rules: &[(&str, PageType)] = &[
        ("login", PageType::Login),
        ("sign in", PageType::Login),
        ("register", PageType::Register),
        ("sign up", PageType::Register),
        ("dashboard", PageType::Dashboard),
        ("settings", PageType::Settings),
        ("profile", PageType::Profile),
    ];
    for (needle, ty) in title_rules {
        if t.contains(needle) {
            return *ty;
        }
    }

    let lower_html = html.to_lowercase();
    if lower_html.contains("name=\"password\"") && lower_html.contains("name=\"confirm") {
        return PageType::Register;
    }
    if lower_html.contains("name=\"password\"") && lower_html.contains("name=\"username\"") {
        return PageType::Login;
    }

    PageType::General
}

fn path_requires_auth(path: &str) -> bool {
    let p = path.to_lowercase();
    ["/dashboard", "/settings", "/profile", "/account", "/admin", "/create", "/edit"]
        .iter()
        .any(|prefix| p.starts_with(prefix))
}

/// Infers a button's action from its visible text, per the enumerated
/// substring mapping.
fn infer_button_action(text: &str) -> ButtonAction {
    let t = text.to_lowercase();
    let rules: &[(&str, ButtonAction)] = &[
        ("delete", ButtonAction::Delete),
        ("remove", ButtonAction::Delete),
        ("edit", ButtonAction::Edit),
        ("update", ButtonAction::Edit),
        ("cancel", ButtonAction::Cancel),
        ("log in", ButtonAction::Login),
        ("login", ButtonAction::Login),
        ("sign in", ButtonAction::Login),
        ("log out", ButtonAction::Logout),
        ("logout", ButtonAction::Logout),
        ("sign out", ButtonAction::Logout),
        ("search", ButtonAction::Search),
        ("download", ButtonAction::Download),
        ("upload", ButtonAction::Upload),
        ("submit", ButtonAction::Submit),
        ("save", ButtonAction::Submit),
        ("create", ButtonAction::Submit),
    ];
    for (needle, action) in rules {
        if t.contains(needle) {
            return *action;
        }
    }
    ButtonAction::Click
}

/// Computes the submit selector preference: `#id`, then a class containing
/// one of `{submit, login, register, signup}`, then `type='submit'`, else a
/// form-scoped fallback.
fn submit_selector_for(form_selector: &str, id: Option<&str>, classes: &[&str]) -> String {
    let mut candidates = Vec::new();
    if let Some(id) = id {
        candidates.push(format!("#{id}"));
    }
    for keyword in ["submit", "login", "register", "signup"] {
        if classes.iter().any(|c| c.contains(keyword)) {
            candidates.push(format!(".{keyword}"));
        }
    }
    candidates.push("[type='submit']".to_string());
    candidates.push(format!("{form_selector} button, {form_selector} input[type='submit']"));
    candidates.join(", ")
}

fn field_selector_for(id: Option<&str>, name: Option<&str>, field_type: &str) -> String {
    let mut candidates = Vec::new();
    if let Some(id) = id {
        candidates.push(format!("#{id}"));
    }
    if let Some(name) = name {
        candidates.push(format!("[name='{name}']"));
        candidates.push(format!("input[name='{name}']"));
    }
    candidates.push(format!("input[type='{field_type}']"));
    candidates.join(", ")
}

// The extraction functions below operate on raw HTML via a light regex-based
// scan rather than a DOM parser, matching this codebase's preference for
// direct, dependency-light text processing over a heavyweight library where
// a handful of targeted patterns suffice. A stronger implementation could
// swap in `scraper`/`html5ever` without changing any caller.

fn extract_forms(html: &str) -> Vec<Form> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    static FORM_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?is)<form([^>]*)>(.*?)</form>"#).unwrap()
    });
    static ATTR_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"id="([^"]+)""#).unwrap());
    static ATTR_ACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r#"action="([^"]+)""#).unwrap());
    static ATTR_METHOD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"method="([^"]+)""#).unwrap());
    static ATTR_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"class="([^"]+)""#).unwrap());
    static INPUT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<input([^>]*)/?>"#).unwrap());

    let mut forms = Vec::new();
    for (i, caps) in FORM_RE.captures_iter(html).enumerate() {
        let attrs = &caps[1];
        let body = &caps[2];
        let id = ATTR_ID.captures(attrs).map(|c| c[1].to_string());
        let action = ATTR_ACTION.captures(attrs).map(|c| c[1].to_string());
        let method = ATTR_METHOD.captures(attrs).map(|c| c[1].to_uppercase()).unwrap_or_else(|| "GET".to_string());
        let classes: Vec<String> = ATTR_CLASS.captures(attrs).map(|c| c[1].split_whitespace().map(String::from).collect()).unwrap_or_default();

        let form_selector = action
            .clone()
            .map(|a| format!("form[action='{a}']"))
            .or_else(|| id.clone().map(|i| format!("#{i}")))
            .or_else(|| classes.first().map(|c| format!("form.{c}")))
            .unwrap_or_else(|| format!("form:nth-of-type({})", i + 1));

        let mut fields = Vec::new();
        for input_caps in INPUT_RE.captures_iter(body) {
            let input_attrs = &input_caps[1];
            let field_type = extract_attr(input_attrs, "type").unwrap_or_else(|| "text".to_string());
            if field_type == "hidden" || field_type == "submit" {
                continue;
            }
            let field_id = extract_attr(input_attrs, "id");
            let name = extract_attr(input_attrs, "name");
            fields.push(Field {
                selector: field_selector_for(field_id.as_deref(), name.as_deref(), &field_type),
                field_type,
                placeholder: extract_attr(input_attrs, "placeholder"),
                required: input_attrs.contains("required"),
                name,
                id: field_id,
            });
        }

        let class_refs: Vec<&str> = classes.iter().map(|s| s.as_str()).collect();
        forms.push(Form {
            submit_selector: submit_selector_for(&form_selector, id.as_deref(), &class_refs),
            id,
            selector: form_selector,
            action,
            method,
            submit_text: None,
            fields,
        });
    }
    forms
}

fn extract_attr(attrs: &str, name: &str) -> Option<String> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    static CACHE: Lazy<std::sync::Mutex<HashMap<String, Regex>>> = Lazy::new(|| std::sync::Mutex::new(HashMap::new()));
    let mut cache = CACHE.lock().unwrap();
    let re = cache
        .entry(name.to_string())
        .or_insert_with(|| Regex::new(&format!(r#"{name}="([^"]*)""#)).unwrap())
        .clone();
    drop(cache);
    re.captures(attrs).map(|c| c[1].to_string())
}

fn extract_buttons(html: &str) -> Vec<Button> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    static BTN_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?is)<(button|a)\b([^>]*class="[^"]*(?:btn|button)[^"]*"[^>]*)>(.*?)</\1>"#).unwrap()
    });
    static STRIP_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").unwrap());

    let mut seen = HashSet::new();
    let mut buttons = Vec::new();
    for caps in BTN_RE.captures_iter(html) {
        let text = STRIP_TAGS.replace_all(&caps[3], "").trim().to_string();
        if text.is_empty() || !seen.insert(text.clone()) {
            continue;
        }
        let action = infer_button_action(&text);
        buttons.push(Button {
            selector: format!("button:has-text('{text}'), a:has-text('{text}')"),
            text,
            action,
        });
    }
    buttons
}

fn extract_standalone_inputs(html: &str) -> Vec<Input> {
    // Best-effort: inputs already captured inside `extract_forms` are not
    // re-listed here; this covers the common case of a single search box
    // outside any `<form>`.
    use once_cell::sync::Lazy;
    use regex::Regex;
    static INPUT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<input([^>]*)/?>"#).unwrap());
    let mut inputs = Vec::new();
    for caps in INPUT_RE.captures_iter(html) {
        let attrs = &caps[1];
        let input_type = extract_attr(attrs, "type").unwrap_or_else(|| "text".to_string());
        if input_type == "hidden" {
            continue;
        }
        let name = extract_attr(attrs, "name");
        inputs.push(Input {
            selector: field_selector_for(extract_attr(attrs, "id").as_deref(), name.as_deref(), &input_type),
            input_type,
            name,
        });
    }
    inputs
}

/// `Page.nav_links`: scoped to `nav a, header a, .sidebar a, .nav a,
/// [role=navigation] a`. Distinct from [`extract_crawl_links`], which feeds
/// the crawl frontier instead and is not scoped to these containers.
fn extract_nav_links(html: &str) -> Vec<NavLink> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    static NAV_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<nav\b[^>]*>(.*?)</nav>"#).unwrap());
    static HEADER_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<header\b[^>]*>(.*?)</header>"#).unwrap());
    static SIDEBAR_CLASS_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?is)<(\w+)\b[^>]*class="[^"]*\bsidebar\b[^"]*"[^>]*>(.*?)</\1>"#).unwrap());
    static NAV_CLASS_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?is)<(\w+)\b[^>]*class="[^"]*\bnav\b[^"]*"[^>]*>(.*?)</\1>"#).unwrap());
    static ROLE_NAV_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?is)<(\w+)\b[^>]*role="navigation"[^>]*>(.*?)</\1>"#).unwrap());

    let mut scoped_html = String::new();
    for caps in NAV_TAG_RE.captures_iter(html) {
        scoped_html.push_str(&caps[1]);
    }
    for caps in HEADER_TAG_RE.captures_iter(html) {
        scoped_html.push_str(&caps[1]);
    }
    for caps in SIDEBAR_CLASS_RE.captures_iter(html) {
        scoped_html.push_str(&caps[2]);
    }
    for caps in NAV_CLASS_RE.captures_iter(html) {
        scoped_html.push_str(&caps[2]);
    }
    for caps in ROLE_NAV_RE.captures_iter(html) {
        scoped_html.push_str(&caps[2]);
    }

    extract_links(&scoped_html)
}

/// The crawl frontier: every non-fragment, non-`javascript:` `<a href>`
/// anywhere on the page, resolved by the caller against the current URL.
/// Unlike `extract_nav_links` this is not scoped to nav-ish containers.
fn extract_crawl_links(html: &str) -> Vec<NavLink> {
    extract_links(html)
}

fn extract_links(html: &str) -> Vec<NavLink> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    static A_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?is)<a\b[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#).unwrap());
    static STRIP_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").unwrap());

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for caps in A_RE.captures_iter(html) {
        let href = caps[1].to_string();
        if href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        if !seen.insert(href.clone()) {
            continue;
        }
        let text = STRIP_TAGS.replace_all(&caps[2], "").trim().to_string();
        links.push(NavLink { text, href });
    }
    links
}

fn extract_modals(html: &str) -> Vec<Modal> {
    use once_cell::sync::Lazy;
    use regex::Regex;
    static MODAL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?is)<[^>]*(?:role="dialog"|class="[^"]*modal[^"]*"|data-modal|aria-modal="true")[^>]*>"#).unwrap()
    });
    static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"aria-label="([^"]+)""#).unwrap());

    MODAL_RE
        .find_iter(html)
        .map(|m| Modal {
            selector: "[role=dialog], .modal, [data-modal], [aria-modal=true]".to_string(),
            title: TITLE_RE.captures(m.as_str()).map(|c| c[1].to_string()),
        })
        .collect()
}

/// Groups pages into modules per a fixed module table.
fn group_into_modules(pages: &[Page]) -> HashMap<String, Module> {
    let table: &[(&str, &[PageType])] = &[
        ("auth", &[PageType::Login, PageType::Register, PageType::PasswordReset]),
        ("dashboard", &[PageType::Dashboard, PageType::Landing]),
        ("profile", &[PageType::Profile, PageType::Settings]),
        ("crud", &[PageType::Create, PageType::Edit, PageType::List, PageType::Detail]),
        ("general", &[PageType::General]),
    ];

    let mut modules: HashMap<String, Module> = HashMap::new();
    for (name, types) in table {
        let matching: Vec<&Page> = pages.iter().filter(|p| types.contains(&p.page_type)).collect();
        if matching.is_empty() {
            continue;
        }
        modules.insert(
            name.to_string(),
            Module {
                name: name.to_string(),
                requires_auth: matching.iter().any(|p| p.requires_auth),
                page_urls: matching.iter().map(|p| p.url.clone()).collect(),
            },
        );
    }
    modules
}
