//! Runtime configuration for a run: crawl bound, retry bound, concurrency
//! cap, headless mode, timeouts. Same shape as `limits::ExecutionLimits`
//! (default / `from_env()` / `strict()` / `relaxed()`), generalized from
//! "plan execution limits" to "run configuration" since this crate drives
//! one end-to-end run rather than one flat step plan.

use std::time::Duration;

/// Bound on Explorer visit count.
pub const DEFAULT_MAX_PAGES: usize = 40;

/// Fix-loop iterations (`Run.max_retries`).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// How many runs may execute concurrently.
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 4;

pub const DEFAULT_MAX_SCENARIO_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_STEP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SELECTOR_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_RUN_DEADLINE_SECS: u64 = 30 * 60;
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Bound on Explorer visit count.
    pub max_pages: usize,
    /// `fix_tests` retry bound on the orchestrator's conditional loop.
    pub max_retries: u32,
    /// Concurrent runs permitted process-wide.
    pub max_concurrent_runs: usize,
    /// Whether the browser driver launches headless.
    pub headless: bool,
    /// Hard per-scenario cap.
    pub max_scenario_timeout: Duration,
    /// Per-step cap for navigate/fill/click.
    pub max_step_timeout: Duration,
    /// Per-selector timeout inside a selector preference list.
    pub selector_timeout: Duration,
    /// Top-level run deadline.
    pub run_deadline: Duration,
    /// WebDriver endpoint (chromedriver/geckodriver) the browser driver
    /// connects to.
    pub webdriver_url: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_retries: DEFAULT_MAX_RETRIES,
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            headless: true,
            max_scenario_timeout: Duration::from_secs(DEFAULT_MAX_SCENARIO_TIMEOUT_SECS),
            max_step_timeout: Duration::from_secs(DEFAULT_MAX_STEP_TIMEOUT_SECS),
            selector_timeout: Duration::from_secs(DEFAULT_SELECTOR_TIMEOUT_SECS),
            run_deadline: Duration::from_secs(DEFAULT_RUN_DEADLINE_SECS),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// Supported variables:
    /// - `TESTPILOT_MAX_PAGES`
    /// - `TESTPILOT_MAX_RETRIES`
    /// - `TESTPILOT_MAX_CONCURRENT_RUNS`
    /// - `TESTPILOT_HEADLESS` (`true`/`false`)
    /// - `TESTPILOT_MAX_SCENARIO_TIMEOUT_SECS`
    /// - `TESTPILOT_MAX_STEP_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("TESTPILOT_MAX_PAGES") {
            if let Ok(n) = v.parse() {
                cfg.max_pages = n;
            }
        }
        if let Ok(v) = std::env::var("TESTPILOT_MAX_RETRIES") {
            if let Ok(n) = v.parse() {
                cfg.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("TESTPILOT_MAX_CONCURRENT_RUNS") {
            if let Ok(n) = v.parse() {
                cfg.max_concurrent_runs = n;
            }
        }
        if let Ok(v) = std::env::var("TESTPILOT_HEADLESS") {
            if let Ok(b) = v.parse() {
                cfg.headless = b;
            }
        }
        if let Ok(v) = std::env::var("TESTPILOT_MAX_SCENARIO_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                cfg.max_scenario_timeout = Duration::from_secs(n);
            }
        }
        if let Ok(v) = std::env::var("TESTPILOT_MAX_STEP_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                cfg.max_step_timeout = Duration::from_secs(n);
            }
        }
        if let Ok(v) = std::env::var("TESTPILOT_WEBDRIVER_URL") {
            cfg.webdriver_url = v;
        }

        cfg
    }

    /// Tight bounds for integration tests: small crawl, no retries, short
    /// timeouts so a hung selector fails the test quickly instead of
    /// stalling the suite.
    pub fn strict() -> Self {
        Self {
            max_pages: 5,
            max_retries: 0,
            max_concurrent_runs: 1,
            headless: true,
            max_scenario_timeout: Duration::from_secs(10),
            max_step_timeout: Duration::from_secs(3),
            selector_timeout: Duration::from_secs(1),
            run_deadline: Duration::from_secs(60),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
        }
    }

    /// Permissive bounds for exploratory/manual runs against large sites.
    pub fn relaxed() -> Self {
        Self {
            max_pages: 200,
            max_retries: 5,
            max_concurrent_runs: 8,
            headless: true,
            max_scenario_timeout: Duration::from_secs(180),
            max_step_timeout: Duration::from_secs(45),
            selector_timeout: Duration::from_secs(5),
            run_deadline: Duration::from_secs(3600),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
        }
    }

    /// Whether any LLM enrichment provider environment variable is set.
    pub fn enrichment_available() -> bool {
        ["OPENAI_API_KEY", "ANTHROPIC_API_KEY", "GOOGLE_API_KEY"]
            .iter()
            .any(|k| std::env::var(k).map(|v| !v.is_empty()).unwrap_or(false))
    }
}
