//! Thin wrapper over a headless browser: navigate, query,
//! fill, click, screenshot, record.
//!
//! No example repo in the corpus depends on a WebDriver/CDP crate, so this
//! module adds `fantoccini` (async, tokio-native, speaks the WebDriver wire
//! protocol to a local `chromedriver`/`geckodriver`) — the one new
//! third-party dependency this crate carries beyond its inherited stack; see
//! `DESIGN.md`. Sandbox flags mirror
//! `original_source/testbounty_agent/src/testing_engine/browser_automation.py`'s
//! `["--no-sandbox", "--disable-setuid-sandbox"]`.

use anyhow::Result;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Driver-level errors, distinct from scenario-level ones in `errors::`
/// since `SelectorNotFound` here carries the full attempted selector list
/// carries the full attempted selector list so a failure is debuggable.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation to '{url}' failed: {source}")]
    NavigationFailed { url: String, #[source] source: anyhow::Error },

    #[error("no selector in [{}] resolved within the per-selector timeout", attempted.join(", "))]
    SelectorNotFound { attempted: Vec<String> },

    #[error("browser operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A comma-separated ordered list of CSS selectors, tried in order with a
/// bounded per-selector timeout.
#[derive(Debug, Clone)]
pub struct SelectorList(Vec<String>);

impl SelectorList {
    pub fn parse(raw: &str) -> Self {
        Self(raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
    }

    pub fn single(selector: impl Into<String>) -> Self {
        Self(vec![selector.into()])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Capability-level browser interface; the orchestrator and Scenario
/// Executor depend only on this trait so the WebDriver backend can be
/// swapped without touching call sites; the orchestrator depends only on
/// this trait, not on any particular backend.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<(), DriverError>;
    async fn resolve(&self, selectors: &SelectorList, per_selector_timeout: Duration) -> Result<(), DriverError>;
    async fn fill(&self, selectors: &SelectorList, value: &str, per_selector_timeout: Duration) -> Result<(), DriverError>;
    async fn click(&self, selectors: &SelectorList, per_selector_timeout: Duration) -> Result<(), DriverError>;
    async fn wait_load_state(&self, timeout_ms: u64) -> Result<(), DriverError>;
    async fn wait_ms(&self, ms: u64);
    async fn screenshot(&self, path: &std::path::Path) -> Result<(), DriverError>;
    async fn inner_text(&self, selector: &str) -> Result<String, DriverError>;
    async fn evaluate_js(&self, snippet: &str) -> Result<Value, DriverError>;
    async fn content(&self) -> Result<String, DriverError>;
    async fn title(&self) -> Result<String, DriverError>;
    async fn url(&self) -> Result<String, DriverError>;
    async fn close(self: Box<Self>) -> Result<()>;
}

/// `fantoccini`-backed implementation. One `FantocciniDriver` = one browser
/// context = one page, matching the orchestrator's "one context per run; one
/// page per scenario (closed on scenario end)" — callers construct a fresh
/// driver per scenario and drop it when the scenario ends.
pub struct FantocciniDriver {
    client: Client,
}

impl FantocciniDriver {
    /// Connects to a WebDriver session already listening at `webdriver_url`
    /// (e.g. `http://localhost:9515` for chromedriver). Launch flags are the
    /// responsibility of the chromedriver/geckodriver invocation, which the
    /// orchestrator starts once per run with `--no-sandbox
    /// --disable-setuid-sandbox`-equivalent capabilities and never a visible
    /// UI when `headless` is set.
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut caps = serde_json::map::Map::new();
        let chrome_args = if headless {
            serde_json::json!(["--headless=new", "--no-sandbox", "--disable-setuid-sandbox", "--window-size=1280,720"])
        } else {
            serde_json::json!(["--no-sandbox", "--disable-setuid-sandbox", "--window-size=1280,720"])
        };
        caps.insert("goog:chromeOptions".to_string(), serde_json::json!({ "args": chrome_args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;
        Ok(Self { client })
    }

    async fn resolve_locator(&self, selectors: &SelectorList, per_selector_timeout: Duration) -> Result<fantoccini::elements::Element, DriverError> {
        let mut attempted = Vec::new();
        for selector in selectors.as_slice() {
            attempted.push(selector.clone());
            let found = timeout(per_selector_timeout, self.client.find(Locator::Css(selector))).await;
            if let Ok(Ok(el)) = found {
                return Ok(el);
            }
        }
        Err(DriverError::SelectorNotFound { attempted })
    }
}

#[async_trait]
impl BrowserDriver for FantocciniDriver {
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<(), DriverError> {
        timeout(Duration::from_millis(timeout_ms), self.client.goto(url))
            .await
            .map_err(|_| DriverError::Timeout(Duration::from_millis(timeout_ms)))?
            .map_err(|e| DriverError::NavigationFailed { url: url.to_string(), source: e.into() })
    }

    async fn resolve(&self, selectors: &SelectorList, per_selector_timeout: Duration) -> Result<(), DriverError> {
        self.resolve_locator(selectors, per_selector_timeout).await.map(|_| ())
    }

    async fn fill(&self, selectors: &SelectorList, value: &str, per_selector_timeout: Duration) -> Result<(), DriverError> {
        let mut el = self.resolve_locator(selectors, per_selector_timeout).await?;
        el.clear().await.map_err(anyhow::Error::from)?;
        el.send_keys(value).await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn click(&self, selectors: &SelectorList, per_selector_timeout: Duration) -> Result<(), DriverError> {
        let el = self.resolve_locator(selectors, per_selector_timeout).await?;
        el.click().await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn wait_load_state(&self, timeout_ms: u64) -> Result<(), DriverError> {
        // fantoccini has no native `networkidle` wait; poll `document.readyState`.
        let deadline = Duration::from_millis(timeout_ms);
        let poll = async {
            loop {
                let state = self.client.execute("return document.readyState", vec![]).await.map_err(anyhow::Error::from)?;
                if state.as_str() == Some("complete") {
                    return Ok::<(), anyhow::Error>(());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        timeout(deadline, poll)
            .await
            .map_err(|_| DriverError::Timeout(deadline))?
            .map_err(DriverError::from)
    }

    async fn wait_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    async fn screenshot(&self, path: &std::path::Path) -> Result<(), DriverError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
        }
        let png = self.client.screenshot().await.map_err(anyhow::Error::from)?;
        std::fs::write(path, png).map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<String, DriverError> {
        let el = self.client.find(Locator::Css(selector)).await.map_err(anyhow::Error::from)?;
        el.text().await.map_err(|e| DriverError::from(anyhow::Error::from(e)))
    }

    async fn evaluate_js(&self, snippet: &str) -> Result<Value, DriverError> {
        self.client.execute(snippet, vec![]).await.map_err(|e| DriverError::from(anyhow::Error::from(e)))
    }

    async fn content(&self) -> Result<String, DriverError> {
        self.client.source().await.map_err(|e| DriverError::from(anyhow::Error::from(e)))
    }

    async fn title(&self) -> Result<String, DriverError> {
        self.client.title().await.map_err(|e| DriverError::from(anyhow::Error::from(e)))
    }

    async fn url(&self) -> Result<String, DriverError> {
        self.client.current_url().await.map(|u| u.to_string()).map_err(|e| DriverError::from(anyhow::Error::from(e)))
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_list_splits_and_trims() {
        let list = SelectorList::parse("#id, [name='x'] , input[type='text']");
        assert_eq!(list.as_slice(), &["#id".to_string(), "[name='x']".to_string(), "input[type='text']".to_string()]);
    }

    #[test]
    fn selector_list_drops_empty_entries() {
        let list = SelectorList::parse("#id,,  ");
        assert_eq!(list.as_slice(), &["#id".to_string()]);
    }
}
