//! Markdown/HTML report rendering over a finished run's `Progress`.
//!
//! Grounded on `original_source/testbounty_agent/src/api_server.py`'s report
//! generation step: a flat pass/fail/skip tally plus a per-scenario table,
//! written to both `report.md` and `report.html` in the artifact tree. No
//! templating engine is pulled in for this; rendering stays plain string
//! building.

use crate::protocol::{Progress, Run, ScenarioStatus};

/// Counts of scenario outcomes, used by both renderers and by the caller to
/// decide the run's final `RunStatus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
}

impl Tally {
    pub fn from_progress(progress: &Progress) -> Self {
        let mut tally = Tally::default();
        for result in progress.results.values() {
            match result.status {
                ScenarioStatus::Passed => tally.passed += 1,
                ScenarioStatus::Failed => tally.failed += 1,
                ScenarioStatus::Skipped => tally.skipped += 1,
                ScenarioStatus::Pending | ScenarioStatus::Running => tally.pending += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.pending
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.pending == 0
    }
}

/// Renders a Markdown report for `run`/`progress`.
pub fn render_markdown(run: &Run, progress: &Progress) -> String {
    let tally = Tally::from_progress(progress);
    let mut out = String::new();

    out.push_str(&format!("# Test Report — {}\n\n", run.run_id));
    out.push_str(&format!("Target: `{}`\n\n", target_label(run)));
    out.push_str(&format!(
        "**{} passed**, **{} failed**, **{} skipped** out of {} scenario(s)\n\n",
        tally.passed,
        tally.failed,
        tally.skipped,
        tally.total()
    ));

    out.push_str("| Scenario | Status | Message |\n|---|---|---|\n");
    let mut names: Vec<&String> = progress.results.keys().collect();
    names.sort();
    for name in names {
        let result = &progress.results[name];
        out.push_str(&format!(
            "| {} | {:?} | {} |\n",
            result.name,
            result.status,
            result.message.as_deref().unwrap_or("-")
        ));
    }

    out
}

/// Renders the same report as a minimal standalone HTML document.
pub fn render_html(run: &Run, progress: &Progress) -> String {
    let tally = Tally::from_progress(progress);
    let mut rows = String::new();
    let mut names: Vec<&String> = progress.results.keys().collect();
    names.sort();
    for name in names {
        let result = &progress.results[name];
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{:?}</td><td>{}</td></tr>\n",
            html_escape(&result.name),
            result.status,
            html_escape(result.message.as_deref().unwrap_or("-"))
        ));
    }

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Test Report — {run_id}</title></head><body>\
<h1>Test Report — {run_id}</h1>\
<p>Target: <code>{target}</code></p>\
<p>{passed} passed, {failed} failed, {skipped} skipped out of {total} scenario(s)</p>\
<table border=\"1\"><thead><tr><th>Scenario</th><th>Status</th><th>Message</th></tr></thead><tbody>\n{rows}</tbody></table>\
</body></html>",
        run_id = run.run_id,
        target = html_escape(&target_label(run)),
        passed = tally.passed,
        failed = tally.failed,
        skipped = tally.skipped,
        total = tally.total(),
        rows = rows,
    )
}

fn target_label(run: &Run) -> String {
    match &run.target {
        crate::protocol::Target::Url(u) => u.clone(),
        crate::protocol::Target::LocalPath(p) => p.display().to_string(),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Credentials, RunMetadata, ScenarioResult, Target};
    use std::path::PathBuf;

    fn sample_run() -> Run {
        Run::new(Target::Url("https://x.test".into()), None::<Credentials>, RunMetadata::default(), &PathBuf::from("/tmp/scratch"), 3)
    }

    #[test]
    fn tally_counts_each_status_bucket() {
        let mut progress = Progress::new(2);
        progress.results.insert(
            "auth_001".into(),
            ScenarioResult { status: ScenarioStatus::Passed, name: "Login".into(), message: None, screenshot: None, video: None },
        );
        progress.results.insert(
            "auth_002".into(),
            ScenarioResult { status: ScenarioStatus::Failed, name: "Bad login".into(), message: Some("boom".into()), screenshot: None, video: None },
        );

        let tally = Tally::from_progress(&progress);
        assert_eq!(tally.passed, 1);
        assert_eq!(tally.failed, 1);
        assert!(!tally.all_passed());
    }

    #[test]
    fn markdown_report_includes_every_scenario_row() {
        let run = sample_run();
        let mut progress = Progress::new(1);
        progress.results.insert(
            "auth_001".into(),
            ScenarioResult { status: ScenarioStatus::Passed, name: "Login".into(), message: None, screenshot: None, video: None },
        );
        let md = render_markdown(&run, &progress);
        assert!(md.contains("Login"));
        assert!(md.contains("1 passed"));
    }

    #[test]
    fn html_report_escapes_message_content() {
        let run = sample_run();
        let mut progress = Progress::new(1);
        progress.results.insert(
            "auth_001".into(),
            ScenarioResult {
                status: ScenarioStatus::Failed,
                name: "Login".into(),
                message: Some("<script>alert(1)</script>".into()),
                screenshot: None,
                video: None,
            },
        );
        let html = render_html(&run, &progress);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
