//! Deterministic filesystem layout for per-run artifacts.
//!
//! All paths a component ever touches are derived from this module; nothing
//! constructs an ad-hoc path outside the tree it describes. Grounded on
//! `original_source/testbounty_agent/src/api_server.py`'s `filename_map` and
//! directory conventions (`testsprite_tests/generated_tests/{videos,
//! screenshots}`, `reports/report.{md,html}`).

use std::path::{Path, PathBuf};

/// Handle to one run's artifact subtree, rooted at `<scratch>/<run_id>/`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    run_root: PathBuf,
}

impl ArtifactStore {
    pub fn new(scratch_root: impl AsRef<Path>, run_id: &str) -> Self {
        Self { run_root: scratch_root.as_ref().join(run_id) }
    }

    fn tests_root(&self) -> PathBuf {
        self.run_root.join("testsprite_tests")
    }

    pub fn config_json(&self) -> PathBuf {
        self.tests_root().join("config.json")
    }
    pub fn code_summary_json(&self) -> PathBuf {
        self.tests_root().join("code_summary.json")
    }
    pub fn standard_prd_json(&self) -> PathBuf {
        self.tests_root().join("standard_prd.json")
    }
    pub fn frontend_test_plan_json(&self) -> PathBuf {
        self.tests_root().join("frontend_test_plan.json")
    }
    pub fn backend_test_plan_json(&self) -> PathBuf {
        self.tests_root().join("backend_test_plan.json")
    }
    pub fn security_test_plan_json(&self) -> PathBuf {
        self.tests_root().join("security_test_plan.json")
    }
    pub fn test_credentials_json(&self) -> PathBuf {
        self.tests_root().join("test_credentials.json")
    }
    pub fn execution_progress_json(&self) -> PathBuf {
        self.tests_root().join("execution_progress.json")
    }

    fn generated_tests_root(&self) -> PathBuf {
        self.tests_root().join("generated_tests")
    }

    /// Path for a scenario's exported source, only written if code export is
    /// requested.
    pub fn test_code_py(&self, scenario_id: &str) -> PathBuf {
        self.generated_tests_root().join(format!("test_{scenario_id}.py"))
    }

    pub fn videos_dir(&self, scenario_id: &str) -> PathBuf {
        self.generated_tests_root().join("videos").join(scenario_id)
    }

    pub fn screenshot(&self, scenario_id: &str, label: &str) -> PathBuf {
        self.generated_tests_root()
            .join("screenshots")
            .join(format!("{scenario_id}_{label}.png"))
    }

    /// Best-effort lookup of a recorded video for `scenario_id`: the first
    /// `.webm` file found under its `videos_dir`, if any. No component in
    /// this crate currently writes one there (see `DESIGN.md`); this exists
    /// so a scenario result can still report a video produced by an
    /// external recording sidecar without the executor needing to know how
    /// it got there.
    pub fn locate_video(&self, scenario_id: &str) -> Option<PathBuf> {
        std::fs::read_dir(self.videos_dir(scenario_id))
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("webm"))
    }

    pub fn report_md(&self) -> PathBuf {
        self.tests_root().join("reports").join("report.md")
    }

    pub fn report_html(&self) -> PathBuf {
        self.tests_root().join("reports").join("report.html")
    }

    /// Creates every directory this run will ever write into. Called once
    /// at bootstrap; later writes assume the tree already exists.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [
            self.tests_root(),
            self.generated_tests_root(),
            self.generated_tests_root().join("videos"),
            self.generated_tests_root().join("screenshots"),
            self.tests_root().join("reports"),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Removes the entire run subtree. Called by `DELETE /run/{id}`
    /// (out of scope here, but the operation itself is part of the core
    /// contract).
    pub fn remove_all(&self) -> std::io::Result<()> {
        if self.run_root.exists() {
            std::fs::remove_dir_all(&self.run_root)?;
        }
        Ok(())
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }
}
