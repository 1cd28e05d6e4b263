// Module: Loader
// Responsible for parsing and validating legacy HTTP-plan files for the
// dual-mode scenario shortcut (see executor::http_mode).

use crate::protocol::http_legacy::HttpPlan;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load_http_plan_from_file<P: AsRef<Path>>(path: P) -> Result<HttpPlan> {
    let content = fs::read_to_string(path).context("Failed to read plan file")?;
    let plan = serde_json::from_str(&content).context("Failed to parse plan JSON")?;
    Ok(plan)
}
