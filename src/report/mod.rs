use fs_err as fs;
use serde_json::{json, to_string_pretty, Value};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::agent::Agent;
use crate::errors::Result;
use crate::extract::extract_payload;
use crate::prompt::SYNTHESIZE_RESULTS;

pub const REPORTS_DIR: &str = "migration_reports";

pub struct ResultSynthesizer {
    agent: Agent,
}

impl ResultSynthesizer {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    /// One model call over the aggregated results. Structured replies are
    /// returned as-is; anything else is wrapped as `{"final_report": text}`.
    pub async fn synthesize(&self, phase_results: &Value) -> Result<Value> {
        info!("synthesizing results from all agents");
        let results = to_string_pretty(phase_results).unwrap_or_default();
        let text = self.agent.run(SYNTHESIZE_RESULTS, &[("agent_results", results.as_str())]).await?;
        Ok(extract_payload(&text).unwrap_or_else(|_| json!({ "final_report": text })))
    }
}

pub struct SavedPaths {
    pub dir: PathBuf,
    pub results: PathBuf,
    pub report: Option<PathBuf>,
}

pub fn run_dir(target_root: &Path, run_id: &str) -> PathBuf {
    target_root.join(REPORTS_DIR).join(run_id)
}

/// Write `results.json` (and `report.json` when present) for one run.
pub fn save_run(target_root: &Path, run_id: &str, results: &Value) -> anyhow::Result<SavedPaths> {
    let dir = run_dir(target_root, run_id);
    fs::create_dir_all(&dir)?;

    let results_path = dir.join("results.json");
    fs::write(&results_path, to_string_pretty(results)?)?;

    let report_path = match results.get("report") {
        Some(report) => {
            let p = dir.join("report.json");
            fs::write(&p, to_string_pretty(report)?)?;
            Some(p)
        }
        None => None,
    };

    Ok(SavedPaths { dir, results: results_path, report: report_path })
}
