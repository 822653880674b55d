use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::config::{AnalysisConfig, ScanConfig};
use crate::errors::{MigrateError, Result};
use crate::extract::extract_as;
use crate::prompt::ANALYZE_PROJECT_STRUCTURE;
use crate::scan::{self, ProjectStructure};

/// Agent-suggested destination for one legacy file. Not checked against disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub file_name_suggestion: String,
    #[serde(default)]
    pub package_suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub structure: ProjectStructure,
    pub files: Vec<FileEntry>,
    /// Model calls it took to get a usable answer.
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, base_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Pause after failed attempt `attempt` (1-based): base * 2^(attempt-1), capped.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl From<&AnalysisConfig> for RetryPolicy {
    fn from(c: &AnalysisConfig) -> Self {
        Self { max_attempts: c.max_attempts, base_delay: c.base_delay(), max_delay: c.max_delay() }
    }
}

#[derive(Deserialize)]
struct FilesPayload {
    files: Value,
}

/// Accepts `{"files": {"<path>": {...}}}` or `{"files": [{"path": ..}, ..]}`.
/// Object order is kept as the model wrote it.
pub fn parse_file_list(text: &str) -> std::result::Result<Vec<FileEntry>, String> {
    let FilesPayload { files } = extract_as(text).map_err(|e| format!("{e} (expected a 'files' field)"))?;

    let entries = match &files {
        Value::Object(map) => map
            .iter()
            .map(|(path, info)| {
                let mut info = info.clone();
                let obj = info.as_object_mut().ok_or_else(|| format!("entry for {path} is not an object"))?;
                obj.insert("path".into(), Value::String(path.clone()));
                serde_json::from_value::<FileEntry>(info).map_err(|e| format!("entry for {path}: {e}"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Value::Array(_) => serde_json::from_value::<Vec<FileEntry>>(files.clone())
            .map_err(|e| format!("bad file list: {e}"))?,
        _ => return Err("'files' is neither an object nor a list".into()),
    };

    if entries.is_empty() {
        return Err("empty file list".into());
    }
    Ok(entries)
}

pub struct StructureAnalyzer {
    agent: Agent,
    scan: ScanConfig,
    retry: RetryPolicy,
    cached: Option<StructureAnalysis>,
}

impl StructureAnalyzer {
    pub fn new(agent: Agent, scan: ScanConfig, retry: RetryPolicy) -> Self {
        Self { agent, scan, retry, cached: None }
    }

    pub fn cached(&self) -> Option<&StructureAnalysis> {
        self.cached.as_ref()
    }

    /// Scan `source_path` once, then ask the analyst until it names at least one
    /// file or the retry budget runs out.
    pub async fn analyze(&mut self, source_path: &str) -> Result<StructureAnalysis> {
        let root = Path::new(source_path);
        let structure = scan::scan_project(root, &self.scan)
            .map_err(|e| MigrateError::Coordinator(format!("scanning {source_path}: {e:#}")))?;
        let imports = scan::collect_imports(root, &structure);
        info!(
            source = source_path,
            files = structure.file_count(),
            sources = structure.source_files.len(),
            configs = structure.config_files.len(),
            others = structure.other_files.len(),
            "project scanned"
        );

        let structure_json = serde_json::to_string_pretty(&structure).unwrap_or_default();
        let imports_json = serde_json::to_string_pretty(&imports).unwrap_or_default();
        let vars = [
            ("src", source_path),
            ("structure", structure_json.as_str()),
            ("imports", imports_json.as_str()),
        ];

        let max = self.retry.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=max {
            let outcome = match self.agent.run(ANALYZE_PROJECT_STRUCTURE, &vars).await {
                Ok(text) => parse_file_list(&text),
                // Bad prompt config will not improve with retries.
                Err(e @ MigrateError::Config(_)) => return Err(e),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(files) => {
                    info!(files = files.len(), attempts = attempt, "structure analysis accepted");
                    let analysis = StructureAnalysis { structure, files, attempts: attempt };
                    self.cached = Some(analysis.clone());
                    return Ok(analysis);
                }
                Err(reason) => {
                    warn!(attempt, max_attempts = max, %reason, "structure analysis unusable, retrying");
                    last_error = reason;
                    if attempt < max {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        Err(MigrateError::AnalysisExhausted { attempts: max, last_error })
    }
}
