use anyhow::{anyhow, Context};
use fs_err as fs;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::analyzer::FileEntry;
use crate::config::MigrationConfig;
use crate::context;
use crate::extract::{extract_payload, ExtractionResult};
use crate::phase::PhaseOutcome;
use crate::prompt::MIGRATE_JAVA_CLASS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Migrated {
        path: String,
        output: ExtractionResult,
        #[serde(skip_serializing_if = "Option::is_none")]
        written: Option<PathBuf>,
    },
    Failed {
        path: String,
        reason: String,
    },
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Migrated { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub outcome: PhaseOutcome,
    pub files: Vec<FileOutcome>,
    pub bytes_written: u64,
}

impl MigrationReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_migrated()).count()
    }

    pub fn failed_paths(&self) -> Vec<String> {
        self.files.iter().filter(|f| !f.is_migrated()).map(|f| f.path().to_string()).collect()
    }
}

pub struct MigrationExecutor {
    agent: Agent,
    source_root: PathBuf,
    target_root: PathBuf,
    settings: MigrationConfig,
    dry_run: bool,
    progress: bool,
}

/// Turn a dotted package into relative directories, refusing anything that
/// would leave the target root.
fn package_dir(package: &str) -> anyhow::Result<PathBuf> {
    let mut out = PathBuf::new();
    for seg in package.split(|c: char| c == '.' || c == '/').filter(|s| !s.is_empty()) {
        let p = Path::new(seg);
        if !matches!(p.components().next(), Some(Component::Normal(_))) || p.components().count() != 1 {
            return Err(anyhow!("unsafe package segment '{seg}'"));
        }
        out.push(seg);
    }
    Ok(out)
}

fn plain_file_name(name: &str) -> anyhow::Result<&str> {
    let p = Path::new(name);
    match (p.components().next(), p.components().count()) {
        (Some(Component::Normal(_)), 1) => Ok(name),
        _ => Err(anyhow!("unsafe file name '{name}'")),
    }
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

impl MigrationExecutor {
    pub fn new(
        agent: Agent,
        source_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
        settings: MigrationConfig,
        dry_run: bool,
        progress: bool,
    ) -> Self {
        Self {
            agent,
            source_root: source_root.into(),
            target_root: target_root.into(),
            settings,
            dry_run,
            progress,
        }
    }

    /// Migrate every entry in order. A single file never stops the loop; only a
    /// target root that cannot be prepared aborts the phase.
    pub async fn migrate(&self, files: &[FileEntry]) -> MigrationReport {
        if !self.dry_run {
            if let Err(e) = fs::create_dir_all(&self.target_root) {
                warn!(target = %self.target_root.display(), error = %e, "migration phase aborted");
                return MigrationReport { outcome: PhaseOutcome::Aborted(e.to_string()), files: Vec::new(), bytes_written: 0 };
            }
        }

        let bar = if self.progress { ProgressBar::new(files.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
            bar.set_style(style);
        }

        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut bytes_written = 0u64;
        for (i, entry) in files.iter().enumerate() {
            info!(file = %entry.path, "[{}/{}] migrating", i + 1, total);
            bar.set_message(entry.path.clone());
            let outcome = match self.migrate_one(entry).await {
                Ok((output, written)) => {
                    if let Some((_, n)) = &written {
                        bytes_written += n;
                    }
                    FileOutcome::Migrated { path: entry.path.clone(), output, written: written.map(|(p, _)| p) }
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(file = %entry.path, error = %reason, "file migration failed");
                    FileOutcome::Failed { path: entry.path.clone(), reason }
                }
            };
            outcomes.push(outcome);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let report = MigrationReport { outcome: PhaseOutcome::Completed, files: outcomes, bytes_written };
        let failed = report.failed_paths();
        info!(migrated = report.succeeded(), failed = failed.len(), "migration completed for {} files", total);
        MigrationReport { outcome: PhaseOutcome::from_failures(failed), ..report }
    }

    async fn migrate_one(&self, entry: &FileEntry) -> anyhow::Result<(ExtractionResult, Option<(PathBuf, u64)>)> {
        let source = context::read_source(&self.source_root, &entry.path, self.settings.max_source_bytes);
        let source_code = source.map(|s| s.content).unwrap_or_default();
        let fallback_name = Path::new(&entry.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = if entry.file_name_suggestion.is_empty() { fallback_name.as_str() } else { &entry.file_name_suggestion };

        let vars = [
            ("file_path_to_read", entry.path.as_str()),
            ("file_name", file_name),
            ("file_path", entry.package_suggestion.as_str()),
            ("source_code", source_code.as_str()),
            ("java_version", self.settings.default_java_version.as_str()),
            ("modernization_level", self.settings.default_modernization_level.as_str()),
        ];
        let reply = self.agent.run(MIGRATE_JAVA_CLASS, &vars).await?;
        let payload = extract_payload(&reply)?;

        let written = match str_field(&payload, "code") {
            Some(code) if !self.dry_run => {
                let name = str_field(&payload, "file_name").unwrap_or(file_name);
                let package = str_field(&payload, "package").unwrap_or(&entry.package_suggestion);
                Some(self.write_migrated(package, name, code)?)
            }
            _ => None,
        };
        Ok((ExtractionResult::Parsed(payload), written))
    }

    fn write_migrated(&self, package: &str, file_name: &str, code: &str) -> anyhow::Result<(PathBuf, u64)> {
        let dir = self.target_root.join(package_dir(package)?);
        let abs = dir.join(plain_file_name(file_name)?);
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir).with_context(|| format!("temp file in {}", dir.display()))?;
        tmp.write_all(code.as_bytes())?;
        tmp.persist(&abs).with_context(|| format!("persisting {}", abs.display()))?;
        Ok((abs, code.len() as u64))
    }
}
