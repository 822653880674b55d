use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, ProviderKind};
use crate::errors::{MigrateError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_path: String,
    pub target_path: String,
    pub agents_dir: String,
    pub dry_run: bool,
    pub progress: bool,
    pub model: ModelConfig,
    pub database: DatabaseConfig,
    pub migration: MigrationConfig,
    pub analysis: AnalysisConfig,
    pub scan: ScanConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub file: String,
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub default_java_version: String,
    pub default_modernization_level: String,
    pub default_coverage_target: u32,
    pub max_source_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub source_extensions: Vec<String>,
    pub config_extensions: Vec<String>,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub synthesize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: "./legacy_java_project".into(),
            target_path: "./modernized_java_project".into(),
            agents_dir: "agents_config".into(),
            dry_run: false,
            progress: false,
            model: ModelConfig::default(),
            database: DatabaseConfig::default(),
            migration: MigrationConfig::default(),
            analysis: AnalysisConfig::default(),
            scan: ScanConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            name: "gpt-oss:120b-cloud".into(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 600,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { file: "agno.db".into(), history_limit: 6 }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            default_java_version: "17".into(),
            default_modernization_level: "high".into(),
            default_coverage_target: 80,
            max_source_bytes: 200_000,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay_ms: 500, max_delay_ms: 8_000 }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_extensions: vec!["java".into()],
            config_extensions: vec![
                "xml".into(), "properties".into(), "yml".into(), "yaml".into(), "json".into(),
            ],
            ignore: vec!["target".into(), ".git".into(), "*.class".into()],
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { synthesize: true }
    }
}

impl AnalysisConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Config {
    /// Parse a config file; the format follows the extension (`.toml`, else YAML).
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| MigrateError::Config(e.to_string()))?;
        let is_toml = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if is_toml {
            toml::from_str(&text)
                .map_err(|e| MigrateError::Config(format!("{}: {}", path.display(), e)))
        } else {
            serde_yaml::from_str(&text)
                .map_err(|e| MigrateError::Config(format!("{}: {}", path.display(), e)))
        }
    }

    /// An explicit path must exist; the default path may be absent.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match explicit {
            Some(p) => Self::from_file(Path::new(p)),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    info!(path = DEFAULT_CONFIG_PATH, "no config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(s) = &args.source { self.source_path = s.clone(); }
        if let Some(t) = &args.target { self.target_path = t.clone(); }
        if let Some(db) = &args.storage { self.database.file = db.clone(); }
        if let Some(p) = args.provider { self.model.provider = p; }
        if let Some(m) = &args.model { self.model.name = m.clone(); }
        if let Some(t) = args.timeout_secs { self.model.timeout_secs = t; }
        if args.dry_run { self.dry_run = true; }
        if args.no_report { self.report.synthesize = false; }
        if args.progress { self.progress = true; }
    }
}
