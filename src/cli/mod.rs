use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    Anthropic,
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "vibe_migrate", version, about = "Multi-agent legacy Java migration: analyze, migrate, generate tests")]
pub struct Args {
    /// Config file (YAML or TOML). Defaults to ./config.yml when present.
    #[arg(long)]
    pub config: Option<String>,

    /// Legacy project to analyze.
    #[arg(long)]
    pub source: Option<String>,

    /// Where migrated sources and reports are written.
    #[arg(long)]
    pub target: Option<String>,

    /// SQLite file for agent memory (`:memory:` for none on disk).
    #[arg(long)]
    pub storage: Option<String>,

    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Skip the final synthesized report.
    #[arg(long, default_value_t = false)]
    pub no_report: bool,

    #[arg(long, default_value_t = false)]
    pub progress: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
