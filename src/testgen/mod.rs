use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::config::MigrationConfig;
use crate::extract::{extract_or_fallback, ExtractionResult};
use crate::migrate::{FileOutcome, MigrationReport};
use crate::phase::PhaseOutcome;
use crate::prompt::{GENERATE_BDD_SCENARIOS, GENERATE_UNIT_TESTS};

pub const BDDS_KEY: &str = "bdds";
pub const UNIT_TESTS_KEY: &str = "test_units";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    pub outcome: PhaseOutcome,
    #[serde(rename = "bdds", skip_serializing_if = "Option::is_none")]
    pub bdds: Option<ExtractionResult>,
    #[serde(rename = "test_units", skip_serializing_if = "Option::is_none")]
    pub unit_tests: Option<ExtractionResult>,
}

pub struct TestGenerator {
    agent: Agent,
    settings: MigrationConfig,
}

/// What the test agent gets to see of the migration: successful files only.
pub fn migrated_summary(report: Option<&MigrationReport>) -> Value {
    let files: Vec<Value> = report
        .map(|r| r.files.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(|f| match f {
            FileOutcome::Migrated { path, output, .. } => Some(json!({ "path": path, "result": output })),
            FileOutcome::Failed { .. } => None,
        })
        .collect();
    Value::Array(files)
}

impl TestGenerator {
    pub fn new(agent: Agent, settings: MigrationConfig) -> Self {
        Self { agent, settings }
    }

    async fn generate(&self, prompt_name: &str, key: &str, migrated: &str) -> Option<ExtractionResult> {
        let coverage = self.settings.default_coverage_target.to_string();
        let vars = [
            ("migrated_files", migrated),
            ("coverage_target", coverage.as_str()),
            ("java_version", self.settings.default_java_version.as_str()),
        ];
        match self.agent.run(prompt_name, &vars).await {
            Ok(text) => {
                let result = extract_or_fallback(&text);
                if !result.is_parsed() {
                    warn!(kind = key, "test output not in expected JSON format, kept raw");
                }
                Some(result)
            }
            Err(e) => {
                warn!(kind = key, error = %e, "test generation failed");
                None
            }
        }
    }

    /// BDD scenarios, then unit tests. Either may fail without blocking the other.
    pub async fn generate_all(&self, migrated: &Value) -> TestSuite {
        let migrated = serde_json::to_string_pretty(migrated).unwrap_or_else(|_| "[]".into());

        info!("generating BDD scenarios");
        let bdds = self.generate(GENERATE_BDD_SCENARIOS, BDDS_KEY, &migrated).await;
        info!("generating unit tests");
        let unit_tests = self.generate(GENERATE_UNIT_TESTS, UNIT_TESTS_KEY, &migrated).await;

        let mut failed = Vec::new();
        if bdds.is_none() { failed.push(BDDS_KEY.to_string()); }
        if unit_tests.is_none() { failed.push(UNIT_TESTS_KEY.to_string()); }
        info!("test generation completed");

        TestSuite { outcome: PhaseOutcome::from_failures(failed), bdds, unit_tests }
    }
}
