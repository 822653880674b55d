//! Sequences analysis, migration and test generation for one run.
//!
//! ```text
//! Init -> Analyzing -> Migrating -> TestGenerating -> Done
//!   any state -> Failed   (error escaping a phase's own guard)
//! ```
//!
//! Phases never retry here; only the analyzer retries internally. On failure
//! the partial [`MigrationResults`] stay readable through [`MigrationCoordinator::results`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agent::Agent;
use crate::agent_config::AgentDefinition;
use crate::analyzer::{RetryPolicy, StructureAnalysis, StructureAnalyzer};
use crate::config::Config;
use crate::errors::{MigrateError, Result};
use crate::memory::Memory;
use crate::migrate::{MigrationExecutor, MigrationReport};
use crate::phase::{PhaseOutcome, RunStatus};
use crate::prompt::{CODE_ANALYZER, MIGRATION_SPECIALIST, REPORT_MANAGER, TEST_GENERATOR};
use crate::provider::DynProvider;
use crate::report::{self, ResultSynthesizer, SavedPaths};
use crate::testgen::{migrated_summary, TestGenerator, TestSuite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Init,
    Analyzing,
    Migrating,
    TestGenerating,
    Done,
    Failed,
}

/// Everything a run produced. Only keys of phases that finished are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<StructureAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSuite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Value>,
}

impl MigrationResults {
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.analysis.is_some() { keys.push("analysis"); }
        if self.migration.is_some() { keys.push("migration"); }
        if self.tests.is_some() { keys.push("tests"); }
        if self.report.is_some() { keys.push("report"); }
        keys
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Degraded as soon as any finished phase did not complete cleanly.
    pub fn status(&self) -> RunStatus {
        let clean = self.migration.as_ref().map(|m| m.outcome.is_clean()).unwrap_or(true)
            && self.tests.as_ref().map(|t| t.outcome.is_clean()).unwrap_or(true);
        if clean { RunStatus::Completed } else { RunStatus::CompletedWithFailures }
    }
}

pub struct MigrationCoordinator {
    run_id: String,
    source_path: String,
    target_path: PathBuf,
    analyzer: StructureAnalyzer,
    executor: MigrationExecutor,
    test_generator: TestGenerator,
    synthesizer: Option<ResultSynthesizer>,
    state: CoordinatorState,
    results: MigrationResults,
}

impl MigrationCoordinator {
    /// Open agent memory at the configured storage handle, load the four agent
    /// personas and prime them.
    pub async fn from_config(cfg: &Config, provider: DynProvider) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let memory = Arc::new(Memory::open(&cfg.database.file)?);
        let agents_dir = Path::new(&cfg.agents_dir);

        info!(run_id = %run_id, storage = %cfg.database.file, "initializing migration team");
        let make = |name: &str| -> Result<Agent> {
            let def = AgentDefinition::load(agents_dir, name)?;
            Ok(Agent::new(def, provider.clone(), Some(memory.clone()), run_id.clone(), cfg.database.history_limit))
        };
        let analyst = make(CODE_ANALYZER)?;
        let migrator = make(MIGRATION_SPECIALIST)?;
        let tester = make(TEST_GENERATOR)?;
        let reporter = if cfg.report.synthesize { Some(make(REPORT_MANAGER)?) } else { None };

        for agent in [Some(&analyst), Some(&migrator), Some(&tester), reporter.as_ref()].into_iter().flatten() {
            if !agent.prime().await {
                warn!(agent = agent.name(), "continuing without identity priming");
            }
        }
        info!("all agents initialized");

        Ok(Self {
            run_id,
            source_path: cfg.source_path.clone(),
            target_path: PathBuf::from(&cfg.target_path),
            analyzer: StructureAnalyzer::new(analyst, cfg.scan.clone(), RetryPolicy::from(&cfg.analysis)),
            executor: MigrationExecutor::new(
                migrator,
                &cfg.source_path,
                &cfg.target_path,
                cfg.migration.clone(),
                cfg.dry_run,
                cfg.progress,
            ),
            test_generator: TestGenerator::new(tester, cfg.migration.clone()),
            synthesizer: reporter.map(ResultSynthesizer::new),
            state: CoordinatorState::Init,
            results: MigrationResults::default(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn results(&self) -> &MigrationResults {
        &self.results
    }

    fn fail<T>(&mut self, e: MigrateError) -> Result<T> {
        error!(state = ?self.state, error = %e, "migration run failed");
        self.state = CoordinatorState::Failed;
        Err(e)
    }

    pub async fn run(&mut self) -> Result<RunStatus> {
        if self.state != CoordinatorState::Init {
            return Err(MigrateError::Coordinator(format!("run already executed (state {:?})", self.state)));
        }
        info!(source = %self.source_path, target = %self.target_path.display(), "starting migration process");

        self.state = CoordinatorState::Analyzing;
        info!("phase 1: code analysis");
        let analyzed = self.analyzer.analyze(&self.source_path).await;
        match analyzed {
            Ok(analysis) => self.results.analysis = Some(analysis),
            Err(e) => return self.fail(e),
        }
        info!("code analysis completed");

        self.state = CoordinatorState::Migrating;
        let files = match self.results.analysis.as_ref() {
            Some(a) => a.files.clone(),
            None => return self.fail(MigrateError::Coordinator("analysis results missing".into())),
        };
        info!(files = files.len(), "phase 2: code migration");
        let migration = self.executor.migrate(&files).await;
        if let PhaseOutcome::Aborted(cause) = &migration.outcome {
            warn!(%cause, "migration phase aborted, continuing degraded");
        }
        self.results.migration = Some(migration);

        self.state = CoordinatorState::TestGenerating;
        info!("phase 3: test generation");
        let summary = migrated_summary(self.results.migration.as_ref());
        self.results.tests = Some(self.test_generator.generate_all(&summary).await);

        if let Some(synth) = &self.synthesizer {
            match synth.synthesize(&self.results.to_value()).await {
                Ok(report) => self.results.report = Some(report),
                Err(e) => warn!(error = %e, "final report synthesis failed"),
            }
        }

        self.state = CoordinatorState::Done;
        let status = self.results.status();
        info!(status = ?status, "migration process completed");
        Ok(status)
    }

    /// Persist whatever the run produced, including partial results after a failure.
    pub fn save(&self) -> anyhow::Result<SavedPaths> {
        report::save_run(&self.target_path, &self.run_id, &self.results.to_value())
    }
}
