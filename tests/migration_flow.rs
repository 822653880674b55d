mod common;

use common::{legacy_project, test_config, Scripted, EMPTY_FILES, TWO_FILES};
use serde_json::json;

use vibe_migrate::coordinator::{CoordinatorState, MigrationCoordinator};
use vibe_migrate::errors::MigrateError;
use vibe_migrate::migrate::FileOutcome;
use vibe_migrate::phase::{PhaseOutcome, RunStatus};
use vibe_migrate::prompt::{ANALYZE_PROJECT_STRUCTURE, GENERATE_BDD_SCENARIOS, MIGRATE_JAVA_CLASS, SYNTHESIZE_RESULTS};

#[tokio::test]
async fn full_run_migrates_every_file_and_writes_all_keys() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());
    let target = out.path().join("modern");

    let provider = Scripted::new(&[TWO_FILES]).shared();
    let cfg = test_config(src.path(), &target);
    let mut team = MigrationCoordinator::from_config(&cfg, provider.clone()).await.unwrap();
    assert_eq!(team.state(), CoordinatorState::Init);

    let status = team.run().await.unwrap();
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(team.state(), CoordinatorState::Done);

    let results = team.results();
    assert_eq!(results.keys(), vec!["analysis", "migration", "tests", "report"]);
    let analysis = results.analysis.as_ref().unwrap();
    assert_eq!(analysis.files.len(), 2);
    assert_eq!(analysis.attempts, 1);
    assert_eq!(analysis.structure.source_files, vec!["src/A.java", "src/B.java"]);

    let migration = results.migration.as_ref().unwrap();
    assert_eq!(migration.outcome, PhaseOutcome::Completed);
    assert_eq!(migration.succeeded(), 2);
    assert_eq!(provider.count(MIGRATE_JAVA_CLASS), 2);

    let written = std::fs::read_to_string(target.join("com/demo/A.java")).unwrap();
    assert!(written.contains("public class A"));
    assert!(target.join("com/demo/B.java").is_file());

    let tests = results.tests.as_ref().unwrap();
    assert!(tests.bdds.as_ref().unwrap().is_parsed());
    // Free text from the model is kept raw, not treated as a failure.
    assert!(!tests.unit_tests.as_ref().unwrap().is_parsed());
    assert_eq!(tests.outcome, PhaseOutcome::Completed);

    assert_eq!(results.report.as_ref().unwrap()["final_report"], json!("all good"));
    assert_eq!(provider.count(SYNTHESIZE_RESULTS), 1);

    // The analysis prompt carries the scanned imports.
    let calls = provider.calls.lock();
    let analyze = calls.iter().find(|r| r.task == ANALYZE_PROJECT_STRUCTURE).unwrap();
    assert!(analyze.instruction.user.contains("java.util.Hashtable"));
}

#[tokio::test]
async fn one_failing_file_degrades_without_aborting() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[TWO_FILES]).failing_file("src/B.java").shared();
    let cfg = test_config(src.path(), out.path());
    let mut team = MigrationCoordinator::from_config(&cfg, provider.clone()).await.unwrap();

    let status = team.run().await.unwrap();
    assert_eq!(status, RunStatus::CompletedWithFailures);
    assert_eq!(status.exit_code(), 2);
    assert_eq!(team.state(), CoordinatorState::Done);

    let migration = team.results().migration.as_ref().unwrap();
    assert!(matches!(&migration.files[0], FileOutcome::Migrated { path, .. } if path == "src/A.java"));
    match &migration.files[1] {
        FileOutcome::Failed { path, reason } => {
            assert_eq!(path, "src/B.java");
            assert!(reason.contains("transport error"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(migration.outcome, PhaseOutcome::CompletedWithFailures(vec!["src/B.java".into()]));
    assert_eq!(provider.count(MIGRATE_JAVA_CLASS), 2);
    assert!(team.results().tests.is_some());
}

#[tokio::test]
async fn empty_analysis_is_retried_until_files_appear() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[EMPTY_FILES, "not json", EMPTY_FILES, TWO_FILES]).shared();
    let cfg = test_config(src.path(), out.path());
    let mut team = MigrationCoordinator::from_config(&cfg, provider.clone()).await.unwrap();

    team.run().await.unwrap();
    assert_eq!(provider.count(ANALYZE_PROJECT_STRUCTURE), 4);
    assert_eq!(team.results().analysis.as_ref().unwrap().attempts, 4);
}

#[tokio::test]
async fn exhausted_analysis_fails_the_run_with_nothing_recorded() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[EMPTY_FILES]).shared();
    let mut cfg = test_config(src.path(), out.path());
    cfg.analysis.max_attempts = 3;
    let mut team = MigrationCoordinator::from_config(&cfg, provider.clone()).await.unwrap();

    let err = team.run().await.unwrap_err();
    assert!(matches!(err, MigrateError::AnalysisExhausted { attempts: 3, .. }));
    assert_eq!(team.state(), CoordinatorState::Failed);
    assert!(team.results().keys().is_empty());
    assert_eq!(provider.count(ANALYZE_PROJECT_STRUCTURE), 3);
    assert_eq!(provider.count(MIGRATE_JAVA_CLASS), 0);

    // A second run on the same coordinator is refused.
    assert!(matches!(team.run().await, Err(MigrateError::Coordinator(_))));
}

#[tokio::test]
async fn failing_bdd_generation_does_not_block_unit_tests() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[TWO_FILES]).failing_task(GENERATE_BDD_SCENARIOS).shared();
    let mut cfg = test_config(src.path(), out.path());
    cfg.report.synthesize = false;
    let mut team = MigrationCoordinator::from_config(&cfg, provider.clone()).await.unwrap();

    assert_eq!(team.run().await.unwrap(), RunStatus::CompletedWithFailures);
    let tests = team.results().tests.as_ref().unwrap();
    assert!(tests.bdds.is_none());
    assert!(tests.unit_tests.is_some());
    assert_eq!(tests.outcome, PhaseOutcome::CompletedWithFailures(vec!["bdds".into()]));
    assert!(team.results().report.is_none());
    assert_eq!(provider.count(SYNTHESIZE_RESULTS), 0);
}

#[tokio::test]
async fn dry_run_leaves_target_untouched() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());
    let target = out.path().join("modern");

    let provider = Scripted::new(&[TWO_FILES]).shared();
    let mut cfg = test_config(src.path(), &target);
    cfg.dry_run = true;
    let mut team = MigrationCoordinator::from_config(&cfg, provider.clone()).await.unwrap();

    assert_eq!(team.run().await.unwrap(), RunStatus::Completed);
    assert_eq!(team.results().migration.as_ref().unwrap().bytes_written, 0);
    assert!(!target.exists());
}

#[tokio::test]
async fn saved_results_land_under_the_run_id() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[TWO_FILES]).shared();
    let cfg = test_config(src.path(), out.path());
    let mut team = MigrationCoordinator::from_config(&cfg, provider).await.unwrap();
    team.run().await.unwrap();

    let saved = team.save().unwrap();
    assert!(saved.dir.ends_with(format!("migration_reports/{}", team.run_id())));
    let results: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&saved.results).unwrap()).unwrap();
    assert_eq!(results["migration"]["outcome"]["outcome"], json!("completed"));
    assert!(saved.report.unwrap().is_file());
}
