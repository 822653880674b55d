mod common;

use common::{legacy_project, Scripted, EMPTY_FILES, TWO_FILES};
use std::sync::Arc;

use vibe_migrate::agent::Agent;
use vibe_migrate::analyzer::{FileEntry, RetryPolicy, StructureAnalyzer};
use vibe_migrate::config::{MigrationConfig, ScanConfig};
use vibe_migrate::errors::MigrateError;
use vibe_migrate::migrate::{FileOutcome, MigrationExecutor};
use vibe_migrate::phase::PhaseOutcome;
use vibe_migrate::prompt::{self, ANALYZE_PROJECT_STRUCTURE, CODE_ANALYZER, MIGRATE_JAVA_CLASS, MIGRATION_SPECIALIST};

fn agent(name: &str, provider: Arc<Scripted>) -> Agent {
    Agent::new(prompt::builtin(name).unwrap(), provider, None, "run-test", 4)
}

fn entry(path: &str) -> FileEntry {
    FileEntry { path: path.into(), file_name_suggestion: String::new(), package_suggestion: "com.demo".into() }
}

#[tokio::test]
async fn executor_calls_once_per_file_and_counts_failures() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[TWO_FILES]).failing_file("src/B.java").failing_file("src/D.java").shared();
    let exec = MigrationExecutor::new(
        agent(MIGRATION_SPECIALIST, provider.clone()),
        src.path(),
        out.path(),
        MigrationConfig::default(),
        false,
        false,
    );

    let files: Vec<FileEntry> = ["src/A.java", "src/B.java", "src/C.java", "src/D.java"].into_iter().map(entry).collect();
    let report = exec.migrate(&files).await;

    assert_eq!(provider.count(MIGRATE_JAVA_CLASS), 4);
    assert_eq!(report.files.len(), 4);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed_paths(), vec!["src/B.java", "src/D.java"]);
    assert_eq!(
        report.outcome,
        PhaseOutcome::CompletedWithFailures(vec!["src/B.java".into(), "src/D.java".into()])
    );
    // C.java is not on disk; it still migrates from its path alone.
    assert!(out.path().join("com/demo/C.java").is_file());
    assert!(report.bytes_written > 0);
}

#[tokio::test]
async fn unusable_replies_fail_only_their_own_file() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[TWO_FILES])
        .file_reply("src/B.java", "Sorry, I cannot migrate this class.")
        .file_reply(
            "src/C.java",
            r#"{"file_name": "../Evil.java", "package": "com.demo", "code": "class Evil {}"}"#,
        )
        .file_reply("src/D.java", r#"{"file_name": "D.java", "changes": ["nothing to do"]}"#)
        .shared();
    let exec = MigrationExecutor::new(
        agent(MIGRATION_SPECIALIST, provider.clone()),
        src.path(),
        out.path(),
        MigrationConfig::default(),
        false,
        false,
    );

    let files: Vec<FileEntry> = ["src/A.java", "src/B.java", "src/C.java", "src/D.java"].into_iter().map(entry).collect();
    let report = exec.migrate(&files).await;

    assert_eq!(provider.count(MIGRATE_JAVA_CLASS), 4);
    assert_eq!(report.failed_paths(), vec!["src/B.java", "src/C.java"]);
    match &report.files[1] {
        FileOutcome::Failed { reason, .. } => assert!(reason.contains("no structured payload")),
        other => panic!("expected failure, got {other:?}"),
    }
    match &report.files[2] {
        FileOutcome::Failed { reason, .. } => assert!(reason.contains("unsafe file name")),
        other => panic!("expected failure, got {other:?}"),
    }
    match &report.files[3] {
        FileOutcome::Migrated { written, output, .. } => {
            assert!(written.is_none());
            assert!(output.is_parsed());
        }
        other => panic!("expected migration, got {other:?}"),
    }
    assert!(out.path().join("com/demo/A.java").is_file());
    assert!(!out.path().join("Evil.java").exists());
    assert!(!out.path().join("com/Evil.java").exists());
}

#[tokio::test]
async fn sources_outside_the_project_never_reach_the_model() {
    let base = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let root = base.path().join("legacy");
    legacy_project(&root);
    let secret = base.path().join("secret.env");
    std::fs::write(&secret, "DB_PASSWORD=hunter2").unwrap();

    let provider = Scripted::new(&[TWO_FILES]).shared();
    let exec = MigrationExecutor::new(
        agent(MIGRATION_SPECIALIST, provider.clone()),
        &root,
        out.path(),
        MigrationConfig::default(),
        true,
        false,
    );

    let files = vec![entry("../secret.env"), entry(&secret.display().to_string())];
    let report = exec.migrate(&files).await;
    assert_eq!(report.files.len(), 2);

    let calls = provider.calls.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|r| !r.instruction.user.contains("hunter2")));
}

#[tokio::test]
async fn executor_aborts_when_target_cannot_be_created() {
    let src = tempfile::tempdir().unwrap();
    legacy_project(src.path());
    let blocker = src.path().join("pom.xml");

    let provider = Scripted::new(&[TWO_FILES]).shared();
    let exec = MigrationExecutor::new(
        agent(MIGRATION_SPECIALIST, provider.clone()),
        src.path(),
        blocker.join("out"),
        MigrationConfig::default(),
        false,
        false,
    );

    let report = exec.migrate(&[entry("src/A.java")]).await;
    assert!(matches!(report.outcome, PhaseOutcome::Aborted(_)));
    assert!(report.files.is_empty());
    assert_eq!(provider.count(MIGRATE_JAVA_CLASS), 0);
}

#[tokio::test]
async fn analyzer_makes_m_plus_one_calls() {
    let src = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[EMPTY_FILES, EMPTY_FILES, TWO_FILES]).shared();
    let mut analyzer = StructureAnalyzer::new(
        agent(CODE_ANALYZER, provider.clone()),
        ScanConfig::default(),
        RetryPolicy::immediate(10),
    );
    assert!(analyzer.cached().is_none());

    let analysis = analyzer.analyze(&src.path().display().to_string()).await.unwrap();
    assert_eq!(provider.count(ANALYZE_PROJECT_STRUCTURE), 3);
    assert_eq!(analysis.attempts, 3);
    let paths: Vec<&str> = analysis.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["src/A.java", "src/B.java"]);
    assert_eq!(analyzer.cached().unwrap().files.len(), 2);
}

#[tokio::test]
async fn analyzer_gives_up_after_the_cap() {
    let src = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[EMPTY_FILES]).shared();
    let mut analyzer = StructureAnalyzer::new(
        agent(CODE_ANALYZER, provider.clone()),
        ScanConfig::default(),
        RetryPolicy::immediate(4),
    );

    match analyzer.analyze(&src.path().display().to_string()).await {
        Err(MigrateError::AnalysisExhausted { attempts, last_error }) => {
            assert_eq!(attempts, 4);
            assert!(last_error.contains("empty"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(provider.count(ANALYZE_PROJECT_STRUCTURE), 4);
}

#[tokio::test]
async fn transport_errors_are_retried_like_bad_payloads() {
    let src = tempfile::tempdir().unwrap();
    legacy_project(src.path());

    let provider = Scripted::new(&[TWO_FILES]).failing_task(ANALYZE_PROJECT_STRUCTURE).shared();
    let mut analyzer = StructureAnalyzer::new(
        agent(CODE_ANALYZER, provider.clone()),
        ScanConfig::default(),
        RetryPolicy::immediate(2),
    );

    let err = analyzer.analyze(&src.path().display().to_string()).await.unwrap_err();
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(provider.count(ANALYZE_PROJECT_STRUCTURE), 2);
}
