#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

use vibe_migrate::agent::PRIMING_TASK;
use vibe_migrate::config::Config;
use vibe_migrate::prompt::{
    ANALYZE_PROJECT_STRUCTURE, GENERATE_BDD_SCENARIOS, GENERATE_UNIT_TESTS, MIGRATE_JAVA_CLASS, SYNTHESIZE_RESULTS,
};
use vibe_migrate::provider::Provider;
use vibe_migrate::wire::ModelRequest;

pub const TWO_FILES: &str = r#"```json
{"files": {
  "src/A.java": {"file_name_suggestion": "A.java", "package_suggestion": "com.demo"},
  "src/B.java": {"file_name_suggestion": "B.java", "package_suggestion": "com.demo"}
}}
```"#;

pub const EMPTY_FILES: &str = r#"{"files": {}}"#;

/// Answers by task name. Analysis replies are consumed in order; the last
/// one repeats forever.
pub struct Scripted {
    pub calls: Mutex<Vec<ModelRequest>>,
    analysis: Mutex<Vec<String>>,
    failing_files: Vec<String>,
    failing_tasks: Vec<String>,
    file_replies: Vec<(String, String)>,
}

impl Scripted {
    pub fn new(analysis: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            analysis: Mutex::new(analysis.iter().map(|s| s.to_string()).collect()),
            failing_files: Vec::new(),
            failing_tasks: Vec::new(),
            file_replies: Vec::new(),
        }
    }

    /// Answer the migration request for `path` with `reply` verbatim.
    pub fn file_reply(mut self, path: &str, reply: &str) -> Self {
        self.file_replies.push((path.to_string(), reply.to_string()));
        self
    }

    pub fn failing_file(mut self, path: &str) -> Self {
        self.failing_files.push(path.to_string());
        self
    }

    pub fn failing_task(mut self, task: &str) -> Self {
        self.failing_tasks.push(task.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn count(&self, task: &str) -> usize {
        self.calls.lock().iter().filter(|r| r.task == task).count()
    }
}

fn current_request(user: &str) -> &str {
    user.rsplit("Current request:\n").next().unwrap_or(user)
}

#[async_trait]
impl Provider for Scripted {
    async fn invoke(&self, req: &ModelRequest) -> anyhow::Result<String> {
        self.calls.lock().push(req.clone());
        if self.failing_tasks.iter().any(|t| *t == req.task) {
            anyhow::bail!("connection reset by peer");
        }
        match req.task.as_str() {
            PRIMING_TASK => Ok("Understood.".into()),
            ANALYZE_PROJECT_STRUCTURE => {
                let mut queue = self.analysis.lock();
                let reply = if queue.len() > 1 { queue.remove(0) } else { queue.first().cloned().unwrap_or_default() };
                Ok(reply)
            }
            MIGRATE_JAVA_CLASS => {
                let prompt = current_request(&req.instruction.user);
                if self.failing_files.iter().any(|f| prompt.contains(f.as_str())) {
                    anyhow::bail!("transport error");
                }
                if let Some((_, reply)) = self.file_replies.iter().find(|(f, _)| prompt.contains(f.as_str())) {
                    return Ok(reply.clone());
                }
                let class = prompt
                    .split_whitespace()
                    .find_map(|w| w.strip_prefix("src/").and_then(|w| w.strip_suffix(".java")))
                    .unwrap_or("Unknown");
                Ok(format!(
                    "Here you go:\n```json\n{}\n```",
                    serde_json::json!({
                        "file_name": format!("{class}.java"),
                        "package": "com.demo",
                        "code": format!("package com.demo;\n\npublic class {class} {{}}\n"),
                        "changes": ["generics"],
                    })
                ))
            }
            GENERATE_BDD_SCENARIOS => Ok(r#"{"feature_file": "demo.feature", "scenarios": ["works"]}"#.into()),
            GENERATE_UNIT_TESTS => Ok("I could not produce JSON this time.".into()),
            SYNTHESIZE_RESULTS => Ok(r#"{"final_report": "all good", "highlights": [], "risks": []}"#.into()),
            other => anyhow::bail!("unexpected task {other}"),
        }
    }
}

/// Legacy tree with `src/A.java`, `src/B.java` and a build file.
pub fn legacy_project(root: &Path) {
    let src = root.join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("A.java"), "import java.util.Vector;\npublic class A { Vector v; }\n").unwrap();
    std::fs::write(src.join("B.java"), "import java.util.Hashtable;\npublic class B {}\n").unwrap();
    std::fs::write(root.join("pom.xml"), "<project/>").unwrap();
}

pub fn test_config(source: &Path, target: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.source_path = source.display().to_string();
    cfg.target_path = target.display().to_string();
    cfg.agents_dir = source.join("no_agents_here").display().to_string();
    cfg.database.file = ":memory:".into();
    cfg.analysis.base_delay_ms = 0;
    cfg.analysis.max_delay_ms = 0;
    cfg
}
