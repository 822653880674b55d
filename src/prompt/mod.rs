use std::collections::BTreeMap;

use crate::agent_config::{AgentDefinition, IdentityPriming, PrimingLayer};

pub const CODE_ANALYZER: &str = "code_analyzer";
pub const MIGRATION_SPECIALIST: &str = "migration_specialist";
pub const TEST_GENERATOR: &str = "test_generator";
pub const REPORT_MANAGER: &str = "report_manager";

pub const ANALYZE_PROJECT_STRUCTURE: &str = "analyze_project_structure";
pub const MIGRATE_JAVA_CLASS: &str = "migrate_java_class";
pub const GENERATE_BDD_SCENARIOS: &str = "generate_bdd_scenarios";
pub const GENERATE_UNIT_TESTS: &str = "generate_unit_tests";
pub const SYNTHESIZE_RESULTS: &str = "synthesize_results";

fn json_only() -> &'static str {
r#"Output Rules:
- Reply with EXACTLY ONE JSON object. A single ```json fence around it is tolerated; prose is not.
- Never invent files that are not listed in the provided project structure."#
}

fn analyze_project_structure() -> String {
    format!(r#"Analyze the legacy Java project rooted at {{src}}.

Scanned project structure (JSON):
{{structure}}

Distinct imports found in source files:
{{imports}}

For EVERY Java source file decide the modern file name and the target package.
Respond with:
{{{{
  "files": {{{{
    "<relative path as listed>": {{{{ "file_name_suggestion": string, "package_suggestion": string }}}}
  }}}}
}}}}

{rules}"#, rules = json_only())
}

fn migrate_java_class() -> String {
    format!(r#"Migrate the legacy class at {{file_path_to_read}} to Java {{java_version}}
(modernization level: {{modernization_level}}).

Target file name: {{file_name}}
Target package: {{file_path}}

Current source:
```java
{{source_code}}
```

Keep behaviour identical. Replace raw collections with generics, anonymous classes with lambdas,
manual resource handling with try-with-resources, and EJB lookups with dependency injection where relevant.

Respond with:
{{{{ "file_name": string, "package": string, "code": string, "changes": [string] }}}}

{rules}"#, rules = json_only())
}

fn generate_bdd_scenarios() -> String {
    format!(r#"Write Gherkin BDD scenarios covering the behaviour of the migrated classes below.

Migrated files (JSON):
{{migrated_files}}

Respond with:
{{{{ "feature_file": string, "scenarios": [string] }}}}

{rules}"#, rules = json_only())
}

fn generate_unit_tests() -> String {
    format!(r#"Write JUnit 5 unit tests for the migrated classes below, targeting Java {{java_version}}
and at least {{coverage_target}}% line coverage.

Migrated files (JSON):
{{migrated_files}}

Respond with:
{{{{ "test_class": string, "test_cases": [string] }}}}

{rules}"#, rules = json_only())
}

fn synthesize_results() -> String {
    r#"Synthesize the results of the migration team into a final report for engineering leads.

Phase results (JSON):
{agent_results}

Cover: what was analyzed, what was migrated, what failed and why, generated tests, and next steps.
Respond with { "final_report": string, "highlights": [string], "risks": [string] }."#
        .to_string()
}

fn prompts(entries: &[(&str, String)]) -> BTreeMap<String, String> {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Built-in persona for `agent`, used when no YAML definition is on disk.
pub fn builtin(agent: &str) -> Option<AgentDefinition> {
    let def = match agent {
        CODE_ANALYZER => AgentDefinition {
            name: CODE_ANALYZER.into(),
            role: "Legacy Code Analyst".into(),
            description: "Maps a legacy Java tree onto a modern package layout.".into(),
            system_message: lines(&[
                "You are a senior Java architect specialised in legacy modernization.",
                "You read project structures and propose precise, conservative relocations.",
            ]),
            instructions: lines(&[
                "List every Java source file exactly once.",
                "Prefer reverse-domain package names already used by the project.",
            ]),
            add_history_to_context: false,
            prompts: prompts(&[(ANALYZE_PROJECT_STRUCTURE, analyze_project_structure())]),
            identity_priming: IdentityPriming::default(),
        },
        MIGRATION_SPECIALIST => AgentDefinition {
            name: MIGRATION_SPECIALIST.into(),
            role: "Java Migration Specialist".into(),
            description: "Rewrites one legacy class at a time into modern Java.".into(),
            system_message: lines(&[
                "You are a Java migration specialist.",
                "You rewrite legacy classes into idiomatic modern Java without changing behaviour.",
            ]),
            instructions: lines(&["Return complete compilable source in 'code'."]),
            add_history_to_context: true,
            prompts: prompts(&[(MIGRATE_JAVA_CLASS, migrate_java_class())]),
            identity_priming: IdentityPriming {
                enabled: true,
                layers: vec![PrimingLayer {
                    message: "Confirm you will answer every migration request with a single JSON object.".into(),
                }],
            },
        },
        TEST_GENERATOR => AgentDefinition {
            name: TEST_GENERATOR.into(),
            role: "Test Engineer".into(),
            description: "Produces BDD scenarios and JUnit tests for migrated code.".into(),
            system_message: lines(&["You are a test engineer writing Gherkin and JUnit 5."]),
            instructions: lines(&["Tests must be deterministic and self-contained."]),
            add_history_to_context: true,
            prompts: prompts(&[
                (GENERATE_BDD_SCENARIOS, generate_bdd_scenarios()),
                (GENERATE_UNIT_TESTS, generate_unit_tests()),
            ]),
            identity_priming: IdentityPriming::default(),
        },
        REPORT_MANAGER => AgentDefinition {
            name: REPORT_MANAGER.into(),
            role: "Migration Report Manager".into(),
            description: "Turns phase results into a readable final report.".into(),
            system_message: lines(&["You summarise technical migration results for engineering leads."]),
            instructions: Vec::new(),
            add_history_to_context: false,
            prompts: prompts(&[(SYNTHESIZE_RESULTS, synthesize_results())]),
            identity_priming: IdentityPriming::default(),
        },
        _ => return None,
    };
    Some(def)
}
