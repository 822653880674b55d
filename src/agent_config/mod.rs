use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::{MigrateError, Result};
use crate::prompt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimingLayer {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityPriming {
    pub enabled: bool,
    pub layers: Vec<PrimingLayer>,
}

impl Default for IdentityPriming {
    fn default() -> Self {
        Self { enabled: true, layers: Vec::new() }
    }
}

/// One agent persona as stored in `<agents_dir>/<name>.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefinition {
    pub name: String,
    pub role: String,
    pub description: String,
    pub system_message: Vec<String>,
    pub instructions: Vec<String>,
    pub add_history_to_context: bool,
    pub prompts: BTreeMap<String, String>,
    pub identity_priming: IdentityPriming,
}

impl AgentDefinition {
    /// Load `<dir>/<agent>.yml` (or `.yaml`), else the built-in definition.
    pub fn load(dir: &Path, agent: &str) -> Result<Self> {
        for ext in ["yml", "yaml"] {
            let path = dir.join(format!("{agent}.{ext}"));
            if path.is_file() {
                let text = fs::read_to_string(&path).map_err(|e| MigrateError::Config(e.to_string()))?;
                let mut def: Self = serde_yaml::from_str(&text)
                    .map_err(|e| MigrateError::Config(format!("{}: {}", path.display(), e)))?;
                if def.name.is_empty() {
                    def.name = agent.to_string();
                }
                debug!(agent, path = %path.display(), "loaded agent definition");
                return Ok(def);
            }
        }
        prompt::builtin(agent)
            .ok_or_else(|| MigrateError::Config(format!("no definition for agent '{agent}'")))
    }

    pub fn system_text(&self) -> String {
        self.system_message.join("\n")
    }

    pub fn instructions_text(&self) -> Option<String> {
        if self.instructions.is_empty() {
            None
        } else {
            Some(self.instructions.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n"))
        }
    }

    pub fn render(&self, prompt_name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let template = self.prompts.get(prompt_name).ok_or_else(|| {
            MigrateError::Config(format!("agent '{}' has no prompt '{}'", self.name, prompt_name))
        })?;
        match render_template(template, vars) {
            Ok(s) => Ok(s),
            Err(missing) => {
                warn!(agent = %self.name, prompt = prompt_name, variable = %missing, "missing template variable, using raw template");
                Ok(template.clone())
            }
        }
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `{name}` is substituted, `{{`/`}}` become literal braces, any other brace
/// text is copied through. Returns the first missing variable name on failure.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(i) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(close) = tail.find('}') {
                let name = &tail[1..close];
                if is_ident(name) {
                    match vars.iter().find(|(k, _)| *k == name) {
                        Some((_, v)) => out.push_str(v),
                        None => return Err(name.to_string()),
                    }
                    rest = &tail[close + 1..];
                    continue;
                }
            }
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out.push_str(rest);
    Ok(out)
}
