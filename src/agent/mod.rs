use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent_config::AgentDefinition;
use crate::errors::{MigrateError, Result};
use crate::memory::Memory;
use crate::provider::DynProvider;
use crate::wire::{Instruction, ModelRequest};

pub const PRIMING_TASK: &str = "priming";

/// A model backend bound to one persona, with optional shared memory.
pub struct Agent {
    def: AgentDefinition,
    provider: DynProvider,
    memory: Option<Arc<Memory>>,
    run_id: String,
    history_limit: usize,
}

impl Agent {
    pub fn new(
        def: AgentDefinition,
        provider: DynProvider,
        memory: Option<Arc<Memory>>,
        run_id: impl Into<String>,
        history_limit: usize,
    ) -> Self {
        Self { def, provider, memory, run_id: run_id.into(), history_limit }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Send each priming layer once. Failures are logged, never raised.
    pub async fn prime(&self) -> bool {
        if !self.def.identity_priming.enabled {
            return true;
        }
        for layer in &self.def.identity_priming.layers {
            if layer.message.trim().is_empty() {
                continue;
            }
            if let Err(e) = self.ask(PRIMING_TASK, &layer.message).await {
                warn!(agent = %self.def.name, error = %e, "identity priming failed");
                return false;
            }
        }
        info!(agent = %self.def.name, "identity established");
        true
    }

    /// Render `prompt_name` with `vars` and send it.
    pub async fn run(&self, prompt_name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let prompt = self.def.render(prompt_name, vars)?;
        self.ask(prompt_name, &prompt).await
    }

    pub async fn ask(&self, task: &str, prompt: &str) -> Result<String> {
        let mut system = self.def.system_text();
        if !self.def.role.is_empty() {
            system = format!("Role: {}\n{}", self.def.role, system);
        }
        let req = ModelRequest {
            agent: self.def.name.clone(),
            task: task.to_string(),
            instruction: Instruction {
                system,
                user: self.with_history(prompt),
                developer: self.def.instructions_text(),
            },
        };

        debug!(agent = %self.def.name, task, bytes = req.instruction.user.len(), "invoking model");
        let reply = self
            .provider
            .invoke(&req)
            .await
            .map_err(|e| MigrateError::ModelUnavailable(format!("{e:#}")))?;

        self.remember("user", prompt);
        self.remember("assistant", &reply);
        Ok(reply)
    }

    fn with_history(&self, prompt: &str) -> String {
        let Some(memory) = self.memory.as_ref().filter(|_| self.def.add_history_to_context) else {
            return prompt.to_string();
        };
        let history = match memory.recent(&self.def.name, self.history_limit) {
            Ok(h) => h,
            Err(e) => {
                warn!(agent = %self.def.name, error = %e, "could not read agent memory");
                return prompt.to_string();
            }
        };
        if history.is_empty() {
            return prompt.to_string();
        }
        let mut out = String::from("Conversation so far:\n");
        for entry in history {
            out.push_str(&format!("[{}] {}\n", entry.role, entry.content));
        }
        out.push_str("\nCurrent request:\n");
        out.push_str(prompt);
        out
    }

    fn remember(&self, role: &str, content: &str) {
        if let Some(memory) = &self.memory {
            if let Err(e) = memory.append(&self.def.name, &self.run_id, role, content) {
                warn!(agent = %self.def.name, error = %e, "could not write agent memory");
            }
        }
    }
}
