use serde::{Deserialize, Serialize};

/// ========================================
/// What an agent hands to the model backend
/// ========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
}

impl Instruction {
    /// System text with developer notes folded in, for backends with a single system slot.
    pub fn merged_system(&self) -> String {
        let mut system = self.system.clone();
        if let Some(dev) = &self.developer {
            system.push_str("\n\nDeveloper notes:\n");
            system.push_str(dev);
        }
        system
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Agent issuing the call (e.g. "code_analyzer").
    pub agent: String,
    /// Prompt template name, or "priming" for identity layers.
    pub task: String,
    pub instruction: Instruction,
}
