use serde::{Deserialize, Serialize};

/// How a phase ended. Only `Aborted` means the phase had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum PhaseOutcome {
    Completed,
    /// Identities (file paths, test kinds) of the items that failed.
    CompletedWithFailures(Vec<String>),
    Aborted(String),
}

impl PhaseOutcome {
    pub fn from_failures(failed: Vec<String>) -> Self {
        if failed.is_empty() {
            Self::Completed
        } else {
            Self::CompletedWithFailures(failed)
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithFailures,
    Aborted,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::Aborted => 1,
            Self::CompletedWithFailures => 2,
        }
    }
}
