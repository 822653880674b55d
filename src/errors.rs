use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("model unavailable: {0}")] ModelUnavailable(String),
    #[error("no structured payload found in model output")] NoStructuredPayloadFound,
    #[error("analysis exhausted after {attempts} attempts: {last_error}")]
    AnalysisExhausted { attempts: u32, last_error: String },
    #[error("config error: {0}")] Config(String),
    #[error("storage error: {0}")] Storage(String),
    #[error("coordinator failure: {0}")] Coordinator(String),
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
