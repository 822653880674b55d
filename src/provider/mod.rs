use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::ModelConfig;
use crate::wire::ModelRequest;

pub mod openai;
pub mod anthropic;
pub mod ollama;

/// Opaque model boundary: prompt in, free text out.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn invoke(&self, req: &ModelRequest) -> Result<String>;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(cfg: &ModelConfig) -> Result<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::OpenAI => Ok(Arc::new(openai::OpenAIProvider::new(
            cfg.name.clone(),
            cfg.api_key.clone(),
            cfg.base_url.clone(),
            cfg.temperature,
            timeout,
        )?)),
        ProviderKind::Anthropic => Ok(Arc::new(anthropic::Anthropic::new(
            cfg.name.clone(),
            cfg.api_key.clone(),
            cfg.base_url.clone(),
            cfg.max_tokens,
            timeout,
        )?)),
        ProviderKind::Ollama => Ok(Arc::new(ollama::Ollama::new(
            cfg.name.clone(),
            cfg.base_url.clone(),
            cfg.temperature,
            timeout,
        )?)),
    }
}
