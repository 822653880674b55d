use async_trait::async_trait;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::wire::ModelRequest;

const DEFAULT_BASE: &str = "https://api.openai.com";

/// OpenAI-compatible chat completions (also serves local gateways via `base_url`).
pub struct OpenAIProvider {
    model: String,
    api_key: Option<String>,
    api_base: String,
    temperature: f32,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok());
        Ok(Self {
            model,
            api_key,
            api_base: base_url.unwrap_or_else(|| DEFAULT_BASE.to_string()),
            temperature,
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    async fn invoke(&self, req: &ModelRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": req.instruction.merged_system() },
                { "role": "user", "content": req.instruction.user }
            ],
            "temperature": self.temperature,
        });

        debug!(agent = %req.agent, task = %req.task, %url, "openai: POST");

        let mut call = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let resp = call.send().await.context("openai request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("openai read body failed")?;
        if !status.is_success() {
            return Err(anyhow!("OpenAI API error ({}): {}", status, text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("failed to parse OpenAI response: {e}\nRaw: {text}"))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("openai: empty completion"))
    }
}
