use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::wire::{Instruction, ModelRequest};
use super::Provider;

const DEFAULT_URL: &str = "http://localhost:11434";

pub struct Ollama {
    pub model: String,
    pub url: String,
    pub temperature: f32,
    client: Client,
}

impl Ollama {
    pub fn new(model: String, url: Option<String>, temperature: f32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            model,
            url: url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            temperature,
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct Msg {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: String,
}

fn to_messages(ins: &Instruction) -> Vec<Msg> {
    vec![
        Msg { role: "system".into(), content: ins.merged_system() },
        Msg { role: "user".into(), content: ins.user.clone() },
    ]
}

#[async_trait]
impl Provider for Ollama {
    async fn invoke(&self, req: &ModelRequest) -> Result<String> {
        // Tolerate base urls copied from OpenAI-compatible setups ("…/v1").
        let base = self.url.trim_end_matches('/').trim_end_matches("/v1");
        let url = format!("{}/api/chat", base);
        let body = ChatRequest {
            model: &self.model,
            messages: to_messages(&req.instruction),
            stream: false,
            options: OllamaOptions { temperature: self.temperature },
        };

        debug!(agent = %req.agent, task = %req.task, %url, "ollama: POST");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("ollama read body failed")?;
        if !status.is_success() {
            return Err(anyhow!("Ollama API error ({}): {}", status, text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("ollama response parse error: {}", e))?;
        if parsed.message.content.trim().is_empty() {
            return Err(anyhow!("ollama: empty content"));
        }
        Ok(parsed.message.content)
    }
}
