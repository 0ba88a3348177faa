use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{with_system, LlmProvider, Message};

/// Client for a local Ollama instance speaking the `/api/chat` protocol.
pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": with_system(system_prompt, messages),
            "stream": false,
        });

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .context("Ollama request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Ollama returned {status}");
        }

        let data: ChatResponse = resp.json().await.context("malformed Ollama reply")?;
        Ok(data.message.content)
    }
}
