use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{with_system, LlmProvider, Message};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const TEMPERATURE: f64 = 0.7;

/// Client for Groq's OpenAI-compatible chat completion endpoint.
pub struct GroqProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let body = json!({
            "model": self.model,
            "messages": with_system(system_prompt, messages),
            "temperature": TEMPERATURE,
        });

        let resp = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Groq request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("Groq returned {status}: {detail}");
        }

        let data: CompletionResponse = resp.json().await.context("malformed Groq reply")?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Groq reply had no choices"))
    }
}
