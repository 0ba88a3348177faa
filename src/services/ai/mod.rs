pub mod groq;
pub mod ollama;
pub mod reply;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Generative text model. The dialogue engine only relies on getting *some*
/// string back; model output is never parsed for structured data.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}

/// Prepend the system prompt to the turn history, the shape every
/// chat-completion API here expects.
fn with_system(system_prompt: &str, messages: &[Message]) -> Vec<Message> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(Message {
        role: "system".to_string(),
        content: system_prompt.to_string(),
    });
    all.extend_from_slice(messages);
    all
}
