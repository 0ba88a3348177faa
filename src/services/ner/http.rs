use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{Entity, NerProvider};

/// Client for an external NER service (e.g. a spaCy model behind an HTTP
/// wrapper). Expects `POST {url}/entities` with `{"text": ...}` to return
/// `{"entities": [{"label": "PERSON", "text": "John"}, ...]}`.
pub struct HttpNerProvider {
    url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EntitiesResponse {
    entities: Vec<Entity>,
}

impl HttpNerProvider {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NerProvider for HttpNerProvider {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        let body = json!({ "text": text });

        let resp = self
            .client
            .post(format!("{}/entities", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to call NER service")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("NER service error ({status})");
        }

        let data: EntitiesResponse = resp
            .json()
            .await
            .context("failed to parse NER response")?;

        Ok(data.entities)
    }
}
