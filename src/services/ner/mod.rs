pub mod http;
pub mod rules;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One recognized span. Labels follow the spaCy convention the rest of the
/// extractor matches on: PERSON, TIME, DURATION.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub label: String,
    pub text: String,
}

#[async_trait]
pub trait NerProvider: Send + Sync {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<Entity>>;
}
