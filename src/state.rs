use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::DialogueContext;
use crate::services::ai::LlmProvider;
use crate::services::ner::NerProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub ner: Box<dyn NerProvider>,
    /// In-progress intents keyed by caller-supplied session id.
    pub sessions: Mutex<HashMap<String, DialogueContext>>,
}
