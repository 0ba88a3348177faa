use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub llm_provider: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ner_provider: String,
    pub ner_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "frontdesk.db".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            ner_provider: env::var("NER_PROVIDER").unwrap_or_else(|_| "rules".to_string()),
            ner_url: env::var("NER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
        }
    }
}
