use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::db;
use frontdesk::handlers;
use frontdesk::repl;
use frontdesk::services::ai::groq::GroqProvider;
use frontdesk::services::ai::ollama::OllamaProvider;
use frontdesk::services::ai::LlmProvider;
use frontdesk::services::ner::http::HttpNerProvider;
use frontdesk::services::ner::rules::RuleBasedNer;
use frontdesk::services::ner::NerProvider;
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(
                !config.groq_api_key.is_empty(),
                "GROQ_API_KEY must be set when LLM_PROVIDER=groq"
            );
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
    };

    let ner: Box<dyn NerProvider> = match config.ner_provider.as_str() {
        "http" => {
            tracing::info!("using HTTP NER provider (url: {})", config.ner_url);
            Box::new(HttpNerProvider::new(config.ner_url.clone()))
        }
        _ => {
            tracing::info!("using rule-based NER");
            Box::new(RuleBasedNer::new())
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm,
        ner,
        sessions: Mutex::new(HashMap::new()),
    });

    if std::env::args().nth(1).as_deref() == Some("repl") {
        return repl::run(state).await;
    }

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
