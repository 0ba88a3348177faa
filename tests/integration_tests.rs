use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Duration, Timelike, Utc};
use tower::ServiceExt;

use frontdesk::config::AppConfig;
use frontdesk::db;
use frontdesk::db::queries;
use frontdesk::handlers;
use frontdesk::services::ai::{LlmProvider, Message};
use frontdesk::services::ner::rules::RuleBasedNer;
use frontdesk::state::AppState;

// ── Mock Providers ──

/// Echoes the last user message so canned dialogue results pass through the
/// reply generator unchanged.
struct EchoLlm;

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn chat(&self, _system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
    }
}

/// Always fails, for exercising the canned-text fallback.
struct BrokenLlm;

#[async_trait]
impl LlmProvider for BrokenLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
        anyhow::bail!("model unavailable")
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 8000,
        database_url: ":memory:".to_string(),
        llm_provider: "ollama".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        groq_api_key: "".to_string(),
        groq_model: "".to_string(),
        ner_provider: "rules".to_string(),
        ner_url: "".to_string(),
    }
}

fn test_state_with(llm: Box<dyn LlmProvider>) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        llm,
        ner: Box::new(RuleBasedNer::new()),
        sessions: Mutex::new(HashMap::new()),
    })
}

fn test_state() -> Arc<AppState> {
    test_state_with(Box::new(EchoLlm))
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .with_state(state)
}

async fn say(app: &Router, session: &str, text: &str) -> String {
    let body = serde_json::json!({ "message": { "content": text, "id": session } });
    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    v["message"]["content"].as_str().unwrap().to_string()
}

fn appointment_count(state: &Arc<AppState>) -> usize {
    let db = state.db.lock().unwrap();
    queries::all_appointments(&db).unwrap().len()
}

// ── Tests ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state());
    let res = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_full_booking_in_one_utterance() {
    let state = test_state();
    let app = test_app(state.clone());

    let reply = say(
        &app,
        "s1",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;

    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    assert_eq!(
        reply,
        format!("Your appointment is booked for {tomorrow} from 15:00:00 to 16:00:00.")
    );

    let db = state.db.lock().unwrap();
    let stored = queries::all_appointments(&db).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "John");
    assert_eq!(stored[0].date, tomorrow);
    assert_eq!(stored[0].start.hour(), 15);
    assert_eq!(stored[0].end.hour(), 16);
}

#[tokio::test]
async fn test_slot_filling_question_order() {
    let state = test_state();
    let app = test_app(state.clone());

    let r = say(&app, "s1", "I would like to book an appointment").await;
    assert_eq!(r, "What's the name for the reservation?");

    let r = say(&app, "s1", "John").await;
    assert_eq!(r, "When would you like to make the appointment?");

    let r = say(&app, "s1", "tomorrow").await;
    assert_eq!(
        r,
        "Please specify the time in 24-hour format or mention AM/PM."
    );

    let r = say(&app, "s1", "at 03:00").await;
    assert_eq!(r, "Is the time AM or PM?");

    let r = say(&app, "s1", "PM").await;
    assert_eq!(r, "How long will the appointment be?");

    let r = say(&app, "s1", "1 hour").await;
    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    assert_eq!(
        r,
        format!("Your appointment is booked for {tomorrow} from 15:00:00 to 16:00:00.")
    );
    assert_eq!(appointment_count(&state), 1);
}

#[tokio::test]
async fn test_prefilled_fields_are_not_asked_again() {
    let app = test_app(test_state());

    // Name arrives with the trigger, so the first question is about the date.
    let r = say(&app, "s1", "Book an appointment for John").await;
    assert_eq!(r, "When would you like to make the appointment?");
}

#[tokio::test]
async fn test_conflicting_booking_rejected_and_not_stored() {
    let state = test_state();
    let app = test_app(state.clone());

    say(
        &app,
        "s1",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;

    let r = say(
        &app,
        "s2",
        "Book an appointment for Alice tomorrow at 3pm for 1 hour",
    )
    .await;
    assert_eq!(
        r,
        "The slot for the provided time is already occupied. Please choose another time."
    );

    let db = state.db.lock().unwrap();
    let stored = queries::all_appointments(&db).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "John");
}

#[tokio::test]
async fn test_touching_slots_both_book() {
    let state = test_state();
    let app = test_app(state.clone());

    say(
        &app,
        "s1",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;

    // 4pm starts exactly when John's slot ends.
    let r = say(
        &app,
        "s2",
        "Book an appointment for Alice tomorrow at 4pm for 1 hour",
    )
    .await;
    assert!(r.starts_with("Your appointment is booked"), "got: {r}");
    assert_eq!(appointment_count(&state), 2);
}

#[tokio::test]
async fn test_book_then_cancel_roundtrip() {
    let state = test_state();
    let app = test_app(state.clone());

    say(
        &app,
        "s1",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;
    assert_eq!(appointment_count(&state), 1);

    let r = say(&app, "s1", "Please cancel the reservation for John").await;
    assert_eq!(r, "The reservation under the name John has been cancelled.");
    assert_eq!(appointment_count(&state), 0);
}

#[tokio::test]
async fn test_cancel_unknown_name() {
    let app = test_app(test_state());

    let r = say(&app, "s1", "cancel my reservation").await;
    assert_eq!(
        r,
        "Please provide the name for the reservation you want to cancel."
    );

    let r = say(&app, "s1", "Bob").await;
    assert_eq!(r, "No reservation found under the name Bob.");
}

#[tokio::test]
async fn test_cancel_preempts_pending_booking() {
    let state = test_state();
    let app = test_app(state.clone());

    let r = say(&app, "s1", "book an appointment").await;
    assert_eq!(r, "What's the name for the reservation?");

    let r = say(&app, "s1", "Actually, cancel the reservation for John").await;
    assert_eq!(r, "No reservation found under the name John.");

    // The booking context is gone: a plain utterance falls through to chat.
    let r = say(&app, "s1", "thanks anyway").await;
    assert_eq!(r, "thanks anyway");
}

#[tokio::test]
async fn test_availability_check_does_not_persist() {
    let state = test_state();
    let app = test_app(state.clone());

    let tomorrow = Utc::now().date_naive() + Duration::days(1);

    let r = say(&app, "s1", "Is tomorrow at 3pm available for 1 hour?").await;
    assert_eq!(
        r,
        format!("The slot on {tomorrow} from 15:00:00 to 16:00:00 is available.")
    );
    assert_eq!(appointment_count(&state), 0);

    say(
        &app,
        "s2",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;

    let r = say(&app, "s1", "Is tomorrow at 3pm available for 1 hour?").await;
    assert_eq!(
        r,
        format!("The slot on {tomorrow} from 15:00:00 to 16:00:00 is already taken.")
    );
    assert_eq!(appointment_count(&state), 1);
}

#[tokio::test]
async fn test_occupied_slot_clears_context() {
    let state = test_state();
    let app = test_app(state.clone());

    say(
        &app,
        "s1",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;
    say(
        &app,
        "s2",
        "Book an appointment for Alice tomorrow at 3pm for 1 hour",
    )
    .await;

    // The rejected context is cleared; a new time alone is plain chat, not a retry.
    let r = say(&app, "s2", "tomorrow at 5pm").await;
    assert_eq!(r, "tomorrow at 5pm");
    assert_eq!(appointment_count(&state), 1);
}

#[tokio::test]
async fn test_past_midnight_booking_rejected() {
    let state = test_state();
    let app = test_app(state.clone());

    let r = say(
        &app,
        "s1",
        "Book an appointment for John today at 11pm for 2 hours",
    )
    .await;
    assert_eq!(
        r,
        "That duration runs past midnight. Please start over with an earlier time or a shorter duration."
    );
    assert_eq!(appointment_count(&state), 0);

    // The rejection is terminal: a plain follow-up is chat, not a retry.
    let r = say(&app, "s1", "ok, some other day then").await;
    assert_eq!(r, "ok, some other day then");
}

#[tokio::test]
async fn test_open_chat_fallback() {
    let app = test_app(test_state());
    let r = say(&app, "s1", "hello there").await;
    assert_eq!(r, "hello there");
}

#[tokio::test]
async fn test_llm_failure_falls_back_to_canned_text() {
    let state = test_state_with(Box::new(BrokenLlm));
    let app = test_app(state.clone());

    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let r = say(
        &app,
        "s1",
        "Book an appointment for John tomorrow at 3pm for 1 hour",
    )
    .await;
    assert_eq!(
        r,
        format!("Your appointment is booked for {tomorrow} from 15:00:00 to 16:00:00.")
    );

    let r = say(&app, "s1", "hello there").await;
    assert_eq!(
        r,
        "I can help you book an appointment, cancel a reservation, or check availability."
    );
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = test_app(test_state());

    let r = say(&app, "s1", "book an appointment").await;
    assert_eq!(r, "What's the name for the reservation?");

    // A different session is untouched by s1's pending context.
    let r = say(&app, "s2", "hello there").await;
    assert_eq!(r, "hello there");

    // s1 is still waiting for the name.
    let r = say(&app, "s1", "John").await;
    assert_eq!(r, "When would you like to make the appointment?");
}
