use super::{LlmProvider, Message};

const REPHRASE_PROMPT: &str = "You are a friendly appointment-booking assistant. \
Rephrase the following status message conversationally without changing any of the \
facts in it (names, dates, times). Reply with the rephrased message only.";

const CHAT_PROMPT: &str = "You are a friendly appointment-booking assistant. \
You can book appointments, cancel reservations, and check slot availability. \
Answer the customer briefly.";

const CHAT_FALLBACK: &str =
    "I can help you book an appointment, cancel a reservation, or check availability.";

/// Feed a canned result sentence through the model for conversational phrasing.
/// Provider failure is never surfaced to the user; the canned text stands.
pub async fn phrase(llm: &dyn LlmProvider, canned: &str) -> String {
    let messages = [Message {
        role: "user".to_string(),
        content: canned.to_string(),
    }];

    match llm.chat(REPHRASE_PROMPT, &messages).await {
        Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
        Ok(_) => canned.to_string(),
        Err(e) => {
            tracing::error!(error = %e, "reply generation failed, using canned text");
            canned.to_string()
        }
    }
}

/// Open-ended chat for utterances with no intent keyword and no pending context.
pub async fn open_chat(llm: &dyn LlmProvider, text: &str) -> String {
    let messages = [Message {
        role: "user".to_string(),
        content: text.to_string(),
    }];

    match llm.chat(CHAT_PROMPT, &messages).await {
        Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
        Ok(_) => CHAT_FALLBACK.to_string(),
        Err(e) => {
            tracing::error!(error = %e, "open chat generation failed");
            CHAT_FALLBACK.to_string()
        }
    }
}
