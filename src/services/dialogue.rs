use std::sync::Arc;

use chrono::{NaiveTime, Timelike, Utc};

use crate::db::queries;
use crate::models::{Appointment, DialogueContext, IntentKind, Meridiem, SlotField};
use crate::services::ai::reply;
use crate::services::ner::NerProvider;
use crate::services::{extract, scheduling};
use crate::state::AppState;

const BOOKING_KEYWORDS: &[&str] = &["book", "make a reservation", "make an appointment"];
const CANCEL_KEYWORDS: &[&str] = &["cancel", "delete", "remove"];
const AVAILABILITY_KEYWORDS: &[&str] = &["available", "availability"];

const OCCUPIED_MSG: &str =
    "The slot for the provided time is already occupied. Please choose another time.";
const PAST_MIDNIGHT_MSG: &str =
    "That duration runs past midnight. Please start over with an earlier time or a shorter duration.";

/// Process one user turn for a session: route the utterance to intent
/// detection, slot filling, or open-ended chat, and produce the reply.
pub async fn handle_turn(
    state: &Arc<AppState>,
    session: &str,
    text: &str,
) -> anyhow::Result<String> {
    let lower = text.to_lowercase();
    let today = Utc::now().date_naive();

    // Cancellation keywords pre-empt whatever was in progress.
    let pending = if contains_any(&lower, CANCEL_KEYWORDS) {
        take_pending(state, session);
        Some(DialogueContext::new(IntentKind::Cancel))
    } else {
        take_pending(state, session)
    };

    let mut ctx = match pending {
        Some(ctx) => ctx,
        None if contains_any(&lower, BOOKING_KEYWORDS) => DialogueContext::new(IntentKind::Book),
        None if contains_any(&lower, AVAILABILITY_KEYWORDS) => {
            DialogueContext::new(IntentKind::CheckAvailability)
        }
        // No intent, nothing pending: plain chat.
        None => return Ok(reply::open_chat(state.llm.as_ref(), text).await),
    };

    fill_from_utterance(&mut ctx, state.ner.as_ref(), text, today).await;

    if let Some(field) = ctx.next_missing() {
        tracing::info!(
            session,
            intent = ctx.intent.as_str(),
            field = ?field,
            "asking for missing slot"
        );
        let question = clarifying_question(ctx.intent, field);
        state
            .sessions
            .lock()
            .unwrap()
            .insert(session.to_string(), ctx);
        return Ok(question.to_string());
    }

    let canned = finalize(state, session, ctx)?;
    Ok(reply::phrase(state.llm.as_ref(), &canned).await)
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

fn take_pending(state: &AppState, session: &str) -> Option<DialogueContext> {
    state.sessions.lock().unwrap().remove(session)
}

/// Run the extractors against the current utterance only, filling every
/// still-missing field they can. Fields already collected on an earlier turn
/// are never revisited, so a trigger utterance that already carries a value is
/// not asked for it again.
async fn fill_from_utterance(
    ctx: &mut DialogueContext,
    ner: &dyn NerProvider,
    text: &str,
    today: chrono::NaiveDate,
) {
    // One scan covers both halves so "tomorrow at 3pm" fills date and time.
    let when = extract::extract_when(text, today);

    for field in ctx.fields() {
        if ctx.is_filled(*field) {
            continue;
        }
        match field {
            SlotField::Name => ctx.name = extract::extract_name(ner, text).await,
            SlotField::Date => ctx.date = when.date,
            SlotField::Time => ctx.time = when.time,
            SlotField::Meridiem => ctx.meridiem = extract::extract_meridiem(text),
            SlotField::Duration => ctx.duration = extract::extract_duration(ner, text).await,
        }
    }
}

fn clarifying_question(intent: IntentKind, field: SlotField) -> &'static str {
    match (intent, field) {
        (IntentKind::Cancel, SlotField::Name) => {
            "Please provide the name for the reservation you want to cancel."
        }
        (_, SlotField::Name) => "What's the name for the reservation?",
        (IntentKind::CheckAvailability, SlotField::Date) => "Which date should I check?",
        (_, SlotField::Date) => "When would you like to make the appointment?",
        (_, SlotField::Time) => "Please specify the time in 24-hour format or mention AM/PM.",
        (_, SlotField::Meridiem) => "Is the time AM or PM?",
        (_, SlotField::Duration) => "How long will the appointment be?",
    }
}

/// All slots are filled: carry out the intent. Every outcome clears the
/// session context; an occupied slot does not allow a retry within it.
fn finalize(state: &Arc<AppState>, session: &str, ctx: DialogueContext) -> anyhow::Result<String> {
    use anyhow::Context as _;

    match ctx.intent {
        IntentKind::Cancel => {
            let name = ctx.name.context("cancellation context missing name")?;
            let deleted = {
                let db = state.db.lock().unwrap();
                queries::delete_by_name(&db, &name)?
            };
            if deleted > 0 {
                tracing::info!(session, name = %name, deleted, "cancelled reservation");
                Ok(format!(
                    "The reservation under the name {name} has been cancelled."
                ))
            } else {
                Ok(format!("No reservation found under the name {name}."))
            }
        }

        IntentKind::Book => {
            let name = ctx.name.clone().context("booking context missing name")?;
            let (date, start, end) = match resolve_interval(&ctx)? {
                Ok(interval) => interval,
                Err(rejection) => return Ok(rejection),
            };

            let db = state.db.lock().unwrap();
            if !scheduling::is_available(&db, date, start, end)? {
                tracing::info!(session, %date, %start, %end, "slot occupied");
                return Ok(OCCUPIED_MSG.to_string());
            }

            queries::insert_appointment(
                &db,
                &Appointment {
                    name: name.clone(),
                    date,
                    start,
                    end,
                },
            )?;
            tracing::info!(session, name = %name, %date, %start, %end, "booked appointment");
            Ok(format!(
                "Your appointment is booked for {date} from {start} to {end}."
            ))
        }

        IntentKind::CheckAvailability => {
            let (date, start, end) = match resolve_interval(&ctx)? {
                Ok(interval) => interval,
                Err(rejection) => return Ok(rejection),
            };

            let available = {
                let db = state.db.lock().unwrap();
                scheduling::is_available(&db, date, start, end)?
            };
            if available {
                Ok(format!(
                    "The slot on {date} from {start} to {end} is available."
                ))
            } else {
                Ok(format!(
                    "The slot on {date} from {start} to {end} is already taken."
                ))
            }
        }
    }
}

type Interval = (chrono::NaiveDate, NaiveTime, NaiveTime);

/// Combine date, time, meridiem, and duration into a concrete [start, end)
/// interval. `Err(msg)` is a user-facing rejection for an end past midnight.
fn resolve_interval(ctx: &DialogueContext) -> anyhow::Result<Result<Interval, String>> {
    use anyhow::Context as _;

    let date = ctx.date.context("context missing date")?;
    let time = ctx.time.context("context missing time")?;
    let duration = ctx.duration.context("context missing duration")?;

    let start = apply_meridiem(time, ctx.meridiem);
    let start_dt = date.and_time(start);
    let end_dt = start_dt + duration;

    if end_dt.date() != date {
        return Ok(Err(PAST_MIDNIGHT_MSG.to_string()));
    }

    Ok(Ok((date, start, end_dt.time())))
}

/// 12-hour correction layered over the parsed time-of-day: the parsed value
/// wins unless a meridiem keyword was seen, in which case the adjustment is
/// applied unconditionally afterward.
fn apply_meridiem(time: NaiveTime, meridiem: Option<Meridiem>) -> NaiveTime {
    match meridiem {
        Some(Meridiem::Pm) if time.hour() < 12 => {
            time.with_hour(time.hour() + 12).unwrap_or(time)
        }
        Some(Meridiem::Am) if time.hour() >= 12 => {
            time.with_hour(time.hour() - 12).unwrap_or(time)
        }
        _ => time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_apply_meridiem() {
        assert_eq!(apply_meridiem(t("03:00"), Some(Meridiem::Pm)), t("15:00"));
        assert_eq!(apply_meridiem(t("15:00"), Some(Meridiem::Pm)), t("15:00"));
        assert_eq!(apply_meridiem(t("15:00"), Some(Meridiem::Am)), t("03:00"));
        assert_eq!(apply_meridiem(t("03:00"), Some(Meridiem::Am)), t("03:00"));
        assert_eq!(apply_meridiem(t("09:30"), None), t("09:30"));
    }

    #[test]
    fn test_keyword_routing() {
        assert!(contains_any("please cancel my appointment", CANCEL_KEYWORDS));
        assert!(contains_any("i want to book something", BOOKING_KEYWORDS));
        assert!(contains_any("is 3pm available?", AVAILABILITY_KEYWORDS));
        assert!(!contains_any("hello there", BOOKING_KEYWORDS));
    }
}
