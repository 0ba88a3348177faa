use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::models::Meridiem;
use crate::services::ner::NerProvider;

static PM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\b|\d\s*)pm\b").unwrap());
static AM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\b|\d\s*)am\b").unwrap());
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap());
static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2})(?::(\d{2}))?)?\s*(am|pm)?\b").unwrap()
});
static CLOCK_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").unwrap());
static HOUR_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)\b").unwrap());
static MINUTE_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:minutes?|mins?)\b").unwrap());

/// Date and time recovered from one utterance. The halves are independent:
/// "tomorrow" fills only the date, "3pm" only the time, "tomorrow at 3pm" both.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct When {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

/// First entity tagged PERSON, if any. NER failure is an extraction miss, not
/// an error; the dialogue layer will just ask again.
pub async fn extract_name(ner: &dyn NerProvider, text: &str) -> Option<String> {
    let entities = match ner.entities(text).await {
        Ok(entities) => entities,
        Err(e) => {
            tracing::warn!(error = %e, "NER lookup failed");
            return None;
        }
    };

    entities
        .into_iter()
        .find(|e| e.label == "PERSON")
        .map(|e| e.text)
}

/// TIME/DURATION entities coerced into a span; the first that parses wins.
pub async fn extract_duration(ner: &dyn NerProvider, text: &str) -> Option<Duration> {
    let entities = match ner.entities(text).await {
        Ok(entities) => entities,
        Err(e) => {
            tracing::warn!(error = %e, "NER lookup failed");
            return None;
        }
    };

    entities
        .iter()
        .filter(|e| e.label == "TIME" || e.label == "DURATION")
        .find_map(|e| parse_duration_phrase(&e.text))
}

/// Keyword meridiem scan, layered on top of whatever the time parser produced.
/// Matches both the standalone keyword and the attached form ("3pm").
/// PM wins when both appear.
pub fn extract_meridiem(text: &str) -> Option<Meridiem> {
    if PM_KEYWORD.is_match(text) {
        Some(Meridiem::Pm)
    } else if AM_KEYWORD.is_match(text) {
        Some(Meridiem::Am)
    } else {
        None
    }
}

/// Recover a date and/or a time-of-day from free text.
///
/// Explicit `YYYY-MM-DD [HH:MM[:SS]]` forms are tried first; failing those, the
/// manual heuristics kick in: `today`/`tomorrow` pick the base date relative to
/// `today`, and the time phrase is taken from after "at "/"by " when present,
/// otherwise from the first time-looking token anywhere in the text.
pub fn extract_when(text: &str, today: NaiveDate) -> When {
    let trimmed = text.trim();

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return When {
                date: Some(dt.date()),
                time: Some(dt.time()),
            };
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return When {
            date: Some(date),
            time: None,
        };
    }

    let lower = trimmed.to_lowercase();

    let date = embedded_iso_date(trimmed).or_else(|| {
        if lower.contains("tomorrow") {
            Some(today + Duration::days(1))
        } else if lower.contains("today") {
            Some(today)
        } else {
            None
        }
    });

    let mut time = None;
    for marker in ["at ", "by "] {
        if let Some(idx) = lower.find(marker) {
            time = parse_time_phrase(&trimmed[idx + marker.len()..]);
            break;
        }
    }
    if time.is_none() {
        time = parse_time_phrase(trimmed);
    }

    When { date, time }
}

fn embedded_iso_date(text: &str) -> Option<NaiveDate> {
    let token = ISO_DATE.captures(text)?.get(1)?.as_str();
    match NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(token, error = %e, "date-looking token did not parse");
            None
        }
    }
}

/// First time-of-day token in the text: `HH:MM[:SS]` with an optional meridiem
/// suffix, or a bare `H am/pm`. An attached meridiem is resolved with 12-hour
/// arithmetic here; the separate keyword scan may still adjust later.
pub fn parse_time_phrase(text: &str) -> Option<NaiveTime> {
    for caps in TIME_TOKEN.captures_iter(text) {
        let has_minutes = caps.get(2).is_some();
        let meridiem = caps.get(4).map(|m| m.as_str().to_lowercase());
        // a bare number like "3" is not a time; "3pm" and "15:00" are
        if !has_minutes && meridiem.is_none() {
            continue;
        }

        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(99))
            .unwrap_or(0);
        let second: u32 = caps
            .get(3)
            .map(|m| m.as_str().parse().unwrap_or(99))
            .unwrap_or(0);

        let hour = match meridiem.as_deref() {
            Some(_) if hour > 12 || hour == 0 => continue,
            Some("pm") => (hour % 12) + 12,
            Some("am") => hour % 12,
            _ => hour,
        };

        if let Some(t) = NaiveTime::from_hms_opt(hour, minute, second) {
            return Some(t);
        }
    }
    None
}

/// Coerce a duration phrase into a span: "1 hour", "90 minutes", "1.5 hours",
/// "half an hour", "an hour", or a bare "H:MM[:SS]".
pub fn parse_duration_phrase(text: &str) -> Option<Duration> {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if let Some(caps) = CLOCK_DURATION.captures(trimmed) {
        let hours: i64 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: i64 = caps.get(2)?.as_str().parse().ok()?;
        if minutes < 60 {
            return Some(Duration::minutes(hours * 60 + minutes));
        }
        return None;
    }

    let mut minutes = 0i64;
    if let Some(caps) = HOUR_PHRASE.captures(&lower) {
        let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
        minutes += (hours * 60.0).round() as i64;
    }
    if let Some(caps) = MINUTE_PHRASE.captures(&lower) {
        let m: i64 = caps.get(1)?.as_str().parse().ok()?;
        minutes += m;
    }
    if minutes > 0 {
        return Some(Duration::minutes(minutes));
    }

    if lower.contains("half an hour") {
        return Some(Duration::minutes(30));
    }
    if lower.contains("an hour") || lower.contains("one hour") {
        return Some(Duration::hours(1));
    }

    None
}
