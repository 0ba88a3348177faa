use async_trait::async_trait;
use regex::Regex;

use super::{Entity, NerProvider};

/// Keyword-ish tokens that must never be mistaken for a person name when the
/// whole utterance is a short capitalized phrase.
const NON_NAMES: &[&str] = &[
    "book",
    "cancel",
    "delete",
    "remove",
    "appointment",
    "reservation",
    "today",
    "tomorrow",
    "available",
    "availability",
    "am",
    "pm",
    "yes",
    "no",
];

/// Deterministic pattern-based recognizer used when no external NER service is
/// configured. Tags PERSON, TIME, and DURATION spans.
pub struct RuleBasedNer {
    person_after_marker: Regex,
    time_clock: Regex,
    time_meridiem: Regex,
    duration_words: Regex,
    duration_fixed: Regex,
}

impl RuleBasedNer {
    pub fn new() -> Self {
        Self {
            // "for John Smith", "under Alice", "name is Bob"
            person_after_marker: Regex::new(
                r"\b(?i:for|under|name is)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
            )
            .unwrap(),
            time_clock: Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*(?i:am|pm)\b)?").unwrap(),
            time_meridiem: Regex::new(r"(?i)\b\d{1,2}\s*(?:am|pm)\b").unwrap(),
            duration_words: Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:hours?|hrs?|minutes?|mins?)\b")
                .unwrap(),
            duration_fixed: Regex::new(r"(?i)\b(?:half an hour|an hour)\b").unwrap(),
        }
    }

    /// A short utterance that is nothing but capitalized words is taken as a
    /// bare name answer ("John", "Mary Jane Watson").
    fn bare_name(text: &str) -> Option<String> {
        let trimmed = text.trim().trim_end_matches(['.', '!']);
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if words.is_empty() || words.len() > 3 {
            return None;
        }
        let all_names = words.iter().all(|w| {
            w.chars().all(|c| c.is_alphabetic())
                && w.chars().next().is_some_and(|c| c.is_uppercase())
                && !NON_NAMES.contains(&w.to_lowercase().as_str())
        });
        if all_names {
            Some(words.join(" "))
        } else {
            None
        }
    }
}

impl Default for RuleBasedNer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NerProvider for RuleBasedNer {
    async fn entities(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        let mut found: Vec<(usize, Entity)> = vec![];

        for caps in self.person_after_marker.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let candidate = m.as_str();
            let ok = candidate
                .split_whitespace()
                .all(|w| !NON_NAMES.contains(&w.to_lowercase().as_str()));
            if ok {
                found.push((
                    m.start(),
                    Entity {
                        label: "PERSON".to_string(),
                        text: candidate.to_string(),
                    },
                ));
            }
        }

        if found.is_empty() {
            if let Some(name) = Self::bare_name(text) {
                found.push((
                    0,
                    Entity {
                        label: "PERSON".to_string(),
                        text: name,
                    },
                ));
            }
        }

        for m in self
            .duration_words
            .find_iter(text)
            .chain(self.duration_fixed.find_iter(text))
        {
            found.push((
                m.start(),
                Entity {
                    label: "DURATION".to_string(),
                    text: m.as_str().to_string(),
                },
            ));
        }

        let duration_spans: Vec<(usize, usize)> = found
            .iter()
            .filter(|(_, e)| e.label == "DURATION")
            .map(|(s, e)| (*s, *s + e.text.len()))
            .collect();

        for m in self
            .time_clock
            .find_iter(text)
            .chain(self.time_meridiem.find_iter(text))
        {
            // "1 hour" must stay a DURATION, not a TIME
            let overlaps = duration_spans
                .iter()
                .any(|(s, e)| m.start() < *e && m.end() > *s);
            if !overlaps {
                found.push((
                    m.start(),
                    Entity {
                        label: "TIME".to_string(),
                        text: m.as_str().to_string(),
                    },
                ));
            }
        }

        found.sort_by_key(|(start, _)| *start);
        Ok(found.into_iter().map(|(_, e)| e).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn labels_of(text: &str) -> Vec<(String, String)> {
        let ner = RuleBasedNer::new();
        ner.entities(text)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.label, e.text))
            .collect()
    }

    #[tokio::test]
    async fn test_person_after_for() {
        let ents = labels_of("Book an appointment for John tomorrow at 3pm for 1 hour").await;
        assert!(ents.contains(&("PERSON".to_string(), "John".to_string())));
    }

    #[tokio::test]
    async fn test_bare_name_utterance() {
        let ents = labels_of("Mary Jane").await;
        assert_eq!(ents, vec![("PERSON".to_string(), "Mary Jane".to_string())]);
    }

    #[tokio::test]
    async fn test_keyword_is_not_a_name() {
        assert!(labels_of("Book").await.is_empty());
        assert!(labels_of("Tomorrow").await.is_empty());
    }

    #[tokio::test]
    async fn test_time_and_duration_spans() {
        let ents = labels_of("tomorrow at 3pm for 1 hour").await;
        assert!(ents.contains(&("TIME".to_string(), "3pm".to_string())));
        assert!(ents.contains(&("DURATION".to_string(), "1 hour".to_string())));
    }

    #[tokio::test]
    async fn test_clock_time() {
        let ents = labels_of("at 14:30 please").await;
        assert!(ents.contains(&("TIME".to_string(), "14:30".to_string())));
    }

    #[tokio::test]
    async fn test_duration_not_tagged_as_time() {
        let ents = labels_of("for 2 hours").await;
        assert_eq!(ents, vec![("DURATION".to_string(), "2 hours".to_string())]);
    }
}
