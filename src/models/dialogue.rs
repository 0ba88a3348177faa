use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Book,
    Cancel,
    CheckAvailability,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Book => "book",
            IntentKind::Cancel => "cancel",
            IntentKind::CheckAvailability => "check_availability",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meridiem {
    Am,
    Pm,
}

/// The fields a multi-turn intent collects, in the order they are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Name,
    Date,
    Time,
    Meridiem,
    Duration,
}

/// A partially filled intent for one session. Cleared on completion, on a
/// terminal rejection, or when a cancellation keyword pre-empts it.
#[derive(Debug, Clone)]
pub struct DialogueContext {
    pub intent: IntentKind,
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub meridiem: Option<Meridiem>,
    pub duration: Option<Duration>,
}

impl DialogueContext {
    pub fn new(intent: IntentKind) -> Self {
        Self {
            intent,
            name: None,
            date: None,
            time: None,
            meridiem: None,
            duration: None,
        }
    }

    /// Slot order for this intent. Strict: fields are asked for in this order
    /// and never revisited once set.
    pub fn fields(&self) -> &'static [SlotField] {
        match self.intent {
            IntentKind::Book => &[
                SlotField::Name,
                SlotField::Date,
                SlotField::Time,
                SlotField::Meridiem,
                SlotField::Duration,
            ],
            IntentKind::CheckAvailability => &[
                SlotField::Date,
                SlotField::Time,
                SlotField::Meridiem,
                SlotField::Duration,
            ],
            IntentKind::Cancel => &[SlotField::Name],
        }
    }

    pub fn is_filled(&self, field: SlotField) -> bool {
        match field {
            SlotField::Name => self.name.is_some(),
            SlotField::Date => self.date.is_some(),
            SlotField::Time => self.time.is_some(),
            SlotField::Meridiem => self.meridiem.is_some(),
            SlotField::Duration => self.duration.is_some(),
        }
    }

    /// First field still awaiting a value, if any.
    pub fn next_missing(&self) -> Option<SlotField> {
        self.fields().iter().copied().find(|f| !self.is_filled(*f))
    }
}
