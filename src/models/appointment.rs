use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One booked slot. For any given date, stored appointments never have
/// overlapping [start, end) intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub name: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}
