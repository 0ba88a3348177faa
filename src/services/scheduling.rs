use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;

/// True iff the candidate [start, end) interval overlaps no stored appointment
/// on `date`. Touching endpoints do not conflict: a slot ending at 11:00 leaves
/// 11:00 free as a start.
pub fn is_available(
    conn: &Connection,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> anyhow::Result<bool> {
    let existing = queries::appointments_on(conn, date)?;
    Ok(existing
        .iter()
        .all(|appt| end <= appt.start || start >= appt.end))
}
