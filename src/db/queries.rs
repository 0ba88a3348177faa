use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row};

use crate::models::Appointment;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

fn parse_appointment_row(row: &Row) -> anyhow::Result<Appointment> {
    let name: String = row.get(0)?;
    let date_str: String = row.get(1)?;
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;

    Ok(Appointment {
        name,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)?,
        start: NaiveTime::parse_from_str(&start_str, TIME_FMT)?,
        end: NaiveTime::parse_from_str(&end_str, TIME_FMT)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (name, date, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
        params![
            appt.name,
            appt.date.format(DATE_FMT).to_string(),
            appt.start.format(TIME_FMT).to_string(),
            appt.end.format(TIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn appointments_on(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT name, date, start_time, end_time FROM appointments WHERE date = ?1 ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn all_appointments(conn: &Connection) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn
        .prepare("SELECT name, date, start_time, end_time FROM appointments ORDER BY date ASC, start_time ASC")?;

    let rows = stmt.query_map([], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Delete every appointment booked under `name`, case-insensitively.
/// Returns the number of rows removed.
pub fn delete_by_name(conn: &Connection, name: &str) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM appointments WHERE lower(name) = lower(?1)",
        params![name],
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn appt(name: &str, date: &str, start: &str, end: &str) -> Appointment {
        Appointment {
            name: name.to_string(),
            date: NaiveDate::parse_from_str(date, DATE_FMT).unwrap(),
            start: NaiveTime::parse_from_str(start, TIME_FMT).unwrap(),
            end: NaiveTime::parse_from_str(end, TIME_FMT).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let conn = db::init_db(":memory:").unwrap();
        let a = appt("John", "2025-09-01", "15:00:00", "16:00:00");
        insert_appointment(&conn, &a).unwrap();

        let on_day = appointments_on(&conn, a.date).unwrap();
        assert_eq!(on_day, vec![a.clone()]);

        let other_day = appointments_on(
            &conn,
            NaiveDate::parse_from_str("2025-09-02", DATE_FMT).unwrap(),
        )
        .unwrap();
        assert!(other_day.is_empty());
    }

    #[test]
    fn test_delete_by_name_case_insensitive() {
        let conn = db::init_db(":memory:").unwrap();
        insert_appointment(&conn, &appt("John", "2025-09-01", "15:00:00", "16:00:00")).unwrap();
        insert_appointment(&conn, &appt("john", "2025-09-02", "10:00:00", "11:00:00")).unwrap();
        insert_appointment(&conn, &appt("Alice", "2025-09-01", "09:00:00", "10:00:00")).unwrap();

        let deleted = delete_by_name(&conn, "JOHN").unwrap();
        assert_eq!(deleted, 2);

        let remaining = all_appointments(&conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Alice");
    }

    #[test]
    fn test_delete_by_name_absent() {
        let conn = db::init_db(":memory:").unwrap();
        assert_eq!(delete_by_name(&conn, "Nobody").unwrap(), 0);
    }
}
