pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS appointments (
            name TEXT NOT NULL,
            date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_appointments_date ON appointments(date);",
    )
    .context("failed to create schema")?;

    Ok(conn)
}
