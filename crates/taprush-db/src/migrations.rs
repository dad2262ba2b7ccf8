use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rounds (
            id          TEXT PRIMARY KEY,
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS taps (
            id          TEXT PRIMARY KEY,
            round_id    TEXT NOT NULL REFERENCES rounds(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_taps_round
            ON taps(round_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_taps_round_user
            ON taps(round_id, user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
