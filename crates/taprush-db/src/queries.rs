use crate::models::{RoundRow, TapAdmission, TapRow, UserRow};
use crate::{Database, format_ts};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, TransactionBehavior};
use taprush_core::lifecycle;
use taprush_types::models::{Role, RoundStatus};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, password_hash, role.as_str(), format_ts(created_at)],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Rounds --

    pub fn create_round(
        &self,
        id: &str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO rounds (id, start_date, end_date, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    id,
                    format_ts(start_date),
                    format_ts(end_date),
                    format_ts(created_at)
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_round(&self, id: &str) -> Result<Option<RoundRow>> {
        self.with_conn(|conn| query_round(conn, id))
    }

    /// All rounds, newest first.
    pub fn list_rounds(&self) -> Result<Vec<RoundRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, start_date, end_date, created_at FROM rounds ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], round_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// True iff the round exists and is currently active. A missing round
    /// collapses to false here; callers that need a distinct not-found
    /// signal use `get_round`.
    pub fn is_round_active(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let Some(round) = self.get_round(id)? else {
            return Ok(false);
        };
        Ok(lifecycle::status(round.start_date, round.end_date, now) == RoundStatus::Active)
    }

    // -- Taps --

    /// Submit a tap: check the round's window, insert, and recount this
    /// user's taps — all inside one transaction. The recount is the new
    /// tap's position in the user's history, which the scoring bonus
    /// depends on, so two concurrent taps must never observe the same
    /// baseline. The IMMEDIATE transaction plus the single writer
    /// connection serializes the whole sequence.
    pub fn submit_tap(
        &self,
        tap_id: &str,
        round_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TapAdmission> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let Some(round) = query_round(&tx, round_id)? else {
                return Ok(TapAdmission::RoundNotFound);
            };

            match lifecycle::status(round.start_date, round.end_date, now) {
                RoundStatus::Cooldown => return Ok(TapAdmission::NotStarted),
                RoundStatus::Finished => return Ok(TapAdmission::Finished),
                RoundStatus::Active => {}
            }

            tx.execute(
                "INSERT INTO taps (id, round_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![tap_id, round_id, user_id, format_ts(now)],
            )?;

            let total_taps: u32 = tx.query_row(
                "SELECT COUNT(*) FROM taps WHERE round_id = ?1 AND user_id = ?2",
                [round_id, user_id],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok(TapAdmission::Accepted { total_taps })
        })
    }

    /// A round's taps in creation order, joined with each owner's username
    /// and role. Ties on `created_at` (clock resolution) break by insertion
    /// order via rowid, so the ordering is stable.
    pub fn list_taps_for_round(&self, round_id: &str) -> Result<Vec<TapRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.round_id, t.user_id, u.username, u.role, t.created_at
                 FROM taps t
                 JOIN users u ON t.user_id = u.id
                 WHERE t.round_id = ?1
                 ORDER BY t.created_at ASC, t.rowid ASC",
            )?;
            let rows = stmt
                .query_map([round_id], tap_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch taps for a set of rounds (the round listing endpoint),
    /// same ordering guarantees as `list_taps_for_round`.
    pub fn list_taps_for_rounds(&self, round_ids: &[String]) -> Result<Vec<TapRow>> {
        if round_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=round_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT t.id, t.round_id, t.user_id, u.username, u.role, t.created_at
                 FROM taps t
                 JOIN users u ON t.user_id = u.id
                 WHERE t.round_id IN ({})
                 ORDER BY t.created_at ASC, t.rowid ASC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = round_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), tap_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, username, password, role, created_at FROM users WHERE username = ?1")?;
    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, role, created_at FROM users WHERE id = ?1")?;
    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

fn query_round(conn: &Connection, id: &str) -> Result<Option<RoundRow>> {
    let mut stmt =
        conn.prepare("SELECT id, start_date, end_date, created_at FROM rounds WHERE id = ?1")?;
    let row = stmt.query_row([id], round_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role: parse_role(&row.get::<_, String>(3)?),
        created_at: parse_ts(4, &row.get::<_, String>(4)?)?,
    })
}

fn round_from_row(row: &rusqlite::Row) -> rusqlite::Result<RoundRow> {
    Ok(RoundRow {
        id: row.get(0)?,
        start_date: parse_ts(1, &row.get::<_, String>(1)?)?,
        end_date: parse_ts(2, &row.get::<_, String>(2)?)?,
        created_at: parse_ts(3, &row.get::<_, String>(3)?)?,
    })
}

fn tap_from_row(row: &rusqlite::Row) -> rusqlite::Result<TapRow> {
    Ok(TapRow {
        id: row.get(0)?,
        round_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        role: parse_role(&row.get::<_, String>(4)?),
        created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Legacy rows may carry role strings in any casing; unknown values fall
/// back to the ordinary role rather than poisoning every read of the row.
fn parse_role(raw: &str) -> Role {
    Role::parse(raw).unwrap_or(Role::Survivor)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
