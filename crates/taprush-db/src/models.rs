//! Database row types — these map directly to SQLite rows.
//! Distinct from taprush-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use taprush_types::models::Role;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

pub struct RoundRow {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A tap joined with its owner's username and role, which the leaderboard
/// aggregation needs.
pub struct TapRow {
    pub id: String,
    pub round_id: String,
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Outcome of the transactional tap submission. Rejections are data, not
/// errors — only infrastructure failures surface as `Err`.
#[derive(Debug, PartialEq, Eq)]
pub enum TapAdmission {
    Accepted { total_taps: u32 },
    RoundNotFound,
    NotStarted,
    Finished,
}
