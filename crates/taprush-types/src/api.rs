use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, RoundStatus};

// -- JWT Claims --

/// JWT claims shared between token issuance (login) and the auth middleware.
/// Canonical definition lives here in taprush-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

/// Extra body fields are tolerated; only the two credentials matter.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

// -- Rounds --

/// A freshly created round, echoed back to the admin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCreatedResponse {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A round formatted for clients: stored fields plus everything derived on
/// read (status, totals, the caller's score, the winner once finished).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: RoundStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_score: Option<u32>,
    pub total_taps: usize,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub username: String,
    pub score: u32,
}

// -- Taps --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapResponse {
    pub tap_id: Uuid,
    pub total_taps: u32,
    pub score: u32,
}
