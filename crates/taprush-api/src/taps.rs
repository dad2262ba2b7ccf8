use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use uuid::Uuid;

use taprush_core::scoring;
use taprush_db::models::TapAdmission;
use taprush_types::api::{Claims, TapResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// POST /rounds/{round_id}/tap — submit one tap to an active round.
///
/// The admission check, the insert, and the recount run in one transaction
/// on the DB side; the score is then derived from the recount, so the
/// response always reflects this tap's true position in the history.
pub async fn submit_tap(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<TapResponse>, ApiError> {
    let tap_id = Uuid::new_v4();
    let now = Utc::now();

    let db = state.clone();
    let user_id = claims.sub.to_string();
    let admission =
        run_blocking(move || db.db.submit_tap(&tap_id.to_string(), &round_id, &user_id, now))
            .await?;

    match admission {
        TapAdmission::Accepted { total_taps } => Ok(Json(TapResponse {
            tap_id,
            total_taps,
            score: scoring::score(total_taps, claims.role),
        })),
        TapAdmission::RoundNotFound => Err(ApiError::NotFound("round not found")),
        TapAdmission::NotStarted => Err(ApiError::BadRequest("round has not started yet")),
        TapAdmission::Finished => Err(ApiError::BadRequest("round is already finished")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use taprush_db::Database;
    use taprush_types::models::Role;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    // End-to-end over the store: eleven accepted taps, the eleventh response
    // reports totalTaps=11 and the bonus score of 20.
    #[test]
    fn eleventh_tap_reports_bonus_score() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "alice", "hash", Role::Survivor, at("2025-01-01T00:00:00Z"))
            .unwrap();
        db.create_round(
            "r1",
            at("2025-01-01T12:00:00Z"),
            at("2025-01-01T12:01:00Z"),
            at("2025-01-01T11:59:30Z"),
        )
        .unwrap();

        let base = at("2025-01-01T12:00:00Z");
        let mut last = None;
        for n in 0..11u32 {
            let admission = db
                .submit_tap(
                    &format!("t{n}"),
                    "r1",
                    "u1",
                    base + Duration::milliseconds(i64::from(n)),
                )
                .unwrap();
            last = Some(admission);
        }

        let TapAdmission::Accepted { total_taps } = last.unwrap() else {
            panic!("expected accepted tap");
        };
        assert_eq!(total_taps, 11);
        assert_eq!(scoring::score(total_taps, Role::Survivor), 20);
        assert_eq!(scoring::score(total_taps, Role::Nikita), 0);
    }
}
