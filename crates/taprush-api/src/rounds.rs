use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use taprush_core::{lifecycle, scoring};
use taprush_db::models::{RoundRow, TapRow};
use taprush_types::api::{Claims, RoundCreatedResponse, RoundResponse, Winner};
use taprush_types::models::{Role, RoundStatus};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// GET /rounds — public listing, newest first, no per-user score.
pub async fn list_rounds(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundResponse>>, ApiError> {
    let db = state.clone();
    let (rounds, taps) = run_blocking(move || {
        let rounds = db.db.list_rounds()?;
        let ids: Vec<String> = rounds.iter().map(|r| r.id.clone()).collect();
        let taps = db.db.list_taps_for_rounds(&ids)?;
        Ok((rounds, taps))
    })
    .await?;

    let now = Utc::now();

    let mut taps_by_round: HashMap<String, Vec<TapRow>> = HashMap::new();
    for tap in taps {
        taps_by_round
            .entry(tap.round_id.clone())
            .or_default()
            .push(tap);
    }

    let formatted = rounds
        .iter()
        .map(|round| {
            let round_taps = taps_by_round
                .get(round.id.as_str())
                .map_or(&[][..], Vec::as_slice);
            format_round(round, round_taps, None, now)
        })
        .collect();

    Ok(Json(formatted))
}

/// POST /rounds — admin only. Schedules the round from the current instant:
/// the cooldown runs first, then the active window.
pub async fn create_round(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoundCreatedResponse>, ApiError> {
    if claims.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let now = Utc::now();
    let (start, end) = lifecycle::schedule(now, state.cooldown_secs, state.round_secs);
    let id = Uuid::new_v4();

    let db = state.clone();
    run_blocking(move || db.db.create_round(&id.to_string(), start, end, now)).await?;

    Ok(Json(RoundCreatedResponse {
        id,
        start_date: start,
        end_date: end,
        created_at: now,
    }))
}

/// GET /rounds/{id} — one formatted round including the caller's score.
pub async fn get_round(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RoundResponse>, ApiError> {
    let db = state.clone();
    let lookup_id = id.clone();
    let (round, taps) = run_blocking(move || {
        let round = db.db.get_round(&lookup_id)?;
        let taps = match &round {
            Some(_) => db.db.list_taps_for_round(&lookup_id)?,
            None => vec![],
        };
        Ok((round, taps))
    })
    .await?;

    let round = round.ok_or(ApiError::NotFound("round not found"))?;
    let caller = claims.sub.to_string();

    Ok(Json(format_round(&round, &taps, Some(&caller), Utc::now())))
}

/// Shape a round for clients: stored fields plus status, totals, the
/// caller's score when requested, and the winner once finished.
///
/// The caller's score uses the role embedded on the caller's own taps; a
/// caller with no taps scores 0 (there is no role to consult, and zero taps
/// score zero under every role anyway).
fn format_round(
    round: &RoundRow,
    taps: &[TapRow],
    caller_id: Option<&str>,
    now: DateTime<Utc>,
) -> RoundResponse {
    let status = lifecycle::status(round.start_date, round.end_date, now);

    let user_score = caller_id.map(|uid| {
        let user_taps: Vec<&TapRow> = taps.iter().filter(|t| t.user_id == uid).collect();
        match user_taps.first() {
            Some(first) => scoring::score(user_taps.len() as u32, first.role),
            None => 0,
        }
    });

    let leaderboard = rank(taps);
    let winner = match (status, leaderboard.first()) {
        (RoundStatus::Finished, Some(top)) if top.score > 0 => Some(top.clone()),
        _ => None,
    };

    RoundResponse {
        id: round.id.clone(),
        start_date: round.start_date,
        end_date: round.end_date,
        created_at: round.created_at,
        status,
        user_score,
        total_taps: taps.len(),
        winner,
    }
}

/// Rank a round's taps into a leaderboard, descending by score.
///
/// Groups form in first-appearance order (the input is already sorted by
/// creation time) and each group is scored with its first tap's role — role
/// is immutable per user, so any tap's role would do. The sort is stable,
/// so tied scores keep first-appearance order; that is the documented
/// tie-break.
fn rank(taps: &[TapRow]) -> Vec<Winner> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, (u32, &TapRow)> = HashMap::new();
    for tap in taps {
        groups
            .entry(tap.user_id.as_str())
            .and_modify(|(count, _)| *count += 1)
            .or_insert_with(|| {
                order.push(tap.user_id.as_str());
                (1, tap)
            });
    }

    let mut entries: Vec<Winner> = order
        .iter()
        .map(|uid| {
            let (count, first) = groups[uid];
            Winner {
                username: first.username.clone(),
                score: scoring::score(count, first.role),
            }
        })
        .collect();

    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn round(start: &str, end: &str) -> RoundRow {
        RoundRow {
            id: "r1".into(),
            start_date: at(start),
            end_date: at(end),
            created_at: at(start) - Duration::seconds(30),
        }
    }

    fn taps_for(user_id: &str, username: &str, role: Role, n: u32) -> Vec<TapRow> {
        (0..n)
            .map(|i| TapRow {
                id: format!("{user_id}-{i}"),
                round_id: "r1".into(),
                user_id: user_id.into(),
                username: username.into(),
                role,
                created_at: at("2025-01-01T12:00:00Z") + Duration::milliseconds(i64::from(i)),
            })
            .collect()
    }

    #[test]
    fn finished_round_names_the_top_scorer() {
        let r = round("2025-01-01T12:00:00Z", "2025-01-01T12:01:00Z");
        let mut taps = taps_for("u1", "alice", Role::Survivor, 21); // 30 points
        taps.extend(taps_for("u2", "bob", Role::Survivor, 10)); // 10 points

        let formatted = format_round(&r, &taps, None, at("2025-01-01T12:02:00Z"));
        assert_eq!(formatted.status, RoundStatus::Finished);
        assert_eq!(formatted.total_taps, 31);
        assert_eq!(
            formatted.winner,
            Some(Winner {
                username: "alice".into(),
                score: 30
            })
        );
        assert_eq!(formatted.user_score, None);
    }

    #[test]
    fn no_winner_while_round_is_active() {
        let r = round("2025-01-01T12:00:00Z", "2025-01-01T12:01:00Z");
        let taps = taps_for("u1", "alice", Role::Survivor, 21);

        let formatted = format_round(&r, &taps, None, at("2025-01-01T12:00:30Z"));
        assert_eq!(formatted.status, RoundStatus::Active);
        assert_eq!(formatted.winner, None);
    }

    #[test]
    fn all_zero_scores_mean_no_winner() {
        let r = round("2025-01-01T12:00:00Z", "2025-01-01T12:01:00Z");
        let mut taps = taps_for("u1", "nikita", Role::Nikita, 50);
        taps.extend(taps_for("u2", "никита2", Role::Nikita, 5));

        let formatted = format_round(&r, &taps, None, at("2025-01-01T12:02:00Z"));
        assert_eq!(formatted.status, RoundStatus::Finished);
        assert_eq!(formatted.winner, None);
    }

    #[test]
    fn empty_round_has_no_winner_and_caller_scores_zero() {
        let r = round("2025-01-01T12:00:00Z", "2025-01-01T12:01:00Z");

        let formatted = format_round(&r, &[], Some("u1"), at("2025-01-01T12:02:00Z"));
        assert_eq!(formatted.total_taps, 0);
        assert_eq!(formatted.winner, None);
        assert_eq!(formatted.user_score, Some(0));
    }

    #[test]
    fn caller_score_uses_only_their_own_taps() {
        let r = round("2025-01-01T12:00:00Z", "2025-01-01T12:01:00Z");
        let mut taps = taps_for("u1", "alice", Role::Survivor, 11); // 20 points
        taps.extend(taps_for("u2", "bob", Role::Survivor, 3));

        let formatted = format_round(&r, &taps, Some("u1"), at("2025-01-01T12:00:30Z"));
        assert_eq!(formatted.user_score, Some(20));

        let formatted = format_round(&r, &taps, Some("u2"), at("2025-01-01T12:00:30Z"));
        assert_eq!(formatted.user_score, Some(3));
    }

    #[test]
    fn exempt_caller_scores_zero_despite_taps() {
        let r = round("2025-01-01T12:00:00Z", "2025-01-01T12:01:00Z");
        let taps = taps_for("u1", "nikita", Role::Nikita, 40);

        let formatted = format_round(&r, &taps, Some("u1"), at("2025-01-01T12:00:30Z"));
        assert_eq!(formatted.user_score, Some(0));
    }

    #[test]
    fn survivor_outranks_exempt_group_with_more_taps() {
        let mut taps = taps_for("u1", "nikita", Role::Nikita, 100);
        taps.extend(taps_for("u2", "bob", Role::Survivor, 1));

        let ranked = rank(&taps);
        assert_eq!(ranked[0].username, "bob");
        assert_eq!(ranked[0].score, 1);
        assert_eq!(ranked[1].score, 0);
    }

    #[test]
    fn tied_scores_keep_first_appearance_order() {
        let mut taps = taps_for("u1", "alice", Role::Survivor, 5);
        taps.extend(taps_for("u2", "bob", Role::Survivor, 5));

        let ranked = rank(&taps);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].username, "alice");
        assert_eq!(ranked[1].username, "bob");
    }
}
