use taprush_types::models::Role;

/// Every `BONUS_EVERY`-th tap in a user's history is worth `BONUS_POINTS`
/// instead of one point.
pub const BONUS_EVERY: u32 = 11;
pub const BONUS_POINTS: u32 = 10;

/// Score a user's tap history within one round.
///
/// The i-th tap (1-indexed, in creation order) contributes `BONUS_POINTS`
/// when i is a multiple of `BONUS_EVERY`, otherwise 1. Since each tap's
/// contribution depends only on its position, the total is a function of the
/// count alone; callers pass the length of the ordered history.
///
/// The exempt role always scores 0 regardless of tap count.
///
/// This is pure on purpose: the per-tap response and the leaderboard
/// aggregation both call it, and they must agree for any history.
pub fn score(tap_count: u32, role: Role) -> u32 {
    if role.is_exempt() {
        return 0;
    }

    (1..=tap_count)
        .map(|i| if i % BONUS_EVERY == 0 { BONUS_POINTS } else { 1 })
        .sum()
}
