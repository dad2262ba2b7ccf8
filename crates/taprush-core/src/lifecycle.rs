use chrono::{DateTime, Duration, Utc};
use taprush_types::models::RoundStatus;

/// Default seconds between round creation and its start.
pub const DEFAULT_COOLDOWN_SECS: i64 = 30;

/// Default seconds a round stays active.
pub const DEFAULT_ROUND_SECS: i64 = 60;

/// Evaluate a round's status at `now`.
///
/// The active window is start-inclusive, end-exclusive. This boundary is
/// exact because it gates tap admission: a tap at `start` is accepted, a tap
/// at `end` is rejected.
pub fn status(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> RoundStatus {
    if now < start {
        RoundStatus::Cooldown
    } else if now < end {
        RoundStatus::Active
    } else {
        RoundStatus::Finished
    }
}

/// Compute a new round's window from the creation instant.
///
/// start = now + cooldown, end = start + duration. Durations come from
/// deployment config; non-positive values are a caller error and are not
/// corrected here.
pub fn schedule(
    now: DateTime<Utc>,
    cooldown_secs: i64,
    duration_secs: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now + Duration::seconds(cooldown_secs);
    let end = start + Duration::seconds(duration_secs);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn cooldown_before_start() {
        let start = at("2025-01-01T12:00:00Z");
        let end = at("2025-01-01T12:01:00Z");
        assert_eq!(
            status(start, end, at("2025-01-01T11:59:00Z")),
            RoundStatus::Cooldown
        );
    }

    #[test]
    fn active_between_start_and_end() {
        let start = at("2025-01-01T12:00:00Z");
        let end = at("2025-01-01T12:01:00Z");
        assert_eq!(
            status(start, end, at("2025-01-01T12:00:30Z")),
            RoundStatus::Active
        );
    }

    #[test]
    fn finished_after_end() {
        let start = at("2025-01-01T12:00:00Z");
        let end = at("2025-01-01T12:01:00Z");
        assert_eq!(
            status(start, end, at("2025-01-01T12:02:00Z")),
            RoundStatus::Finished
        );
    }

    #[test]
    fn boundaries_are_start_inclusive_end_exclusive() {
        let start = at("2025-01-01T12:00:00Z");
        let end = at("2025-01-01T12:01:00Z");
        assert_eq!(status(start, end, start), RoundStatus::Active);
        assert_eq!(status(start, end, end), RoundStatus::Finished);
        assert_eq!(
            status(start, end, start - Duration::milliseconds(1)),
            RoundStatus::Cooldown
        );
        assert_eq!(
            status(start, end, end - Duration::milliseconds(1)),
            RoundStatus::Active
        );
    }

    #[test]
    fn schedule_offsets_from_creation_instant() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let (start, end) = schedule(now, DEFAULT_COOLDOWN_SECS, DEFAULT_ROUND_SECS);
        assert_eq!(start, now + Duration::seconds(30));
        assert_eq!(end, now + Duration::seconds(90));
    }
}
