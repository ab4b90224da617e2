//! Daily completion streaks and the XP multiplier they earn.
//!
//! A streak counts consecutive calendar days with at least one completed
//! task. Day boundaries are UTC calendar days — the single canonical
//! definition shared by streak math and the `maintain_streak` daily quest, so
//! the two can never disagree about what "yesterday" means. Only the first
//! completion of a day can move the streak; later completions the same day
//! leave it untouched.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// The canonical calendar day a timestamp falls on.
pub fn utc_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Half-open UTC interval `[00:00:00 of day, 00:00:00 of next day)`.
///
/// Equivalent to the inclusive 00:00:00–23:59:59.999… day window without
/// having to name a last representable instant.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Days::new(1))
}

/// The streak value to apply on a completion, and whether it was newly
/// applied (first completion of the day) or carried over unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakOutcome {
    /// Streak value to store on the user.
    pub streak: u32,
    /// True iff this was the first completion of the day, i.e. the streak
    /// was extended, reset, or started by this completion.
    pub advanced: bool,
}

/// Decide the streak for a completion happening "today".
///
/// `completed_earlier_today` and `completed_yesterday` count tasks already
/// completed in those UTC day windows, excluding the task being completed
/// right now.
pub fn streak_on_completion(
    stored: u32,
    completed_earlier_today: u64,
    completed_yesterday: u64,
) -> StreakOutcome {
    if completed_earlier_today > 0 {
        // Not the first completion today: the streak was already settled.
        return StreakOutcome {
            streak: stored,
            advanced: false,
        };
    }

    let streak = if completed_yesterday > 0 {
        stored + 1
    } else {
        1
    };

    StreakOutcome {
        streak,
        advanced: true,
    }
}

/// XP multiplier earned by a streak: 2.0 at 7+ days, 1.5 at 3+, else 1.0.
pub fn streak_multiplier(streak: u32) -> f64 {
    if streak >= 7 {
        2.0
    } else if streak >= 3 {
        1.5
    } else {
        1.0
    }
}

/// Final XP for a completion: `round(base × multiplier)`.
pub fn apply_multiplier(base_xp: u64, multiplier: f64) -> u64 {
    (base_xp as f64 * multiplier).round() as u64
}
