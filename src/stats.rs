use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// 1-indexed day count since the first completion; 1 when there is none yet.
pub fn day_number_at(today: NaiveDate, first_completion: Option<NaiveDate>) -> u32 {
    match first_completion {
        Some(first) => {
            let elapsed = (today - first).num_days().max(0);
            u32::try_from(elapsed + 1).unwrap_or(u32::MAX)
        }
        None => 1,
    }
}

/// Consecutive days with a completion, ending today or yesterday.
pub fn streak_at(today: NaiveDate, dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut cursor = if dates.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0u32;
    while dates.contains(&cursor) {
        streak = streak.saturating_add(1);
        cursor -= Duration::days(1);
    }
    streak
}
