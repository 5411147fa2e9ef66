//! The week/day pointer rule, independent of storage.

/// Where a user program goes after the current workout is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPosition {
    Advance { week: i32, day: i32 },
    /// The pointer ran past the final week.
    Finished,
}

/// Compute the position after `(week, day)`.
///
/// `max_day_in_week` is the highest day scheduled in `week`. When the week
/// has nothing scheduled at all, only the day moves forward.
pub fn next_position(
    week: i32,
    day: i32,
    max_day_in_week: Option<i32>,
    duration_weeks: i32,
) -> NextPosition {
    let (next_week, next_day) = match max_day_in_week {
        Some(max_day) if day + 1 > max_day => (week + 1, 1),
        _ => (week, day + 1),
    };

    if next_week > duration_weeks {
        NextPosition::Finished
    } else {
        NextPosition::Advance {
            week: next_week,
            day: next_day,
        }
    }
}
