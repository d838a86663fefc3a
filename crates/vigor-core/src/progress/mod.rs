//! Derived analytics: daily completion percentage and the projected level
//! series.

use serde::{Deserialize, Serialize};

use crate::completion::CompletionTracker;
use crate::schedule::{DAYS_PER_WEEK, DaySchedule, WeeklySchedule};

/// Starting level used for the projection when no profile is available.
pub const DEFAULT_START_LEVEL: f64 = 250.0;

/// Fractional decrease per day in the projection.
pub const DAILY_DECAY: f64 = 0.03;

/// One point of the projected level series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// "Day 1" through "Day 7".
    pub day: String,
    pub level: i64,
}

/// Percentage (0-100) of `day`'s items marked complete.
///
/// A day with no items reports 0.
pub fn completion_percentage(
    day: &DaySchedule,
    day_index: usize,
    completions: &CompletionTracker,
) -> u8 {
    let total = day.item_count();
    if total == 0 {
        return 0;
    }
    let completed = completions.completed_in_day(day_index, total);
    let pct = (100.0 * completed as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Completion percentage for the day at `day_index`, or 0 if the schedule
/// has no such day.
pub fn day_completion(
    schedule: &WeeklySchedule,
    day_index: usize,
    completions: &CompletionTracker,
) -> u8 {
    schedule
        .day(day_index)
        .map(|day| completion_percentage(day, day_index, completions))
        .unwrap_or(0)
}

/// Completion percentage for every day of the schedule, in order.
pub fn weekly_completion(schedule: &WeeklySchedule, completions: &CompletionTracker) -> Vec<u8> {
    schedule
        .week_schedule
        .iter()
        .enumerate()
        .map(|(idx, day)| completion_percentage(day, idx, completions))
        .collect()
}

/// Projected level for day `index` (0-based).
///
/// A flat decay curve that depends only on the starting level; completions
/// and plan content do not influence it.
pub fn projected_level(current_level: f64, index: usize) -> i64 {
    (current_level * (1.0 - index as f64 * DAILY_DECAY)).round() as i64
}

/// The 7-day projected level series.
pub fn projected_levels(current_level: f64) -> Vec<ProjectedPoint> {
    (0..DAYS_PER_WEEK)
        .map(|i| ProjectedPoint {
            day: format!("Day {}", i + 1),
            level: projected_level(current_level, i),
        })
        .collect()
}
