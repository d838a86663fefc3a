//! Weekly schedule model: the 7-day routine, its items, and validation.
//!
//! The serde mapping follows the JSON contract the AI service is asked to
//! produce (camelCase keys), so a parsed response deserializes directly into
//! these types.

pub mod fallback;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fallback::{fallback_ref, fallback_schedule};
pub use parser::{ScheduleParseError, SchemaPolicy, parse_schedule, strip_code_fence};

/// Number of days in a weekly schedule.
pub const DAYS_PER_WEEK: usize = 7;

/// Lower bound on items per day requested from the AI service.
pub const MIN_ITEMS_PER_DAY: usize = 5;

/// Upper bound on items per day; more than this is a schema violation.
pub const MAX_ITEMS_PER_DAY: usize = 7;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Kind of routine item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Meal,
    Exercise,
    General,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Meal, Self::Exercise, Self::General];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Meal => "meal",
            Self::Exercise => "exercise",
            Self::General => "general",
        };
        f.write_str(s)
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meal" => Ok(Self::Meal),
            "exercise" => Ok(Self::Exercise),
            "general" => Ok(Self::General),
            other => Err(CategoryParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Category`] string.
#[derive(Debug, Clone, Error)]
#[error("invalid category: {0:?} (expected meal, exercise, or general)")]
pub struct CategoryParseError(pub String);

// ---------------------------------------------------------------------------
// Schedule types
// ---------------------------------------------------------------------------

/// A single timed entry in a day's routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Time of day, normally `HH:MM`.
    pub time: String,
    /// Short label, e.g. "Brisk walk".
    pub activity: String,
    pub category: Category,
    #[serde(default)]
    pub details: String,
    /// Why the item helps.
    #[serde(default)]
    pub benefit: String,
}

/// Per-day summary shown next to the routine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Duration label, e.g. "14 hours".
    #[serde(default)]
    pub fasting_window: String,
    /// Qualitative effort label, e.g. "moderate".
    #[serde(default)]
    pub intensity: String,
}

/// One day of the weekly routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// Day label, e.g. "Monday".
    pub day: String,
    #[serde(default)]
    pub theme: String,
    pub hourly_schedule: Vec<ScheduleItem>,
    #[serde(default)]
    pub daily_summary: DailySummary,
}

impl DaySchedule {
    /// Number of items in this day's routine.
    pub fn item_count(&self) -> usize {
        self.hourly_schedule.len()
    }

    /// Count items of the given category.
    pub fn count_category(&self, category: Category) -> usize {
        self.hourly_schedule
            .iter()
            .filter(|item| item.category == category)
            .count()
    }
}

/// Guidance that applies to the whole week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGuidelines {
    #[serde(default)]
    pub dietary_principles: Vec<String>,
    #[serde(default)]
    pub expected_progress: String,
}

/// The full 7-day routine, either AI-generated or the built-in fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    pub week_schedule: Vec<DaySchedule>,
    #[serde(default)]
    pub weekly_guidelines: WeeklyGuidelines,
}

impl WeeklySchedule {
    /// Look up a day by index.
    pub fn day(&self, index: usize) -> Option<&DaySchedule> {
        self.week_schedule.get(index)
    }

    /// Number of days in the schedule (7 for any valid schedule).
    pub fn day_count(&self) -> usize {
        self.week_schedule.len()
    }

    /// Check the structural invariants and return every violation found.
    ///
    /// - exactly [`DAYS_PER_WEEK`] days
    /// - every day has between 1 and [`MAX_ITEMS_PER_DAY`] items
    /// - items are ordered by time wherever adjacent times parse as `HH:MM`
    pub fn validate(&self) -> Result<(), Vec<ScheduleViolation>> {
        let mut violations = Vec::new();

        if self.week_schedule.len() != DAYS_PER_WEEK {
            violations.push(ScheduleViolation::WrongDayCount {
                found: self.week_schedule.len(),
            });
        }

        for (day_idx, day) in self.week_schedule.iter().enumerate() {
            let count = day.hourly_schedule.len();
            if count == 0 {
                violations.push(ScheduleViolation::EmptyDay { day: day_idx });
                continue;
            }
            if count > MAX_ITEMS_PER_DAY {
                violations.push(ScheduleViolation::TooManyItems {
                    day: day_idx,
                    count,
                });
            }

            let times: Vec<Option<NaiveTime>> = day
                .hourly_schedule
                .iter()
                .map(|item| parse_clock(&item.time))
                .collect();
            for (item_idx, pair) in times.windows(2).enumerate() {
                if let (Some(prev), Some(next)) = (pair[0], pair[1]) {
                    if next < prev {
                        violations.push(ScheduleViolation::OutOfOrder {
                            day: day_idx,
                            item: item_idx + 1,
                        });
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Whether every day has between [`MIN_ITEMS_PER_DAY`] and
    /// [`MAX_ITEMS_PER_DAY`] items, as the prompt requests. Advisory only.
    pub fn is_within_prompt_bounds(&self) -> bool {
        self.week_schedule
            .iter()
            .all(|d| (MIN_ITEMS_PER_DAY..=MAX_ITEMS_PER_DAY).contains(&d.item_count()))
    }
}

/// Parse an `HH:MM` (or `H:MM`) clock label.
fn parse_clock(label: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(label.trim(), "%H:%M").ok()
}

/// A structural problem found by [`WeeklySchedule::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    #[error("expected {DAYS_PER_WEEK} days, found {found}")]
    WrongDayCount { found: usize },

    #[error("day {day} has no items")]
    EmptyDay { day: usize },

    #[error("day {day} has {count} items (max {MAX_ITEMS_PER_DAY})")]
    TooManyItems { day: usize, count: usize },

    #[error("item {item} of day {day} is earlier than the item before it")]
    OutOfOrder { day: usize, item: usize },
}
