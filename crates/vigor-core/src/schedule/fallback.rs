//! Built-in fallback schedule.
//!
//! The plan is hand-authored in `fallback.toml` and embedded in the binary at
//! compile time. It is parsed once into a process-wide static; callers get a
//! clone.

use std::sync::LazyLock;

use super::WeeklySchedule;

/// The embedded fallback schedule TOML.
static FALLBACK_TOML: &str = include_str!("fallback.toml");

/// Parsed fallback schedule.
///
/// # Panics
///
/// Panics on first access if the embedded TOML is malformed. The file ships
/// with the binary and is covered by the tests below, so a built binary
/// always carries a valid plan.
static FALLBACK: LazyLock<WeeklySchedule> = LazyLock::new(|| {
    toml::from_str(FALLBACK_TOML).expect("embedded fallback.toml is invalid")
});

/// Return the built-in 7-day schedule.
///
/// Deterministic: every call returns the same content.
pub fn fallback_schedule() -> WeeklySchedule {
    FALLBACK.clone()
}

/// Borrow the built-in schedule without cloning.
pub fn fallback_ref() -> &'static WeeklySchedule {
    &FALLBACK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Category, DAYS_PER_WEEK};

    #[test]
    fn fallback_parses_and_validates() {
        let schedule = fallback_schedule();
        assert_eq!(schedule.day_count(), DAYS_PER_WEEK);
        schedule.validate().expect("fallback must satisfy invariants");
        assert!(schedule.is_within_prompt_bounds());
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_schedule(), fallback_schedule());
        assert_eq!(&fallback_schedule(), fallback_ref());
    }

    #[test]
    fn fallback_days_have_themes_and_summaries() {
        for day in &fallback_ref().week_schedule {
            assert!(!day.theme.is_empty(), "{} has no theme", day.day);
            assert!(!day.daily_summary.fasting_window.is_empty());
            assert!(!day.daily_summary.intensity.is_empty());
        }
    }

    #[test]
    fn fallback_covers_every_category_each_day() {
        for day in &fallback_ref().week_schedule {
            for category in Category::ALL {
                assert!(
                    day.count_category(category) > 0,
                    "{} has no {category} item",
                    day.day
                );
            }
        }
    }

    #[test]
    fn fallback_has_weekly_guidelines() {
        let g = &fallback_ref().weekly_guidelines;
        assert_eq!(g.dietary_principles.len(), 3);
        assert!(!g.expected_progress.is_empty());
    }

    #[test]
    fn fallback_first_day_matches_authored_content() {
        let monday = fallback_ref().day(0).unwrap();
        assert_eq!(monday.day, "Monday");
        assert_eq!(monday.item_count(), 5);
        assert_eq!(monday.hourly_schedule[0].time, "06:00");
        assert_eq!(monday.hourly_schedule[1].category, Category::Exercise);
    }
}
