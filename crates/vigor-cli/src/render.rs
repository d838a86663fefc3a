//! Plain-text rendering of schedules and projections.

use std::fmt::Write;

use vigor_core::completion::CompletionTracker;
use vigor_core::generate::{Generated, ScheduleSource};
use vigor_core::progress::{ProjectedPoint, completion_percentage};
use vigor_core::schedule::{Category, DaySchedule, WeeklySchedule};

/// One-line description of where a schedule came from.
pub fn source_line(generated: &Generated) -> String {
    match &generated.source {
        ScheduleSource::Ai { backend } => format!("Source: AI ({backend})"),
        ScheduleSource::Fallback { reason } => format!("Source: built-in plan ({reason})"),
    }
}

fn category_tag(category: Category) -> &'static str {
    match category {
        Category::Meal => "MEAL",
        Category::Exercise => "EXERCISE",
        Category::General => "GENERAL",
    }
}

/// Render one day with completion marks and its percentage.
pub fn format_day(day: &DaySchedule, day_index: usize, completions: &CompletionTracker) -> String {
    let mut out = String::new();
    let pct = completion_percentage(day, day_index, completions);

    let _ = writeln!(out, "{} - {} ({pct}% complete)", day.day, day.theme);
    let summary = &day.daily_summary;
    if !summary.fasting_window.is_empty() || !summary.intensity.is_empty() {
        let _ = writeln!(
            out,
            "  Fasting window: {}  Intensity: {}",
            summary.fasting_window, summary.intensity
        );
    }
    let _ = writeln!(out);

    for (idx, item) in day.hourly_schedule.iter().enumerate() {
        let mark = if completions.is_complete(day_index, idx) {
            "x"
        } else {
            " "
        };
        let _ = writeln!(
            out,
            "  [{mark}] {:<2} {} {:<9} {}",
            idx,
            item.time,
            category_tag(item.category),
            item.activity
        );
        if !item.details.is_empty() {
            let _ = writeln!(out, "                         {}", item.details);
        }
        if !item.benefit.is_empty() {
            let _ = writeln!(out, "                         -> {}", item.benefit);
        }
    }
    out
}

/// Render the week overview: one line per day with its completion.
pub fn format_week(schedule: &WeeklySchedule, completions: &CompletionTracker) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<4} {:<12} {:>5}  THEME", "#", "DAY", "DONE");
    let _ = writeln!(out, "{}", "-".repeat(48));
    for (idx, day) in schedule.week_schedule.iter().enumerate() {
        let pct = completion_percentage(day, idx, completions);
        let _ = writeln!(out, "{:<4} {:<12} {:>4}%  {}", idx, day.day, pct, day.theme);
    }

    let guidelines = &schedule.weekly_guidelines;
    if !guidelines.dietary_principles.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Dietary principles:");
        for principle in &guidelines.dietary_principles {
            let _ = writeln!(out, "  - {principle}");
        }
    }
    if !guidelines.expected_progress.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Expected progress: {}", guidelines.expected_progress);
    }
    out
}

/// Render the projected level series as a table with a bar per day.
pub fn format_projection(series: &[ProjectedPoint]) -> String {
    let mut out = String::new();
    let max = series.iter().map(|p| p.level).max().unwrap_or(0).max(1);
    for point in series {
        let width = (point.level.max(0) * 40 / max) as usize;
        let _ = writeln!(
            out,
            "{:<6} {:>5} mg/dL  {}",
            point.day,
            point.level,
            "#".repeat(width)
        );
    }
    out
}
