//! Parser for AI-generated schedule text.
//!
//! The AI service is asked for a bare JSON object but often wraps it in a
//! markdown code fence. Parsing strips the fence, deserializes the JSON, and
//! (depending on [`SchemaPolicy`]) checks the structural invariants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ScheduleViolation, WeeklySchedule};

/// How strictly a successfully-parsed schedule is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Reject schedules that violate [`WeeklySchedule::validate`].
    #[default]
    Enforce,
    /// Accept any schedule that deserializes, even with the wrong number of
    /// days.
    AcceptParsed,
}

impl std::fmt::Display for SchemaPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enforce => f.write_str("enforce"),
            Self::AcceptParsed => f.write_str("accept_parsed"),
        }
    }
}

impl std::str::FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enforce" => Ok(Self::Enforce),
            "accept_parsed" => Ok(Self::AcceptParsed),
            other => Err(format!(
                "invalid schema policy {other:?} (expected enforce or accept_parsed)"
            )),
        }
    }
}

/// Errors from parsing AI response text into a [`WeeklySchedule`].
#[derive(Debug, Error)]
pub enum ScheduleParseError {
    #[error("response is empty")]
    Empty,

    #[error("response is not a valid schedule: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schedule violates the schema: {}", join_violations(.0))]
    Schema(Vec<ScheduleViolation>),
}

fn join_violations(violations: &[ScheduleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remove a surrounding markdown code fence, if any.
///
/// Handles ```` ```json ````, ```` ```JSON ```` and bare ```` ``` ```` openers,
/// and text before the fence (some models prepend a sentence). Text without a
/// fence is returned trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    // Backticks inside an unfenced JSON body are content, not a fence.
    if trimmed[..open].contains('{') {
        return trimmed;
    }

    let after_ticks = &trimmed[open + 3..];
    // Skip the info string ("json") up to the end of the opening line.
    let body = match after_ticks.find('\n') {
        Some(nl) if after_ticks[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after_ticks[nl + 1..]
        }
        _ => after_ticks
            .strip_prefix("json")
            .or_else(|| after_ticks.strip_prefix("JSON"))
            .unwrap_or(after_ticks),
    };

    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parse AI response text into a schedule.
pub fn parse_schedule(
    text: &str,
    policy: SchemaPolicy,
) -> Result<WeeklySchedule, ScheduleParseError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ScheduleParseError::Empty);
    }

    let schedule: WeeklySchedule = serde_json::from_str(body)?;

    if policy == SchemaPolicy::Enforce {
        schedule.validate().map_err(ScheduleParseError::Schema)?;
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::fallback_schedule;

    fn fallback_json() -> String {
        serde_json::to_string_pretty(&fallback_schedule()).unwrap()
    }

    #[test]
    fn strip_plain_text_is_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn strip_json_fence() {
        let text = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(text), "{\"a\":1}");
    }

    #[test]
    fn strip_bare_fence() {
        let text = "```\n{\"a\":1}\n```\n";
        assert_eq!(strip_code_fence(text), "{\"a\":1}");
    }

    #[test]
    fn strip_inline_fence_without_newline() {
        let text = "```json {\"a\":1} ```";
        assert_eq!(strip_code_fence(text), "{\"a\":1}");
    }

    #[test]
    fn strip_fence_with_leading_prose() {
        let text = "Here is your plan:\n```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(text), "{\"a\":1}");
    }

    #[test]
    fn strip_leaves_backticks_inside_unfenced_json() {
        let text = "{\"details\": \"use ``` here\"}";
        assert_eq!(strip_code_fence(text), text);
    }

    #[test]
    fn strip_unclosed_fence() {
        let text = "```json\n{\"a\":1}";
        assert_eq!(strip_code_fence(text), "{\"a\":1}");
    }

    #[test]
    fn parse_accepts_fenced_valid_schedule() {
        let text = format!("```json\n{}\n```", fallback_json());
        let parsed = parse_schedule(&text, SchemaPolicy::Enforce).unwrap();
        assert_eq!(parsed, fallback_schedule());
    }

    #[test]
    fn parse_rejects_empty_text() {
        assert!(matches!(
            parse_schedule("   ", SchemaPolicy::Enforce),
            Err(ScheduleParseError::Empty)
        ));
        assert!(matches!(
            parse_schedule("```json\n```", SchemaPolicy::AcceptParsed),
            Err(ScheduleParseError::Empty)
        ));
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse_schedule("Sorry, I can't help with that.", SchemaPolicy::Enforce)
            .unwrap_err();
        assert!(matches!(err, ScheduleParseError::Json(_)));
    }

    #[test]
    fn six_days_rejected_when_enforced_accepted_otherwise() {
        let mut short = fallback_schedule();
        short.week_schedule.pop();
        let text = format!("```json {} ```", serde_json::to_string(&short).unwrap());

        let err = parse_schedule(&text, SchemaPolicy::Enforce).unwrap_err();
        match err {
            ScheduleParseError::Schema(v) => {
                assert_eq!(v, vec![ScheduleViolation::WrongDayCount { found: 6 }]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }

        let accepted = parse_schedule(&text, SchemaPolicy::AcceptParsed).unwrap();
        assert_eq!(accepted.day_count(), 6);
    }

    #[test]
    fn schema_error_message_lists_violations() {
        let err = ScheduleParseError::Schema(vec![
            ScheduleViolation::WrongDayCount { found: 2 },
            ScheduleViolation::EmptyDay { day: 1 },
        ]);
        assert_eq!(
            err.to_string(),
            "schedule violates the schema: expected 7 days, found 2; day 1 has no items"
        );
    }

    #[test]
    fn schema_policy_parse_and_display() {
        assert_eq!("enforce".parse::<SchemaPolicy>().unwrap(), SchemaPolicy::Enforce);
        assert_eq!(
            "accept_parsed".parse::<SchemaPolicy>().unwrap(),
            SchemaPolicy::AcceptParsed
        );
        assert!("lenient".parse::<SchemaPolicy>().is_err());
        assert_eq!(SchemaPolicy::AcceptParsed.to_string(), "accept_parsed");
        assert_eq!(SchemaPolicy::default(), SchemaPolicy::Enforce);
    }
}
