//! Prompt construction for schedule generation.
//!
//! Pure string assembly: the user's profile, the output requirements, and a
//! JSON schema reference the response must follow.

use crate::profile::UserProfile;
use crate::schedule::{DAYS_PER_WEEK, MAX_ITEMS_PER_DAY, MIN_ITEMS_PER_DAY};

/// JSON schema reference included in the prompt.
const SCHEMA_REFERENCE: &str = r#"## Output Schema

```json
{
  "weekSchedule": [
    {
      "day": "string",              // day label, e.g. "Monday"
      "theme": "string",            // unique focus for the day
      "hourlySchedule": [
        {
          "time": "HH:MM",
          "activity": "string",     // short label
          "category": "meal | exercise | general",
          "details": "string",
          "benefit": "string"
        }
      ],
      "dailySummary": {
        "fastingWindow": "string",  // e.g. "14 hours"
        "intensity": "string"       // e.g. "moderate"
      }
    }
  ],
  "weeklyGuidelines": {
    "dietaryPrinciples": ["string"],
    "expectedProgress": "string"
  }
}
```
"#;

/// Build the generation prompt for `profile`, asking for output in
/// `language`.
pub fn build_prompt(profile: &UserProfile, language: &str) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "Based on this user profile, create a highly detailed, non-repetitive \
         7-day triglyceride management program as a single JSON object.\n\n",
    );

    prompt.push_str("## Profile\n\n");
    prompt.push_str(&format!(
        "- Current triglyceride level: {} mg/dL\n",
        format_level(profile.current_level)
    ));
    prompt.push_str(&format!(
        "- Wake time: {}, sleep time: {}\n",
        profile.wake_time, profile.sleep_time
    ));
    prompt.push_str(&format!(
        "- Work schedule: {}\n",
        profile.work_schedule.describe()
    ));
    prompt.push_str(&format!(
        "- Exercise level: {}\n",
        profile.exercise_level.describe()
    ));
    prompt.push_str(&format!(
        "- Diet: {}\n\n",
        profile.dietary_preference.describe()
    ));

    prompt.push_str("## Requirements\n\n");
    prompt.push_str(&format!(
        "1. \"weekSchedule\" is an array of exactly {DAYS_PER_WEEK} days.\n"
    ));
    prompt.push_str(
        "2. Every day has a central \"theme\" that is unique within the week \
         (e.g. \"Cardio day\", \"Omega-3 day\").\n",
    );
    prompt.push_str(&format!(
        "3. \"hourlySchedule\" has {MIN_ITEMS_PER_DAY}-{MAX_ITEMS_PER_DAY} events per day, \
         ordered by time, each with time, activity, category (meal, exercise, or general), \
         details, and benefit.\n"
    ));
    prompt.push_str(
        "4. \"dailySummary\" is an object with \"fastingWindow\" and \"intensity\".\n",
    );
    prompt.push_str(
        "5. Vary the exercise types and meals across days; do not repeat a day.\n",
    );
    prompt.push_str(
        "6. Fit the routine between the wake and sleep times and respect the diet.\n",
    );
    prompt.push_str(
        "7. Include \"weeklyGuidelines\" with \"dietaryPrinciples\" (short rules) \
         and \"expectedProgress\".\n",
    );
    prompt.push_str(
        "8. Return ONLY the JSON object. No Markdown, no code fences, no commentary.\n",
    );
    prompt.push_str(&format!(
        "9. Write all text values in {language}. Keep JSON keys and category values in English.\n\n"
    ));

    prompt.push_str(SCHEMA_REFERENCE);
    prompt
}

/// Render the level without a trailing `.0` for whole numbers.
fn format_level(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{level:.0}")
    } else {
        level.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{DietaryPreference, ExerciseLevel, ProfileDraft, WorkSchedule};

    fn profile() -> UserProfile {
        ProfileDraft {
            wake_time: "05:30".to_string(),
            sleep_time: "23:00".to_string(),
            work_schedule: WorkSchedule::Shift,
            exercise_level: ExerciseLevel::Advanced,
            dietary_preference: DietaryPreference::Pescatarian,
            ..ProfileDraft::with_level("250")
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn prompt_includes_profile() {
        let prompt = build_prompt(&profile(), "English");
        assert!(prompt.contains("250 mg/dL"));
        assert!(prompt.contains("Wake time: 05:30, sleep time: 23:00"));
        assert!(prompt.contains("rotating shift work"));
        assert!(prompt.contains("advanced, trains most days"));
        assert!(prompt.contains("pescatarian"));
    }

    #[test]
    fn prompt_states_shape_requirements() {
        let prompt = build_prompt(&profile(), "English");
        assert!(prompt.contains("exactly 7 days"));
        assert!(prompt.contains("5-7 events per day"));
        assert!(prompt.contains("fastingWindow"));
        assert!(prompt.contains("dietaryPrinciples"));
        assert!(prompt.contains("Return ONLY the JSON object"));
    }

    #[test]
    fn prompt_includes_schema_reference() {
        let prompt = build_prompt(&profile(), "English");
        assert!(prompt.contains("Output Schema"));
        assert!(prompt.contains("\"hourlySchedule\""));
        assert!(prompt.contains("meal | exercise | general"));
    }

    #[test]
    fn prompt_names_target_language() {
        let prompt = build_prompt(&profile(), "Korean");
        assert!(prompt.contains("Write all text values in Korean"));
    }

    #[test]
    fn fractional_level_keeps_decimals() {
        assert_eq!(format_level(187.5), "187.5");
        assert_eq!(format_level(300.0), "300");
    }
}
