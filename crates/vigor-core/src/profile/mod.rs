//! User profile and the validator that gates schedule generation.
//!
//! A [`ProfileDraft`] is what the user edits: the current level is free
//! text. [`ProfileDraft::validate`] turns it into a [`UserProfile`], the
//! immutable input to one generation call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default wake-up time label.
pub const DEFAULT_WAKE_TIME: &str = "06:00";

/// Default bedtime label.
pub const DEFAULT_SLEEP_TIME: &str = "22:00";

// ---------------------------------------------------------------------------
// Enumerated choices
// ---------------------------------------------------------------------------

/// Error returned when parsing an invalid profile choice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {value:?} (expected one of: {expected})")]
pub struct ChoiceParseError {
    pub field: &'static str,
    pub value: String,
    pub expected: String,
}

/// Defines a snake_case choice enum with `Display`, `FromStr`, and a
/// human-readable description for prompts.
macro_rules! profile_choice {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $variant:ident => $text:literal, $describe:literal; )+
        }
        default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// Phrase used when describing the profile to the AI service.
            pub fn describe(self) -> &'static str {
                match self {
                    $( Self::$variant => $describe, )+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self {
                    $( Self::$variant => $text, )+
                };
                f.write_str(s)
            }
        }

        impl FromStr for $name {
            type Err = ChoiceParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(ChoiceParseError {
                        field: $field,
                        value: other.to_owned(),
                        expected: Self::ALL
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }
    };
}

profile_choice! {
    /// The user's working pattern.
    WorkSchedule, "work schedule" {
        Standard => "standard", "standard daytime office hours";
        Shift => "shift", "rotating shift work";
        Remote => "remote", "remote work from home";
        Irregular => "irregular", "irregular, unpredictable hours";
    }
    default Standard
}

profile_choice! {
    /// How much exercise the user is used to.
    ExerciseLevel, "exercise level" {
        Beginner => "beginner", "beginner, little regular exercise";
        Intermediate => "intermediate", "intermediate, exercises a few times a week";
        Advanced => "advanced", "advanced, trains most days";
    }
    default Beginner
}

profile_choice! {
    /// Dietary style the plan should follow.
    DietaryPreference, "dietary preference" {
        General => "general", "general balanced diet";
        Korean => "korean", "mostly Korean cuisine";
        Vegetarian => "vegetarian", "vegetarian";
        Pescatarian => "pescatarian", "pescatarian (vegetarian plus fish)";
    }
    default General
}

// ---------------------------------------------------------------------------
// Profile types
// ---------------------------------------------------------------------------

/// Editable profile form. All fields are optional in spirit; only the
/// current level must be filled in before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    /// Current metric level as typed by the user (mg/dL).
    pub current_level: String,
    pub wake_time: String,
    pub sleep_time: String,
    pub work_schedule: WorkSchedule,
    pub exercise_level: ExerciseLevel,
    pub dietary_preference: DietaryPreference,
}

impl Default for ProfileDraft {
    fn default() -> Self {
        Self {
            current_level: String::new(),
            wake_time: DEFAULT_WAKE_TIME.to_string(),
            sleep_time: DEFAULT_SLEEP_TIME.to_string(),
            work_schedule: WorkSchedule::default(),
            exercise_level: ExerciseLevel::default(),
            dietary_preference: DietaryPreference::default(),
        }
    }
}

impl ProfileDraft {
    /// Draft with only the current level filled in.
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            current_level: level.into(),
            ..Self::default()
        }
    }

    /// Validate the draft and produce a [`UserProfile`].
    ///
    /// Only the current level is checked. Wake and sleep times are opaque
    /// labels; blank ones are replaced by the defaults.
    pub fn validate(&self) -> Result<UserProfile, ProfileError> {
        let current_level = parse_level(&self.current_level)?;
        Ok(UserProfile {
            current_level,
            wake_time: label_or_default(&self.wake_time, DEFAULT_WAKE_TIME),
            sleep_time: label_or_default(&self.sleep_time, DEFAULT_SLEEP_TIME),
            work_schedule: self.work_schedule,
            exercise_level: self.exercise_level,
            dietary_preference: self.dietary_preference,
        })
    }
}

/// Whether the draft may be submitted for generation.
pub fn is_submittable(draft: &ProfileDraft) -> bool {
    parse_level(&draft.current_level).is_ok()
}

fn label_or_default(label: &str, default: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_level(raw: &str) -> Result<f64, ProfileError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::MissingLevel);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ProfileError::NonNumericLevel(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(ProfileError::NonNumericLevel(trimmed.to_string()));
    }
    if value <= 0.0 {
        return Err(ProfileError::NonPositiveLevel(value));
    }
    Ok(value)
}

/// A validated profile: the immutable input to one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Current metric level (mg/dL), always finite and positive.
    pub current_level: f64,
    pub wake_time: String,
    pub sleep_time: String,
    pub work_schedule: WorkSchedule,
    pub exercise_level: ExerciseLevel,
    pub dietary_preference: DietaryPreference,
}

/// Why a profile draft cannot be submitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("current level is required")]
    MissingLevel,

    #[error("current level {0:?} is not a number")]
    NonNumericLevel(String),

    #[error("current level must be positive, got {0}")]
    NonPositiveLevel(f64),
}
