//! Core library for vigor: profile validation, AI schedule generation with a
//! built-in fallback, completion tracking, progress analytics, and the
//! session state machine tying them together.

pub mod ai;
pub mod completion;
pub mod generate;
pub mod profile;
pub mod progress;
pub mod schedule;
pub mod session;

pub use ai::Completer;
pub use generate::{
    FallbackReason, Generated, GenerationFailure, GeneratorConfig, OrFallback, ScheduleGenerator,
    ScheduleSource,
};
pub use profile::{ProfileDraft, ProfileError, UserProfile};
pub use schedule::{SchemaPolicy, WeeklySchedule};
pub use session::{Session, SessionError, SessionPhase};
