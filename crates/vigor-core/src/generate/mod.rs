//! Schedule generation: ask the AI backend for a plan, fall back to the
//! built-in schedule on any failure.
//!
//! [`ScheduleGenerator::try_generate`] exposes the typed outcome;
//! [`ScheduleGenerator::generate`] is total and always yields a schedule.

pub mod prompt;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::Completer;
use crate::profile::UserProfile;
use crate::schedule::{
    ScheduleParseError, SchemaPolicy, WeeklySchedule, fallback_schedule, parse_schedule,
};

pub use prompt::build_prompt;

/// Default upper bound on one AI call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default simulated generation time when no backend is configured.
pub const DEFAULT_OFFLINE_DELAY: Duration = Duration::from_secs(2);

/// Default language for generated text. Korean output is opt-in through
/// [`GeneratorConfig::language`].
pub const DEFAULT_LANGUAGE: &str = "English";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Generator settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum wall time for the AI call.
    pub timeout: Duration,
    /// How long the no-backend path waits before returning the fallback.
    pub offline_delay: Duration,
    pub schema_policy: SchemaPolicy,
    /// Language the AI should write the plan in.
    pub language: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            offline_delay: DEFAULT_OFFLINE_DELAY,
            schema_policy: SchemaPolicy::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Why a generation attempt did not produce an AI schedule.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("no AI backend is configured")]
    NotConfigured,

    #[error("AI completion failed: {0:#}")]
    Completion(anyhow::Error),

    #[error("AI completion timed out after {0:?}")]
    TimedOut(Duration),

    #[error("generation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Parse(#[from] ScheduleParseError),
}

impl GenerationFailure {
    /// The coarse reason recorded alongside a fallback schedule.
    pub fn reason(&self) -> FallbackReason {
        match self {
            Self::NotConfigured => FallbackReason::NotConfigured,
            Self::Completion(_) => FallbackReason::Completion,
            Self::TimedOut(_) => FallbackReason::TimedOut,
            Self::Cancelled => FallbackReason::Cancelled,
            Self::Parse(ScheduleParseError::Schema(_)) => FallbackReason::SchemaViolation,
            Self::Parse(_) => FallbackReason::Parse,
        }
    }
}

/// Coarse classification of why the fallback schedule was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    Completion,
    TimedOut,
    Cancelled,
    Parse,
    SchemaViolation,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotConfigured => "no AI backend configured",
            Self::Completion => "AI request failed",
            Self::TimedOut => "AI request timed out",
            Self::Cancelled => "generation cancelled",
            Self::Parse => "AI response was not a schedule",
            Self::SchemaViolation => "AI schedule failed validation",
        };
        f.write_str(s)
    }
}

/// Where a schedule came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSource {
    Ai { backend: String },
    Fallback { reason: FallbackReason },
}

/// Result of a generation cycle: always carries a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub schedule: WeeklySchedule,
    pub source: ScheduleSource,
    pub generated_at: DateTime<Utc>,
}

impl Generated {
    fn ai(schedule: WeeklySchedule, backend: &str) -> Self {
        Self {
            schedule,
            source: ScheduleSource::Ai {
                backend: backend.to_string(),
            },
            generated_at: Utc::now(),
        }
    }

    fn fallback(reason: FallbackReason) -> Self {
        Self {
            schedule: fallback_schedule(),
            source: ScheduleSource::Fallback { reason },
            generated_at: Utc::now(),
        }
    }

    /// Resolve an attempt into a schedule, substituting the fallback on
    /// failure. The failure is logged and otherwise discarded.
    pub fn from_attempt(
        attempt: Result<WeeklySchedule, GenerationFailure>,
        backend: &str,
    ) -> Self {
        match attempt {
            Ok(schedule) => {
                info!(backend, days = schedule.day_count(), "using AI-generated schedule");
                Self::ai(schedule, backend)
            }
            Err(failure) => {
                warn!(backend, error = %failure, "schedule generation failed; using built-in schedule");
                Self::fallback(failure.reason())
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ScheduleSource::Fallback { .. })
    }
}

/// Unwrap a generation attempt to a schedule, substituting the fallback.
pub trait OrFallback {
    fn or_fallback(self) -> WeeklySchedule;
}

impl OrFallback for Result<WeeklySchedule, GenerationFailure> {
    fn or_fallback(self) -> WeeklySchedule {
        self.unwrap_or_else(|failure| {
            warn!(error = %failure, "using built-in schedule");
            fallback_schedule()
        })
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Produces weekly schedules from user profiles.
#[derive(Clone)]
pub struct ScheduleGenerator {
    completer: Option<Arc<dyn Completer>>,
    config: GeneratorConfig,
}

impl ScheduleGenerator {
    /// Create a generator. `None` means no credential is configured and every
    /// generation returns the fallback.
    pub fn new(completer: Option<Arc<dyn Completer>>, config: GeneratorConfig) -> Self {
        Self { completer, config }
    }

    /// Generator backed by `completer`.
    pub fn with_completer(completer: impl Completer + 'static, config: GeneratorConfig) -> Self {
        Self::new(Some(Arc::new(completer)), config)
    }

    /// Generator with no AI backend.
    pub fn offline(config: GeneratorConfig) -> Self {
        Self::new(None, config)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Whether an AI backend is configured.
    pub fn is_configured(&self) -> bool {
        self.completer.is_some()
    }

    /// Name of the configured backend, or "none".
    pub fn backend_name(&self) -> &str {
        self.completer.as_deref().map_or("none", |c| c.name())
    }

    /// Produce a schedule for `profile`. Never fails.
    ///
    /// Without a backend this waits [`GeneratorConfig::offline_delay`] (or
    /// until cancelled) and returns the fallback without touching the
    /// network. Otherwise it runs [`Self::try_generate`] and substitutes the
    /// fallback on any failure.
    pub async fn generate(&self, profile: &UserProfile, cancel: &CancellationToken) -> Generated {
        if self.completer.is_none() {
            info!("no AI backend configured; preparing built-in schedule");
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.config.offline_delay) => {}
            }
            return Generated::fallback(FallbackReason::NotConfigured);
        }

        info!(backend = self.backend_name(), "generating weekly schedule");
        let attempt = self.try_generate(profile, cancel).await;
        Generated::from_attempt(attempt, self.backend_name())
    }

    /// Ask the backend for a schedule and parse it.
    ///
    /// The call is bounded by [`GeneratorConfig::timeout`] and aborted when
    /// `cancel` fires.
    pub async fn try_generate(
        &self,
        profile: &UserProfile,
        cancel: &CancellationToken,
    ) -> Result<WeeklySchedule, GenerationFailure> {
        let completer = self
            .completer
            .as_deref()
            .ok_or(GenerationFailure::NotConfigured)?;

        let prompt = build_prompt(profile, &self.config.language);
        debug!(prompt_chars = prompt.len(), "built generation prompt");

        let timeout = self.config.timeout;
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GenerationFailure::Cancelled),
            result = tokio::time::timeout(timeout, completer.complete(&prompt)) => match result {
                Err(_elapsed) => return Err(GenerationFailure::TimedOut(timeout)),
                Ok(Err(e)) => return Err(GenerationFailure::Completion(e)),
                Ok(Ok(text)) => text,
            },
        };
        debug!(response_chars = text.len(), "received completion");

        Ok(parse_schedule(&text, self.config.schema_policy)?)
    }
}

impl fmt::Debug for ScheduleGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleGenerator")
            .field("backend", &self.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::profile::ProfileDraft;
    use crate::schedule::ScheduleViolation;

    struct FixedCompleter {
        reply: Result<String, String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Completer for FixedCompleter {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(|e| anyhow!(e))
        }
    }

    fn fast_config() -> GeneratorConfig {
        GeneratorConfig {
            timeout: Duration::from_secs(5),
            offline_delay: Duration::ZERO,
            ..GeneratorConfig::default()
        }
    }

    fn generator(reply: Result<String, String>) -> (ScheduleGenerator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let completer = FixedCompleter {
            reply,
            calls: Arc::clone(&calls),
        };
        (ScheduleGenerator::with_completer(completer, fast_config()), calls)
    }

    fn profile() -> UserProfile {
        ProfileDraft::with_level("250").validate().unwrap()
    }

    #[test]
    fn failure_reasons() {
        assert_eq!(
            GenerationFailure::Completion(anyhow!("boom")).reason(),
            FallbackReason::Completion
        );
        assert_eq!(
            GenerationFailure::Parse(ScheduleParseError::Empty).reason(),
            FallbackReason::Parse
        );
        assert_eq!(
            GenerationFailure::Parse(ScheduleParseError::Schema(vec![
                ScheduleViolation::WrongDayCount { found: 3 }
            ]))
            .reason(),
            FallbackReason::SchemaViolation
        );
    }

    #[test]
    fn or_fallback_substitutes_builtin() {
        let attempt: Result<WeeklySchedule, GenerationFailure> = Err(GenerationFailure::Cancelled);
        assert_eq!(attempt.or_fallback(), fallback_schedule());
    }

    #[test]
    fn completion_error_message_keeps_context() {
        let err = anyhow!("connection reset").context("HTTP request failed");
        let msg = GenerationFailure::Completion(err).to_string();
        assert!(msg.contains("HTTP request failed"), "{msg}");
        assert!(msg.contains("connection reset"), "{msg}");
    }

    #[tokio::test]
    async fn ai_schedule_is_used_when_valid() {
        let json = serde_json::to_string(&fallback_schedule()).unwrap();
        let (generator, calls) = generator(Ok(format!("```json\n{json}\n```")));
        let generated = generator.generate(&profile(), &CancellationToken::new()).await;
        assert_eq!(
            generated.source,
            ScheduleSource::Ai {
                backend: "fixed".to_string()
            }
        );
        assert!(!generated.is_fallback());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn completion_error_falls_back() {
        let (generator, _) = generator(Err("503".to_string()));
        let generated = generator.generate(&profile(), &CancellationToken::new()).await;
        assert_eq!(generated.schedule, fallback_schedule());
        assert_eq!(
            generated.source,
            ScheduleSource::Fallback {
                reason: FallbackReason::Completion
            }
        );
    }

    #[tokio::test]
    async fn try_generate_without_backend_is_not_configured() {
        let generator = ScheduleGenerator::offline(fast_config());
        let err = generator
            .try_generate(&profile(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationFailure::NotConfigured));
        assert_eq!(generator.backend_name(), "none");
        assert!(!generator.is_configured());
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let (generator, _) = generator(Ok("{}".to_string()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = generator.try_generate(&profile(), &cancel).await.unwrap_err();
        assert!(matches!(err, GenerationFailure::Cancelled));
    }

    #[test]
    fn debug_shows_backend_name() {
        let (generator, _) = generator(Ok(String::new()));
        let dbg = format!("{generator:?}");
        assert!(dbg.contains("fixed"), "{dbg}");
    }
}
