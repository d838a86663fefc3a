//! Session state machine and session-scoped store.
//!
//! A [`Session`] owns the current profile, the generated schedule, the
//! completion marks and the selected day. Phase changes go through
//! [`is_valid_transition`]; generation results are accepted only with the
//! ticket issued when the generation started.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::completion::CompletionTracker;
use crate::generate::{Generated, ScheduleGenerator};
use crate::profile::{ProfileDraft, ProfileError, UserProfile};
use crate::progress::{self, DEFAULT_START_LEVEL, ProjectedPoint};
use crate::schedule::{DaySchedule, WeeklySchedule};

/// Where the session is in the input / generate / view cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Validating,
    Generating,
    Ready,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Generating => "generating",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Check whether `from -> to` is an edge of the phase graph:
///
/// ```text
/// idle       -> validating
/// validating -> idle        (profile rejected)
/// validating -> generating
/// generating -> ready
/// generating -> idle        (generation abandoned)
/// ready      -> validating  (regenerate)
/// ready      -> idle        (back to input)
/// ```
pub fn is_valid_transition(from: SessionPhase, to: SessionPhase) -> bool {
    use SessionPhase::*;
    matches!(
        (from, to),
        (Idle, Validating)
            | (Validating, Idle)
            | (Validating, Generating)
            | (Generating, Ready)
            | (Generating, Idle)
            | (Ready, Validating)
            | (Ready, Idle)
    )
}

/// Identifies one generation. Only the most recently issued ticket can
/// install a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTicket(Uuid);

impl GenerationTicket {
    fn issue() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GenerationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionPhase, to: SessionPhase },

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("generation result does not belong to the current generation")]
    StaleTicket,

    #[error("no schedule has been generated")]
    NoSchedule,

    #[error("day {index} is out of range (schedule has {days} days)")]
    DayOutOfRange { index: usize, days: usize },
}

/// One user's in-memory session.
#[derive(Debug)]
pub struct Session {
    phase: SessionPhase,
    profile: Option<UserProfile>,
    generated: Option<Generated>,
    completions: CompletionTracker,
    selected_day: usize,
    pending: Option<GenerationTicket>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            profile: None,
            generated: None,
            completions: CompletionTracker::new(),
            selected_day: 0,
            pending: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The last accepted profile.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    fn transition(&mut self, to: SessionPhase) -> Result<(), SessionError> {
        let from = self.phase;
        if !is_valid_transition(from, to) {
            return Err(SessionError::InvalidTransition { from, to });
        }
        debug!(%from, %to, "session transition");
        self.phase = to;
        Ok(())
    }

    /// Validate `draft` and start a generation.
    ///
    /// Legal from `Idle` or `Ready`. A rejected draft returns the session to
    /// `Idle`. On success the profile is stored, the session enters
    /// `Generating`, and the returned ticket must be passed to
    /// [`Self::finish`].
    pub fn submit(&mut self, draft: &ProfileDraft) -> Result<GenerationTicket, SessionError> {
        self.begin(draft).map(|(ticket, _)| ticket)
    }

    fn begin(
        &mut self,
        draft: &ProfileDraft,
    ) -> Result<(GenerationTicket, UserProfile), SessionError> {
        self.transition(SessionPhase::Validating)?;
        let profile = match draft.validate() {
            Ok(profile) => profile,
            Err(e) => {
                self.transition(SessionPhase::Idle)?;
                return Err(e.into());
            }
        };
        self.transition(SessionPhase::Generating)?;
        self.profile = Some(profile.clone());
        let ticket = GenerationTicket::issue();
        self.pending = Some(ticket);
        info!(%ticket, level = profile.current_level, "generation started");
        Ok((ticket, profile))
    }

    /// Install a generation result.
    ///
    /// Replaces the schedule wholesale, clears every completion mark and
    /// selects the first day.
    pub fn finish(
        &mut self,
        ticket: GenerationTicket,
        generated: Generated,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Generating || self.pending != Some(ticket) {
            return Err(SessionError::StaleTicket);
        }
        self.transition(SessionPhase::Ready)?;
        self.pending = None;
        self.completions.clear();
        self.selected_day = 0;
        info!(
            %ticket,
            fallback = generated.is_fallback(),
            days = generated.schedule.day_count(),
            "schedule installed"
        );
        self.generated = Some(generated);
        Ok(())
    }

    /// Abandon the generation identified by `ticket` and return to `Idle`.
    ///
    /// A previously installed schedule is kept but hidden until the next
    /// generation finishes.
    pub fn abort(&mut self, ticket: GenerationTicket) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Generating || self.pending != Some(ticket) {
            return Err(SessionError::StaleTicket);
        }
        self.transition(SessionPhase::Idle)?;
        self.pending = None;
        info!(%ticket, "generation abandoned");
        Ok(())
    }

    /// Submit `draft`, run `generator`, and install the result.
    ///
    /// Only profile and transition errors surface; generation itself
    /// always yields a schedule. If the returned future is dropped before
    /// completing, the generation is aborted and the session returns to
    /// `Idle`.
    pub async fn generate(
        &mut self,
        draft: &ProfileDraft,
        generator: &ScheduleGenerator,
        cancel: &CancellationToken,
    ) -> Result<&Generated, SessionError> {
        let (ticket, profile) = self.begin(draft)?;
        let in_flight = InFlight {
            session: &mut *self,
            ticket,
        };
        let generated = generator.generate(&profile, cancel).await;
        in_flight.session.finish(ticket, generated)?;
        drop(in_flight);
        self.generated()
    }

    /// Leave the schedule view and return to profile input.
    pub fn back_to_input(&mut self) -> Result<(), SessionError> {
        self.transition(SessionPhase::Idle)
    }

    /// The current generation result, with its source.
    pub fn generated(&self) -> Result<&Generated, SessionError> {
        if self.phase != SessionPhase::Ready {
            return Err(SessionError::NoSchedule);
        }
        self.generated.as_ref().ok_or(SessionError::NoSchedule)
    }

    pub fn schedule(&self) -> Result<&WeeklySchedule, SessionError> {
        self.generated().map(|g| &g.schedule)
    }

    pub fn selected_day(&self) -> usize {
        self.selected_day
    }

    pub fn select_day(&mut self, index: usize) -> Result<(), SessionError> {
        let days = self.schedule()?.day_count();
        if index >= days {
            return Err(SessionError::DayOutOfRange { index, days });
        }
        self.selected_day = index;
        Ok(())
    }

    pub fn selected_day_schedule(&self) -> Result<&DaySchedule, SessionError> {
        let schedule = self.schedule()?;
        schedule
            .day(self.selected_day)
            .ok_or(SessionError::DayOutOfRange {
                index: self.selected_day,
                days: schedule.day_count(),
            })
    }

    /// Flip the completion mark of an item and return the new value.
    /// Indices are not checked against the schedule.
    pub fn toggle(&mut self, day: usize, item: usize) -> Result<bool, SessionError> {
        self.schedule()?;
        Ok(self.completions.toggle(day, item))
    }

    pub fn is_complete(&self, day: usize, item: usize) -> bool {
        self.completions.is_complete(day, item)
    }

    pub fn completions(&self) -> &CompletionTracker {
        &self.completions
    }

    /// Completion percentage of the selected day.
    pub fn progress(&self) -> Result<u8, SessionError> {
        self.day_progress(self.selected_day)
    }

    /// Completion percentage of the day at `index` (0 if out of range).
    pub fn day_progress(&self, index: usize) -> Result<u8, SessionError> {
        let schedule = self.schedule()?;
        Ok(progress::day_completion(schedule, index, &self.completions))
    }

    /// Projected level series from the profile's level, or the default
    /// starting level when no profile has been accepted.
    pub fn projection(&self) -> Vec<ProjectedPoint> {
        let level = self
            .profile
            .as_ref()
            .map_or(DEFAULT_START_LEVEL, |p| p.current_level);
        progress::projected_levels(level)
    }
}

/// Aborts its generation on drop unless the ticket was already finished.
struct InFlight<'a> {
    session: &'a mut Session,
    ticket: GenerationTicket,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.session.pending == Some(self.ticket) {
            let _ = self.session.abort(self.ticket);
        }
    }
}
