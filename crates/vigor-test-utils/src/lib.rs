//! Shared test utilities for vigor integration tests.
//!
//! Provides scripted [`Completer`] fakes and JSON fixtures shaped like real
//! AI responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};

use vigor_core::ai::Completer;
use vigor_core::profile::{ProfileDraft, UserProfile};

// ---------------------------------------------------------------------------
// Completer fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<String, String>>,
    prompts: Vec<String>,
}

/// Completer that replays a fixed sequence of replies.
///
/// Clones share the same script, so a test can hand one clone to a
/// generator and inspect calls through another. Once the script runs out
/// every call fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCompleter {
    script: Arc<Mutex<Script>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completer whose first call returns `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().then_reply(text)
    }

    /// Completer whose first call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new().then_fail(message)
    }

    /// Queue a successful reply.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .push_back(Err(message.into()));
        self
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().prompts.len()
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.script.lock().unwrap().prompts.clone()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut script = self.script.lock().unwrap();
        script.prompts.push(prompt.to_string());
        match script.replies.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted completer has no replies left")),
        }
    }
}

/// Completer that never returns (for timeout and cancellation tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingCompleter;

#[async_trait]
impl Completer for PendingCompleter {
    fn name(&self) -> &str {
        "pending"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Validated profile with the given level and default choices.
pub fn sample_profile(level: &str) -> UserProfile {
    ProfileDraft::with_level(level)
        .validate()
        .unwrap_or_else(|e| panic!("fixture level {level:?} is invalid: {e}"))
}

/// A well-formed AI response body with `days` days of five items each.
pub fn ai_response_json(days: usize) -> Value {
    let week: Vec<Value> = (0..days)
        .map(|i| {
            json!({
                "day": DAY_NAMES[i % DAY_NAMES.len()],
                "theme": format!("AI theme {}", i + 1),
                "hourlySchedule": [
                    { "time": "06:30", "activity": "Wake and hydrate", "category": "general",
                      "details": "Two glasses of water", "benefit": "Rehydration" },
                    { "time": "07:00", "activity": "Brisk walk", "category": "exercise",
                      "details": "30 minutes", "benefit": "Burns circulating fat" },
                    { "time": "08:00", "activity": "Oat breakfast", "category": "meal",
                      "details": "Oats with walnuts", "benefit": "Soluble fiber" },
                    { "time": "12:30", "activity": "Salmon lunch", "category": "meal",
                      "details": "Grilled salmon and greens", "benefit": "Omega-3" },
                    { "time": "18:30", "activity": "Light dinner", "category": "meal",
                      "details": "Vegetable soup", "benefit": "Starts the overnight fast" }
                ],
                "dailySummary": { "fastingWindow": "14 hours", "intensity": "moderate" }
            })
        })
        .collect();

    json!({
        "weekSchedule": week,
        "weeklyGuidelines": {
            "dietaryPrinciples": ["Limit refined sugar", "Eat oily fish twice a week"],
            "expectedProgress": "Gradual improvement over the week"
        }
    })
}

/// Wrap `body` in a Markdown JSON code fence, as chat models often do.
pub fn fenced(body: &str) -> String {
    format!("```json\n{body}\n```")
}
