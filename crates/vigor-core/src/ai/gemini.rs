//! Google Gemini completer.
//!
//! Calls the Generative Language REST API (`models/{model}:generateContent`)
//! with a single user turn and returns the first candidate's text.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::Completer;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Base URL for the Gemini API.
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key; keeps the key out of request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Per-request HTTP timeout. The generator applies its own overall timeout
/// on top of this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ---------------------------------------------------------------------------
// Completer
// ---------------------------------------------------------------------------

/// Completer backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiCompleter {
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f32>,
    client: Client,
}

impl GeminiCompleter {
    /// Create a completer for the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE_URL.to_string(),
            temperature: None,
            client,
        })
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn http_request(&self, prompt: &str) -> RequestBuilder {
        self.client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.build_request(prompt))
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
                candidate_count: 1,
            }),
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: &GenerateResponse) -> Result<String> {
    if let Some(err) = &response.error {
        bail!("Gemini API error: {}", err.message);
    }

    let candidate = response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .ok_or_else(|| anyhow!("Gemini response has no candidates"))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!(
            "Gemini response has no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }
    Ok(text)
}

/// Build an error for a non-success HTTP status, preferring the API's own
/// message when the body carries one.
fn api_error(status: u16, body: &str) -> anyhow::Error {
    let message = serde_json::from_str::<GenerateResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| body.trim().to_string(), |e| e.message);
    match status {
        429 => anyhow!("Gemini quota exceeded: {message}"),
        401 | 403 => anyhow!("Gemini rejected the API key ({status}): {message}"),
        _ => anyhow!("Gemini API error ({status}): {message}"),
    }
}

#[async_trait]
impl Completer for GeminiCompleter {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(prompt_chars = prompt.len(), "sending request to Gemini API");

        let response = self
            .http_request(prompt)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("HTTP request to Gemini failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read Gemini response body")?;

        if !status.is_success() {
            warn!(status = %status, "Gemini API returned an error status");
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("failed to parse Gemini response envelope")?;
        let text = extract_text(&parsed)?;
        debug!(response_chars = text.len(), "received Gemini response");
        Ok(text)
    }
}

impl fmt::Debug for GeminiCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiCompleter")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
