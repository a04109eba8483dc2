//! Language model access.
//!
//! [`Model`] is the seam between the extraction client and the external
//! service: one prompt (plus optional attachments) in, free-form text out.
//! [`GeminiClient`] implements it over the Gemini `generateContent` REST
//! endpoint with a blocking `reqwest` client.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

use crate::config::Config;
use crate::error::{GlrError, Result};

pub const PDF_MIME: &str = "application/pdf";

/// A file sent alongside the prompt.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Display name, sent as a `### name` heading before the file.
    pub name: String,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// One completion request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub prompt: &'a str,
    pub attachments: &'a [Attachment],
}

/// A prompt-completion service.
pub trait Model {
    /// Run one completion and return the raw response text.
    ///
    /// Implementations return [`GlrError::Timeout`] when the call exceeds
    /// its time limit, [`GlrError::Unusable`] when the service answers
    /// without usable text, and [`GlrError::Service`] for every other
    /// failure.
    fn generate(&self, request: &ModelRequest<'_>) -> Result<String>;
}

/// Client for the Gemini `generateContent` API.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Build a client for `config.model` authenticated with `credential`.
    pub fn new(credential: &str, config: &Config) -> Result<Self> {
        let api_key = credential.trim();
        if api_key.is_empty() {
            return Err(GlrError::MissingInput("API key"));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GlrError::Service(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                config.model
            ),
            timeout: config.timeout,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: Cow<'a, str>,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn build_request<'a>(request: &ModelRequest<'a>) -> GenerateRequest<'a> {
    let mut parts = vec![Part::Text {
        text: Cow::Borrowed(request.prompt),
    }];
    for a in request.attachments {
        parts.push(Part::Text {
            text: Cow::Owned(format!("### {}", a.name)),
        });
        parts.push(Part::Inline {
            inline_data: InlineData {
                mime_type: a.mime_type,
                data: BASE64.encode(&a.data),
            },
        });
    }

    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            temperature: 0.0,
            response_mime_type: "application/json",
        },
    }
}

/// Concatenate the text parts of the first candidate.
///
/// A successful exchange without usable text is [`GlrError::Unusable`].
fn response_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GlrError::Unusable(format!("unexpected response body: {e}")))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".into());
        return Err(GlrError::Unusable(format!("model returned no answer ({reason})")));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("no text");
        return Err(GlrError::Unusable(format!("model returned an empty answer ({reason})")));
    }
    Ok(text)
}

/// Prefer the service's own error message over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(500).collect())
}

impl Model for GeminiClient {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
        debug!(
            "generateContent: {} prompt chars, {} attachment(s)",
            request.prompt.len(),
            request.attachments.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(request))
            .send()
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(GlrError::Service(format!(
                "request failed with status {status}: {}",
                error_message(&body)
            )));
        }

        response_text(&body)
    }
}

impl GeminiClient {
    fn transport_error(&self, e: &reqwest::Error) -> GlrError {
        if e.is_timeout() {
            GlrError::Timeout(self.timeout.as_secs())
        } else {
            GlrError::Service(e.to_string())
        }
    }
}
