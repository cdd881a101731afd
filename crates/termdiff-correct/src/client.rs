use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompts::{
    grammar_system_prompt, grammar_user_prompt, tone_system_prompt, tone_user_prompt, ToneMode,
};

#[derive(Debug, Error)]
pub enum CorrectError {
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
    #[error("expected {expected} corrections, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Error payloads vary between providers; probe the common shapes.
#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    description: Option<String>,
    error: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<serde_json::Value>,
}

/// Synchronous client for an OpenAI-style chat-completions endpoint.
/// One request in, one corrected-lines response out; no retries.
pub struct CorrectionClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl CorrectionClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, CorrectError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CorrectError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(CorrectionClient {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        })
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, CorrectError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| CorrectError::Network(format!("{e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CorrectError::Network(format!("{e}")))?;

        if !status.is_success() {
            return Err(CorrectError::Api {
                status: status.as_u16(),
                message: decode_error_body(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CorrectError::InvalidResponse(format!("{e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CorrectError::InvalidResponse("no choices".to_string()))?;
        Ok(choice.message.content.trim().to_string())
    }

    /// Grammar-check a batch; returns one corrected value per input, in order.
    pub fn correct_grammar(
        &self,
        locale: &str,
        values: &[String],
    ) -> Result<Vec<String>, CorrectError> {
        let content = self.complete(
            &grammar_system_prompt(locale),
            &grammar_user_prompt(values),
        )?;
        parse_numbered_response(&content, values.len())
    }

    /// Tone-adjust a batch (German only; the caller gates on locale).
    pub fn adjust_tone(
        &self,
        locale: &str,
        mode: ToneMode,
        values: &[String],
    ) -> Result<Vec<String>, CorrectError> {
        let content = self.complete(
            &tone_system_prompt(locale, mode),
            &tone_user_prompt(locale, mode, values),
        )?;
        parse_numbered_response(&content, values.len())
    }

    /// One-line round trip to verify endpoint, key and model.
    pub fn ping(&self) -> Result<String, CorrectError> {
        self.complete(
            "You are a connectivity probe. Reply with exactly: OK",
            "Reply with OK.",
        )
    }
}

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.:]?\s*").unwrap());

/// Split a response into one entry per non-empty line, stripping any
/// "1." / "1:" numbering the model added back.
pub fn parse_numbered_response(text: &str, expected: usize) -> Result<Vec<String>, CorrectError> {
    let entries: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| LEADING_NUMBER.replace(l, "").into_owned())
        .collect();
    if entries.len() != expected {
        return Err(CorrectError::CountMismatch {
            expected,
            got: entries.len(),
        });
    }
    Ok(entries)
}

fn decode_error_body(body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return body.to_string();
    };
    let Some(err) = envelope.error else {
        return body.to_string();
    };
    let message = err
        .message
        .or(err.description)
        .or(err.error)
        .unwrap_or_else(|| body.to_string());
    let kind = err.kind.unwrap_or_else(|| "API Error".to_string());
    match err.code {
        Some(code) => format!("{kind} (code {code}): {message}"),
        None => format!("{kind}: {message}"),
    }
}
