//! Text-generation client used to augment grouped CSV files.
//!
//! Calls the Gemini `generateContent` REST endpoint once per file. No retry:
//! a failed file is reported by the caller and skipped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xbrlpipe::ai::{GeminiClient, TextGenerator, augment_prompt, AUGMENT_INSTRUCTION};
//!
//! let client = GeminiClient::from_env()?;
//! let reply = client.generate(&augment_prompt(AUGMENT_INSTRUCTION, csv_text)).await?;
//! ```

pub mod prompt;

use std::env;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{AiError, AiResult};

pub use prompt::{augment_prompt, AUGMENT_INSTRUCTION};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Anything that turns a prompt into generated text.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> impl Future<Output = AiResult<String>> + Send;
}

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
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

/// Gemini error body
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Create a client from `GEMINI_API_KEY` (environment or `.env`)
    pub fn from_env() -> AiResult<Self> {
        let _ = dotenvy::dotenv();

        let api_key = env::var(API_KEY_VAR).map_err(|_| AiError::MissingApiKey(API_KEY_VAR.to_string()))?;

        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_api(&self, prompt: &str) -> AiResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, bytes = prompt.len(), "calling generateContent");
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                return Err(AiError::ApiError(error.error.message));
            }
            return Err(AiError::ApiError(format!("HTTP {}: {}", status, body)));
        }

        let response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        candidate_text(response)
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> AiResult<String> {
        self.call_api(prompt).await
    }
}

/// Text of the first candidate, parts joined with newlines.
fn candidate_text(response: GenerateContentResponse) -> AiResult<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AiError::InvalidResponse("No candidates returned".to_string()))?;

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        return Err(AiError::InvalidResponse("Candidate has no text".to_string()));
    }
    Ok(texts.join("\n"))
}

/// Drop a fence wrapping the whole reply: first and last line when there
/// are at least three lines, bare backticks otherwise. Replies that are not
/// wrapped are returned trimmed.
pub fn strip_outer_fence(text: &str) -> String {
    let text = text.trim();
    if !(text.starts_with("```") && text.ends_with("```")) {
        return text.to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() >= 3 {
        lines[1..lines.len() - 1].join("\n")
    } else {
        text.trim_matches('`').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"```csv"},{"text":"a,1\n```"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(candidate_text(response).unwrap(), "```csv\na,1\n```");
    }

    #[test]
    fn test_no_candidates_is_error() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(matches!(candidate_text(response), Err(AiError::InvalidResponse(_))));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_strip_outer_fence() {
        assert_eq!(strip_outer_fence("```csv\na,1\nb,2\n```"), "a,1\nb,2");
        assert_eq!(strip_outer_fence("  a,1\n"), "a,1");
        assert_eq!(strip_outer_fence("```a,1```"), "a,1");
        assert_eq!(strip_outer_fence("Sure!\n```csv\na,1\n```"), "Sure!\n```csv\na,1\n```");
    }

    #[test]
    fn test_client_builders() {
        let client = GeminiClient::new("key".to_string())
            .with_model("gemini-1.5-pro")
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(client.model(), "gemini-1.5-pro");
        assert_eq!(client.base_url, "http://localhost:8080/v1beta");
        assert_eq!(
            AiError::MissingApiKey(API_KEY_VAR.to_string()).to_string(),
            "Missing API key: GEMINI_API_KEY not set"
        );
    }
}
