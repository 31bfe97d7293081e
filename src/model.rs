use serde::Deserialize;
use tracing::debug;

use crate::http::HttpTransport;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Failures of a single completion call. These are the only errors the
/// review engine turns into degraded results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("model API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("model returned an empty response")]
    EmptyResponse,
}

pub trait LanguageModel: Send + Sync {
    /// Send one prompt, get the completion text back.
    fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Google Generative Language `generateContent` client.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    transport: Box<dyn HttpTransport>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        transport: Box<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| GEMINI_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
            api_key,
            transport,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl LanguageModel for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let response = self
            .transport
            .post_json(
                &self.endpoint(),
                &[
                    ("x-goog-api-key", &self.api_key),
                    ("Content-Type", "application/json"),
                ],
                &body,
            )
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(ModelError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response.body)
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        debug!(model = %self.model, chars = text.len(), "model completion received");
        Ok(text.to_string())
    }
}
