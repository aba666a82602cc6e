//! OpenAI-compatible chat-completions extractor.
//!
//! Asks the model for a strict JSON `{"translation", "definition"}` reply
//! and maps HTTP failures onto the typed extractor errors so the bulk
//! coordinator can classify them without string matching.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use leitbox_core::error::ExtractError;
use leitbox_core::extractor::{TranslateRequest, Translation, WordExtractor};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SYSTEM_PROMPT: &str = "You are a vocabulary assistant. For the given word, reply ONLY with a JSON object of the form {\"translation\": \"...\", \"definition\": \"...\"}. The translation must be in the requested target language and the definition must be one short sentence. No markdown, no extra keys, no commentary.";

/// Word extractor backed by an OpenAI-compatible chat completions API.
pub struct OpenAiExtractor {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiExtractor {
    pub fn new(api_key: &str, model: Option<String>, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The payload the model is instructed to return.
#[derive(Deserialize)]
struct ExtractedPayload {
    translation: String,
    #[serde(default)]
    definition: String,
}

#[async_trait]
impl WordExtractor for OpenAiExtractor {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(word = %request.word))]
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, ExtractError> {
        let start = Instant::now();

        let user_prompt = format!(
            "Word: {}\nSource language: {}\nTarget language: {}",
            request.word, request.source_language, request.target_language
        );
        let body = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ExtractError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ExtractError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ExtractError::ApiError { status, message });
        }

        let api_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ExtractError::Malformed(format!("response body: {e}")))?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ExtractError::Malformed("empty choices".to_string()))?;

        let payload: ExtractedPayload = serde_json::from_str(content.trim())
            .map_err(|e| ExtractError::Malformed(format!("payload `{content}`: {e}")))?;

        tracing::debug!(
            word = %request.word,
            latency_ms = start.elapsed().as_millis() as u64,
            "extracted"
        );

        Ok(Translation {
            translation: payload.translation,
            definition: payload.definition,
        })
    }
}
