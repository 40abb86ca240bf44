//! Gemini generative-language REST transport for chat and embeddings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ChatModel, LlmError, Role, Turn};
use crate::embedding::{normalize_model_name, EmbedRequest, EmbeddingBackend, EmbeddingError};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Generation parameters sent with every chat call.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

type ReplyMatcher = fn(&Value) -> Option<String>;

/// Reply shapes, tried in order. First match wins.
const REPLY_MATCHERS: [(&str, ReplyMatcher); 3] = [
    ("candidates", candidate_parts_text),
    ("text", top_level_text),
    ("result", top_level_result),
];

/// `candidates[0].content.parts[*].text`, concatenated.
fn candidate_parts_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    (!texts.is_empty()).then(|| texts.concat())
}

fn top_level_text(body: &Value) -> Option<String> {
    body.get("text").and_then(Value::as_str).map(str::to_string)
}

fn top_level_result(body: &Value) -> Option<String> {
    body.get("result").and_then(Value::as_str).map(str::to_string)
}

/// Extracts the reply text from a `generateContent` response body.
pub fn extract_reply_text(body: &Value) -> Result<String, LlmError> {
    REPLY_MATCHERS
        .iter()
        .find_map(|(shape, matcher)| {
            matcher(body).map(|text| {
                debug!("Matched reply shape '{shape}'");
                text
            })
        })
        .ok_or(LlmError::UnexpectedResponseShape)
}

/// Shared HTTP client for the Gemini API. Cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        generation: GenerationConfig,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            generation,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POSTs `body` and returns the parsed JSON reply. Non-2xx becomes `LlmError::Api`.
    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, history: &[Turn]) -> Result<String, LlmError> {
        let model = normalize_model_name(&self.model);
        let url = format!("{}/v1beta/{model}:generateContent", self.base_url);

        let request = GenerateContentRequest {
            contents: history
                .iter()
                .map(|turn| Content {
                    role: Some(match turn.role {
                        Role::User => "user",
                        Role::Model => "model",
                    }),
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
            generation_config: self.generation,
        };

        let body = self.post_json(&url, &request).await?;
        if let Some(usage) = body.get("usageMetadata") {
            debug!("Gemini call succeeded: model={model}, usage={usage}");
        }
        extract_reply_text(&body)
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiClient {
    async fn embed(&self, request: &EmbedRequest) -> Result<Value, EmbeddingError> {
        let url = format!("{}/v1beta/{}:embedContent", self.base_url, request.model);

        let body = EmbedContentRequest {
            model: &request.model,
            content: Content {
                role: None,
                parts: vec![Part {
                    text: &request.text,
                }],
            },
            task_type: request.task_type.as_deref(),
            output_dimensionality: request.output_dimensionality,
        };

        self.post_json(&url, &body)
            .await
            .map_err(|e| EmbeddingError::Remote(e.to_string()))
    }
}
