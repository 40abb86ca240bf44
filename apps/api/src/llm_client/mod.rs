/// LLM Client — the single point of entry for all Gemini API calls in cvmatch.
///
/// ARCHITECTURAL RULE: No other module may call the generative-language API directly.
/// Chat and embedding transport both live in `gemini`.
///
/// An `LlmClient` owns its conversation history and every mutating call takes
/// `&mut self`. Handlers build one client per request from the shared `ChatModel`,
/// so concurrent requests never interleave turns.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub mod gemini;
pub mod json;
pub mod prompts;

use self::json::parse_json_reply;
use self::prompts::{INVALID_JSON_SENTINEL, JSON_ONLY_PREFIX, REPAIR_MESSAGE};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected model reply shape")]
    UnexpectedResponseShape,
}

/// Known Gemini model identifiers. Configuration may still name any other model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiModel {
    Gemini2Flash,
    Gemini2Flash001,
    Gemini2FlashLite,
    Gemini15Flash,
    Gemini15Flash8b,
    Gemini15Pro,
    TextEmbedding,
    Aqa,
}

impl GeminiModel {
    pub fn all() -> &'static [GeminiModel] {
        &[
            GeminiModel::Gemini2Flash,
            GeminiModel::Gemini2Flash001,
            GeminiModel::Gemini2FlashLite,
            GeminiModel::Gemini15Flash,
            GeminiModel::Gemini15Flash8b,
            GeminiModel::Gemini15Pro,
            GeminiModel::TextEmbedding,
            GeminiModel::Aqa,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeminiModel::Gemini2Flash => "gemini-2.0-flash",
            GeminiModel::Gemini2Flash001 => "gemini-2.0-flash-001",
            GeminiModel::Gemini2FlashLite => "gemini-2.0-flash-lite-preview",
            GeminiModel::Gemini15Flash => "gemini-1.5-flash-latest",
            GeminiModel::Gemini15Flash8b => "gemini-1.5-flash-8b-latest",
            GeminiModel::Gemini15Pro => "gemini-1.5-pro-latest",
            GeminiModel::TextEmbedding => "text-embedding-004",
            GeminiModel::Aqa => "aqa",
        }
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeminiModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("models/").unwrap_or(s);
        GeminiModel::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == name)
            .ok_or_else(|| format!("unknown Gemini model '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Remote generative model. Receives the whole history and returns the reply text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, history: &[Turn]) -> Result<String, LlmError>;
}

/// Returns true for the mapping produced when JSON repair is exhausted.
pub fn is_sentinel(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.contains_key("error")
}

fn sentinel() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        "error".to_string(),
        Value::String(INVALID_JSON_SENTINEL.to_string()),
    );
    map
}

/// Multi-turn client over a `ChatModel`.
pub struct LlmClient {
    model: Arc<dyn ChatModel>,
    history: Vec<Turn>,
}

impl LlmClient {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Appends a user turn, sends the entire history, records and returns the reply.
    /// A remote failure is returned as-is and leaves the user turn in place.
    pub async fn send_message(&mut self, text: &str) -> Result<String, LlmError> {
        self.history.push(Turn::user(text));

        let reply = self.model.generate(&self.history).await?;

        debug!(
            "LLM reply received: turns={}, chars={}",
            self.history.len() + 1,
            reply.len()
        );
        self.history.push(Turn::model(reply.clone()));
        Ok(reply)
    }

    /// Sends `text` with a JSON-only instruction and parses the reply as an object.
    ///
    /// If the reply is not a JSON object, one repair turn is sent. If the repaired
    /// reply still is not an object, the sentinel `{"error": ...}` mapping is
    /// returned instead of an error. Transport failures propagate in both rounds.
    pub async fn send_message_with_json_response(
        &mut self,
        text: &str,
    ) -> Result<Map<String, Value>, LlmError> {
        let reply = self
            .send_message(&format!("{JSON_ONLY_PREFIX}{text}"))
            .await?;
        debug!("Raw JSON reply from model: {reply}");

        match parse_json_reply(&reply) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(other) => warn!("Model returned non-object JSON ({other}), requesting repair"),
            Err(e) => warn!("JSON parse error ({e}), requesting repair"),
        }

        let repaired = self.send_message(REPAIR_MESSAGE).await?;
        match parse_json_reply(&repaired) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!("JSON repair failed, returning sentinel");
                Ok(sentinel())
            }
        }
    }

    pub fn reset_conversation(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedChatModel;

    #[tokio::test]
    async fn test_send_message_appends_both_turns() {
        let model = ScriptedChatModel::new(["OK"]);
        let mut client = LlmClient::new(model.clone());

        let reply = client.send_message("Respond with OK").await.unwrap();

        assert_eq!(reply, "OK");
        assert_eq!(
            client.history(),
            &[Turn::user("Respond with OK"), Turn::model("OK")]
        );
    }

    #[tokio::test]
    async fn test_entire_history_is_sent_each_turn() {
        let model = ScriptedChatModel::new(["first", "second"]);
        let mut client = LlmClient::new(model.clone());

        client.send_message("one").await.unwrap();
        client.send_message("two").await.unwrap();

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec![Turn::user("one")]);
        assert_eq!(
            calls[1],
            vec![Turn::user("one"), Turn::model("first"), Turn::user("two")]
        );
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let model = ScriptedChatModel::failing(503);
        let mut client = LlmClient::new(model);

        let err = client.send_message("hello").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(client.history(), &[Turn::user("hello")]);
    }

    #[tokio::test]
    async fn test_reset_conversation_clears_history() {
        let model = ScriptedChatModel::new(["a"]);
        let mut client = LlmClient::new(model);
        client.send_message("q").await.unwrap();

        client.reset_conversation();

        assert!(client.history().is_empty());
    }

    #[tokio::test]
    async fn test_json_reply_is_prefixed_and_parsed() {
        let model = ScriptedChatModel::new(["```json\n{\"industryScore\": 90}\n```"]);
        let mut client = LlmClient::new(model.clone());

        let map = client
            .send_message_with_json_response("Score this CV")
            .await
            .unwrap();

        assert_eq!(map["industryScore"], 90);
        let sent = &model.calls()[0][0].text;
        assert!(sent.starts_with(JSON_ONLY_PREFIX));
        assert!(sent.ends_with("Score this CV"));
        assert_eq!(model.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_triggers_one_repair() {
        let model = ScriptedChatModel::new(["not json at all", "{\"techScore\": 50}"]);
        let mut client = LlmClient::new(model.clone());

        let map = client
            .send_message_with_json_response("Score this CV")
            .await
            .unwrap();

        assert_eq!(map["techScore"], 50);
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].last().unwrap(), &Turn::user(REPAIR_MESSAGE));
    }

    #[tokio::test]
    async fn test_non_object_reply_triggers_repair() {
        let model = ScriptedChatModel::new(["[1, 2]", "{\"jdScore\": 10}"]);
        let mut client = LlmClient::new(model.clone());

        let map = client.send_message_with_json_response("x").await.unwrap();

        assert_eq!(map["jdScore"], 10);
        assert_eq!(model.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_repair_returns_sentinel() {
        let model = ScriptedChatModel::new(["still prose", "more prose"]);
        let mut client = LlmClient::new(model.clone());

        let map = client.send_message_with_json_response("x").await.unwrap();

        assert!(is_sentinel(&map));
        assert_eq!(map["error"], INVALID_JSON_SENTINEL);
        // exactly one repair attempt
        assert_eq!(model.calls().len(), 2);
        assert_eq!(client.history().len(), 4);
    }

    #[test]
    fn test_is_sentinel_only_matches_lone_error_key() {
        assert!(is_sentinel(&sentinel()));

        let mut with_scores = sentinel();
        with_scores.insert("industryScore".to_string(), Value::from(10));
        assert!(!is_sentinel(&with_scores));
        assert!(!is_sentinel(&Map::new()));
    }

    #[test]
    fn test_gemini_model_round_trips_through_str() {
        for model in GeminiModel::all() {
            assert_eq!(model.as_str().parse::<GeminiModel>().unwrap(), *model);
        }
        assert_eq!(
            "models/gemini-2.0-flash".parse::<GeminiModel>().unwrap(),
            GeminiModel::Gemini2Flash
        );
        assert!("gpt-4".parse::<GeminiModel>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }
}
