//! In-process doubles for the remote model seams, shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::embedding::{EmbedRequest, EmbeddingBackend, EmbeddingError, EmbeddingProvider, EmbeddingSettings};
use crate::llm_client::{ChatModel, LlmError, Turn};

/// Replays canned replies in order and records every history it was sent.
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedChatModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// A model whose every call fails with the given API status.
    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(status)])),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn generate(&self, history: &[Turn]) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(history.to_vec());
        let mut replies = self.replies.lock().unwrap();
        match replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(status)) => {
                replies.push_front(Err(status));
                Err(LlmError::Api {
                    status,
                    message: "scripted failure".to_string(),
                })
            }
            None => panic!("ScriptedChatModel ran out of replies"),
        }
    }
}

/// Always fails, forcing the hash fallback.
pub struct FailingEmbeddingBackend;

#[async_trait]
impl EmbeddingBackend for FailingEmbeddingBackend {
    async fn embed(&self, _request: &EmbedRequest) -> Result<Value, EmbeddingError> {
        Err(EmbeddingError::Remote("offline".to_string()))
    }
}

/// Returns the same raw reply for every request and records what it was asked.
pub struct StaticEmbeddingBackend {
    reply: Value,
    requests: Mutex<Vec<EmbedRequest>>,
}

impl StaticEmbeddingBackend {
    pub fn new(reply: Value) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<EmbedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingBackend for StaticEmbeddingBackend {
    async fn embed(&self, request: &EmbedRequest) -> Result<Value, EmbeddingError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Returns a `dimensions`-long remote vector for the first `successes` calls,
/// then fails every call after that.
pub struct FlakyEmbeddingBackend {
    successes: Mutex<usize>,
    dimensions: usize,
}

impl FlakyEmbeddingBackend {
    pub fn new(successes: usize, dimensions: usize) -> Self {
        Self {
            successes: Mutex::new(successes),
            dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for FlakyEmbeddingBackend {
    async fn embed(&self, _request: &EmbedRequest) -> Result<Value, EmbeddingError> {
        let mut left = self.successes.lock().unwrap();
        if *left == 0 {
            return Err(EmbeddingError::Remote("429 Too Many Requests".to_string()));
        }
        *left -= 1;
        let values: Vec<f64> = (0..self.dimensions)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        Ok(serde_json::json!({"embedding": {"values": values}}))
    }
}

/// Provider wired to an offline backend, so every vector is the hash fallback.
pub fn offline_embeddings() -> Arc<EmbeddingProvider> {
    embeddings_with(Arc::new(FailingEmbeddingBackend))
}

/// Provider with the default settings and the fallback enabled.
pub fn embeddings_with(backend: Arc<dyn EmbeddingBackend>) -> Arc<EmbeddingProvider> {
    Arc::new(EmbeddingProvider::new(
        backend,
        EmbeddingSettings {
            model: "text-embedding-004".to_string(),
            task_type: None,
            dimensions: None,
        },
        true,
    ))
}
