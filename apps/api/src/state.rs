use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::llm_client::ChatModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Stateless transport. Conversation history lives in a per-request `LlmClient`.
    pub chat_model: Arc<dyn ChatModel>,
    pub embeddings: Arc<EmbeddingProvider>,
}
