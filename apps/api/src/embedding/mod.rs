//! Embedding Provider — turns text into a vector for JD ↔ CV similarity.
//!
//! The remote model is reached through the `EmbeddingBackend` trait (implemented by
//! `llm_client::gemini::GeminiClient`). Any remote failure degrades to a deterministic
//! SHA-256 vector so scoring keeps working offline and tests stay reproducible.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::similarity::l2_norm;

/// Dimensionality of the hash fallback vector (one dimension per SHA-256 byte).
pub const FALLBACK_DIMENSIONS: usize = 32;

const MODEL_NAMESPACES: [&str; 2] = ["models/", "tunedModels/"];

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Text to embed cannot be empty")]
    EmptyInput,

    #[error("Remote embedding call failed: {0}")]
    Remote(String),

    #[error("Unexpected embedding response shape")]
    UnexpectedResponseShape,

    #[error("Failed to get embedding: {0}")]
    Unavailable(String),
}

/// A single remote embedding request. `model` is already namespaced.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedRequest {
    pub model: String,
    pub text: String,
    pub task_type: Option<String>,
    pub output_dimensionality: Option<u32>,
}

/// Remote embedding transport. Returns the raw reply body; shape matching
/// happens in the provider so every backend gets the same tolerance.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, request: &EmbedRequest) -> Result<Value, EmbeddingError>;
}

/// Which model and hints the scorer embeds with.
#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub model: String,
    pub task_type: Option<String>,
    pub dimensions: Option<u32>,
}

/// Reply shapes accepted from the remote model, tried top to bottom.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingReply {
    /// `{"embedding": {"values": [...]}}`
    Values { embedding: ValuesBlock },
    /// `{"embedding": [...]}`
    Flat { embedding: Vec<f64> },
    /// `{"embeddings": [{"values": [...]}, ...]}`
    Batch { embeddings: Vec<ValuesBlock> },
    /// `{"embeddings": [...]}`
    FlatBatch { embeddings: Vec<f64> },
}

#[derive(Debug, Deserialize)]
struct ValuesBlock {
    values: Vec<f64>,
}

impl EmbeddingReply {
    fn into_vector(self) -> Option<Vec<f64>> {
        let vector = match self {
            EmbeddingReply::Values { embedding } => embedding.values,
            EmbeddingReply::Flat { embedding } => embedding,
            EmbeddingReply::Batch { embeddings } => embeddings.into_iter().next()?.values,
            EmbeddingReply::FlatBatch { embeddings } => embeddings,
        };
        (!vector.is_empty()).then_some(vector)
    }
}

/// Extracts the embedding vector from a raw remote reply.
pub fn extract_embedding(raw: Value) -> Result<Vec<f64>, EmbeddingError> {
    serde_json::from_value::<EmbeddingReply>(raw)
        .ok()
        .and_then(EmbeddingReply::into_vector)
        .ok_or(EmbeddingError::UnexpectedResponseShape)
}

/// Prefixes `models/` unless the identifier is already namespaced.
pub fn normalize_model_name(model: &str) -> String {
    if MODEL_NAMESPACES.iter().any(|ns| model.starts_with(ns)) {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/// Deterministic local embedding: SHA-256 of the UTF-8 text, each byte mapped to
/// `byte / 255.0`, then L2-normalised. A zero norm is treated as 1.0.
pub fn fallback_embedding(text: &str) -> Vec<f64> {
    let digest = Sha256::digest(text.as_bytes());
    let raw: Vec<f64> = digest
        .iter()
        .take(FALLBACK_DIMENSIONS)
        .map(|b| f64::from(*b) / 255.0)
        .collect();

    let norm = match l2_norm(&raw) {
        n if n == 0.0 => 1.0,
        n => n,
    };
    raw.into_iter().map(|v| v / norm).collect()
}

pub struct EmbeddingProvider {
    backend: Arc<dyn EmbeddingBackend>,
    settings: EmbeddingSettings,
    fallback_enabled: bool,
}

impl EmbeddingProvider {
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        settings: EmbeddingSettings,
        fallback_enabled: bool,
    ) -> Self {
        Self {
            backend,
            settings,
            fallback_enabled,
        }
    }

    /// Returns the embedding vector for `text`.
    ///
    /// Falls back to [`fallback_embedding`] on any remote failure (transport, auth,
    /// unrecognised shape). With the fallback disabled the remote error surfaces as
    /// `EmbeddingError::Unavailable`. Scoring goes through [`Self::embed_pair`].
    #[allow(dead_code)]
    pub async fn get_embedding(
        &self,
        text: &str,
        model: &str,
        task_hint: Option<&str>,
        dimension_hint: Option<u32>,
    ) -> Result<Vec<f64>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        match self.fetch_remote(text, model, task_hint, dimension_hint).await {
            Ok(vector) => Ok(vector),
            Err(e) if self.fallback_enabled => {
                warn!("Remote embedding failed ({e}); using hash fallback");
                Ok(fallback_embedding(text))
            }
            Err(e) => Err(EmbeddingError::Unavailable(e.to_string())),
        }
    }

    /// Embeds two texts that will be compared with each other.
    ///
    /// Both vectors come from the same space: if either remote call fails, both
    /// texts get [`fallback_embedding`]. A remote vector is never paired with a
    /// hash vector.
    pub async fn embed_pair(
        &self,
        first: &str,
        second: &str,
    ) -> Result<(Vec<f64>, Vec<f64>), EmbeddingError> {
        if first.is_empty() || second.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let model = &self.settings.model;
        let task_hint = self.settings.task_type.as_deref();
        let dimension_hint = self.settings.dimensions;

        let remote = async {
            let a = self.fetch_remote(first, model, task_hint, dimension_hint).await?;
            let b = self.fetch_remote(second, model, task_hint, dimension_hint).await?;
            Ok::<_, EmbeddingError>((a, b))
        };

        match remote.await {
            Ok(pair) => Ok(pair),
            Err(e) if self.fallback_enabled => {
                warn!("Remote embedding failed ({e}); using hash fallback for both texts");
                Ok((fallback_embedding(first), fallback_embedding(second)))
            }
            Err(e) => Err(EmbeddingError::Unavailable(e.to_string())),
        }
    }

    async fn fetch_remote(
        &self,
        text: &str,
        model: &str,
        task_hint: Option<&str>,
        dimension_hint: Option<u32>,
    ) -> Result<Vec<f64>, EmbeddingError> {
        let request = EmbedRequest {
            model: normalize_model_name(model),
            text: text.to_string(),
            task_type: task_hint.map(str::to_string),
            output_dimensionality: dimension_hint,
        };

        let raw = self.backend.embed(&request).await?;
        let vector = extract_embedding(raw)?;
        debug!(
            "Remote embedding ok: model={}, dims={}",
            request.model,
            vector.len()
        );
        Ok(vector)
    }
}
