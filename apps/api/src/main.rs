mod config;
mod embedding;
mod errors;
mod llm_client;
mod routes;
mod scoring;
mod similarity;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::{EmbeddingProvider, EmbeddingSettings};
use crate::llm_client::gemini::{GeminiClient, GenerationConfig};
use crate::llm_client::GeminiModel;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing GEMINI_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvmatch API v{}", env!("CARGO_PKG_VERSION"));

    for model in [&config.gemini_model, &config.embedding_model] {
        if model.parse::<GeminiModel>().is_err() {
            let known: Vec<String> = GeminiModel::all().iter().map(ToString::to_string).collect();
            warn!("Model '{model}' is not a known Gemini model (known: {})", known.join(", "));
        }
    }

    // One HTTP client serves both chat and embedding calls
    let gemini = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        &config.gemini_api_base,
        config.gemini_model.clone(),
        GenerationConfig {
            temperature: config.llm_temperature,
            max_output_tokens: config.llm_max_output_tokens,
        },
        Duration::from_secs(config.llm_timeout_secs),
    )?);
    info!("LLM client initialized (model: {})", gemini.model());

    let embeddings = Arc::new(EmbeddingProvider::new(
        gemini.clone(),
        EmbeddingSettings {
            model: config.embedding_model.clone(),
            task_type: config.embedding_task_type.clone(),
            dimensions: config.embedding_dimensions,
        },
        config.embedding_fallback,
    ));
    info!(
        "Embedding provider initialized (model: {}, fallback: {})",
        config.embedding_model, config.embedding_fallback
    );

    let state = AppState {
        chat_model: gemini,
        embeddings,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
