use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::gemini::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub embedding_model: String,
    pub embedding_task_type: Option<String>,
    pub embedding_dimensions: Option<u32>,
    pub embedding_fallback: bool,
    pub llm_temperature: f32,
    pub llm_max_output_tokens: u32,
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_base: env_or("GEMINI_API_BASE", DEFAULT_API_BASE),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash-lite-preview"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-004"),
            embedding_task_type: optional_env("EMBEDDING_TASK_TYPE"),
            embedding_dimensions: optional_env("EMBEDDING_DIMENSIONS")
                .map(|v| parse_value("EMBEDDING_DIMENSIONS", &v))
                .transpose()?,
            embedding_fallback: parse_env("EMBEDDING_FALLBACK", true)?,
            llm_temperature: parse_env("LLM_TEMPERATURE", 0.0)?,
            llm_max_output_tokens: parse_env("LLM_MAX_OUTPUT_TOKENS", 5000)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
