// CV ↔ job scoring: LLM breakdown blended with embedding similarity.
// All model calls go through llm_client and embedding; no direct HTTP here.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod scorer;
