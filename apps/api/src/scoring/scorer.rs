//! CV Scorer — blends the LLM's judgement with embedding similarity into one score.
//!
//! Pipeline: normalize skill weights → build prompt → LLM JSON call →
//! embedding similarity (JD vs CV) → blend JD scores → weighted final score.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::llm_client::{is_sentinel, LlmClient};
use crate::scoring::models::{CvMatchResult, JobPosting, ScoreBreakdown};
use crate::scoring::prompts::build_evaluation_prompt;
use crate::similarity::cosine_similarity;

pub const INDUSTRY_WEIGHT: f64 = 0.10;
pub const TECH_WEIGHT: f64 = 0.30;
pub const JD_WEIGHT: f64 = 0.60;

/// Average of the LLM-judged and embedding-based JD match, both in percent.
pub fn blend_jd_score(llm_jd_score: f64, embed_score: f64) -> f64 {
    (llm_jd_score + embed_score) / 2.0
}

pub fn final_score(industry_score: f64, tech_score: f64, blended_jd_score: f64) -> f64 {
    industry_score * INDUSTRY_WEIGHT + tech_score * TECH_WEIGHT + blended_jd_score * JD_WEIGHT
}

/// Appends the embedding and blended JD lines, two decimals each.
pub fn augment_explanation(explanation: &str, embed_score: f64, blended_jd_score: f64) -> String {
    format!(
        "{explanation}\nEmbedding JD-CV similarity: {embed_score:.2}%\nBlended JD Match: {blended_jd_score:.2}%"
    )
}

/// Scores CVs one at a time. Owns its `LlmClient`; the conversation is reset at
/// the start of every call so earlier evaluations never leak into the prompt.
pub struct CvScorer {
    llm: LlmClient,
    embeddings: Arc<EmbeddingProvider>,
}

impl CvScorer {
    pub fn new(llm: LlmClient, embeddings: Arc<EmbeddingProvider>) -> Self {
        Self { llm, embeddings }
    }

    pub async fn calculate_score(
        &mut self,
        cv_text: &str,
        mut job: JobPosting,
    ) -> Result<CvMatchResult, AppError> {
        self.llm.reset_conversation();
        job.normalize_skills();

        let prompt = build_evaluation_prompt(cv_text, &job);
        let data = self.llm.send_message_with_json_response(&prompt).await?;

        if data.is_empty() {
            return Err(AppError::ScoringUnavailable(
                "model returned no data".to_string(),
            ));
        }
        if is_sentinel(&data) {
            warn!("Model JSON could not be repaired: {}", data["error"]);
            return Err(AppError::ScoringUnavailable(
                "model did not return valid JSON after repair".to_string(),
            ));
        }

        debug!("LLM evaluation used {} round-trips", self.llm.history().len() / 2);

        let breakdown: ScoreBreakdown = serde_json::from_value(Value::Object(data))
            .map_err(|e| AppError::MalformedLlmResponse(e.to_string()))?;

        let embed_score = self.embedding_similarity(&job.description, cv_text).await? * 100.0;
        let blended_jd_score = blend_jd_score(breakdown.jd_score, embed_score);
        let score = final_score(
            breakdown.industry_score,
            breakdown.tech_score,
            blended_jd_score,
        );

        info!(
            "CV scored: industry={}, tech={}, llm_jd={}, embed_jd={:.2}, final={:.2}",
            breakdown.industry_score, breakdown.tech_score, breakdown.jd_score, embed_score, score
        );

        Ok(CvMatchResult {
            industry_score: breakdown.industry_score,
            tech_score: breakdown.tech_score,
            jd_score: blended_jd_score,
            score,
            explanation: augment_explanation(&breakdown.explanation, embed_score, blended_jd_score),
            job_summary: breakdown.job_summary.unwrap_or_default(),
            candidate_summary: breakdown.candidate_summary.unwrap_or_default(),
            ideal_profile: breakdown.ideal_profile.unwrap_or_default(),
        })
    }

    /// Cosine similarity of the JD and CV embeddings, in [-1, 1].
    async fn embedding_similarity(&self, description: &str, cv_text: &str) -> Result<f64, AppError> {
        let (jd_vector, cv_vector) = self.embeddings.embed_pair(description, cv_text).await?;
        Ok(cosine_similarity(&jd_vector, &cv_vector))
    }
}
