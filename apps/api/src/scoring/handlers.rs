//! Axum route handler for CV matching.

use axum::{extract::State, Json};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::scoring::models::{CvMatchResult, MatchRequest};
use crate::scoring::scorer::CvScorer;
use crate::state::AppState;

/// POST /match_cv
///
/// Scores `cvText` against `job`. Each request gets its own `LlmClient`, so
/// conversation history is never shared between in-flight requests.
pub async fn handle_match_cv(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<CvMatchResult>, AppError> {
    validate(&request)?;

    let request_id = Uuid::new_v4();
    let span = info_span!("match_cv", %request_id, industry = %request.job.industry);

    async move {
        info!(
            "Scoring CV ({} chars) against {} skills",
            request.cv_text.len(),
            request.job.technical_skills.len()
        );

        let mut scorer = CvScorer::new(
            LlmClient::new(state.chat_model.clone()),
            state.embeddings.clone(),
        );
        let result = scorer
            .calculate_score(&request.cv_text, request.job)
            .await?;

        Ok::<_, AppError>(Json(result))
    }
    .instrument(span)
    .await
}

fn validate(request: &MatchRequest) -> Result<(), AppError> {
    if request.cv_text.trim().is_empty() {
        return Err(AppError::Validation("cvText cannot be empty".to_string()));
    }
    if request.job.description.trim().is_empty() {
        return Err(AppError::Validation(
            "job.description cannot be empty".to_string(),
        ));
    }
    if let Some((skill, weight)) = request
        .job
        .technical_skills
        .iter()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(AppError::Validation(format!(
            "weight for skill '{skill}' must be a non-negative number, got {weight}"
        )));
    }
    Ok(())
}
