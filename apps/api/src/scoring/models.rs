use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};

/// A job posting as received on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub industry: String,
    /// skill name → non-negative weight
    pub technical_skills: BTreeMap<String, f64>,
    pub description: String,
}

impl JobPosting {
    /// Scales skill weights so they sum to 1.0. An all-zero (or empty) map divides
    /// by 1.0 instead, leaving the weights unchanged.
    pub fn normalize_skills(&mut self) {
        let total: f64 = self.technical_skills.values().sum();
        let divisor = if total == 0.0 { 1.0 } else { total };
        for weight in self.technical_skills.values_mut() {
            *weight /= divisor;
        }
    }
}

/// Body of `POST /match_cv`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub cv_text: String,
    pub job: JobPosting,
}

/// Scores as judged by the LLM. Untrusted: required keys missing or non-numeric
/// fail deserialization. The model's own `score` key is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    #[serde(deserialize_with = "lenient_score")]
    pub industry_score: f64,
    #[serde(deserialize_with = "lenient_score")]
    pub tech_score: f64,
    #[serde(deserialize_with = "lenient_score")]
    pub jd_score: f64,
    pub explanation: String,
    #[serde(default)]
    pub job_summary: Option<String>,
    #[serde(default)]
    pub candidate_summary: Option<String>,
    #[serde(default)]
    pub ideal_profile: Option<Vec<String>>,
}

/// Accepts `85`, `85.5`, `"85"` or `"85%"`.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f64),
        Text(String),
    }

    match RawScore::deserialize(deserializer)? {
        RawScore::Number(n) => Ok(n),
        RawScore::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("score '{s}' is not a number"))),
    }
}

/// Final result returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvMatchResult {
    pub industry_score: f64,
    pub tech_score: f64,
    /// blended LLM + embedding JD match
    pub jd_score: f64,
    pub score: f64,
    pub explanation: String,
    pub job_summary: String,
    pub candidate_summary: String,
    pub ideal_profile: Vec<String>,
}
