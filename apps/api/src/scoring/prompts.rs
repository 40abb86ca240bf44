// Evaluation prompt for CV ↔ job scoring.
// The 10/30/60 weighting stated here must match scorer::{INDUSTRY,TECH,JD}_WEIGHT.

use crate::scoring::models::JobPosting;

/// Fixed rubric and output contract. The job posting and CV are appended after it.
pub const EVALUATION_RUBRIC: &str = "\
You are an expert recruiter and resume evaluator. Your task is to score the candidate's CV against the given job posting.

Evaluation Criteria (with weights):
- Industry Knowledge (10%)
- Technical Skills (30%)
- Job Description Match (60%)

Scoring Guidelines:
1) Industry Knowledge (10% of final):
   0%   - No relevant industry experience
   25%  - Peripheral experience
   50%  - Some direct experience
   75%  - Strong experience
   100% - Extensive senior-level experience

2) Technical Skills (30% of final):
   For each required skill:
     0%   - Not found
     25%  - Mentioned only in passing
     50%  - Partial or implied
     75%  - Explicit mention with some evidence
     100% - Explicit mention with strong evidence
   Then compute the weighted average using the skill weights given below.

3) Job Description Match (60% of final):
   a) Responsibilities Coverage (50% of jdScore):
      0%   - None
      25%  - Few shallow mentions
      50%  - Several with detail
      75%  - Most well covered
      100% - All thoroughly covered

   b) Qualifications Coverage (50% of jdScore):
      0%   - None
      25%  - Some mentioned
      50%  - Several with detail
      75%  - Most with examples
      100% - All with strong examples

   jdScore = (responsibilitiesCoverage * 0.5 + qualificationsCoverage * 0.5)

COMPUTATION:
 finalScore = (industryScore * 0.10) + (techScore * 0.30) + (jdScore * 0.60)

EXPLANATION:
 Provide a brief rationale for Industry, Tech, JD Match, and final score, each on its own line.

ADDITIONAL TASKS:
 1) Generate a concise Job Summary (2-3 sentences).
 2) Generate a concise Candidate Summary (2-3 sentences).
 3) Generate an Ideal Candidate Profile: 3-5 bullet points.

OUTPUT REQUIREMENTS:
 Return ONLY a single RAW JSON object with exactly these fields:
{
  \"industryScore\": <number 0-100>,
  \"techScore\": <number 0-100>,
  \"jdScore\": <number 0-100>,
  \"score\": <number 0-100>,
  \"explanation\": \"...\",
  \"jobSummary\": \"...\",
  \"candidateSummary\": \"...\",
  \"idealProfile\": [\"...\", \"...\"]
}

HINT: Use 0/25/50/75/100 as base checkpoints.";

/// Builds the full evaluation prompt. `job` must already have normalized skill weights.
pub fn build_evaluation_prompt(cv_text: &str, job: &JobPosting) -> String {
    // BTreeMap<String, f64> always serializes
    let skills_json = serde_json::to_string(&job.technical_skills).unwrap_or_default();

    format!(
        "{EVALUATION_RUBRIC}\n\n\
         Job Posting:\n \
         Industry: {industry}\n \
         Required Skills and Weights: {skills_json}\n \
         Description: {description}\n\n\
         Candidate CV:\n\
         {cv_text}\n\n\
         TASK: Evaluate and PRODUCE THE JSON RESULT.",
        industry = job.industry,
        description = job.description,
    )
}
