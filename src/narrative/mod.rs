//! Qualitative location assessment from a language model
//!
//! The model is asked for a single JSON object; [`parse_assessment`] cuts
//! that object out of the reply and checks it against the schema the
//! prompt describes.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::error::CitySenseError;
use crate::models::NarrativeAssessment;

pub mod groq;

pub use groq::GroqAnalyzer;

pub const SYSTEM_PROMPT: &str = r#"
You are CityExplorer AI, an expert urban analyst.

Analyze the given real-world city/location objectively.
Base your reasoning on general urban patterns, geography, infrastructure, and known public information.
If information is uncertain, choose the most statistically likely option.

Return ONLY valid JSON with this exact structure:

{
  "city_name": string,
  "overview": string (max 100 words, neutral and factual),
  "historical_landmarks": [list of strings],
  "top_attractions": [list of strings],
  "cultural_notes": string (max 60 words),
  "tourism_score": number (0-100, based on attractions, accessibility, and cultural value),
  "safety_score": number (0-10, relative to global urban averages),
  "noise_level": "Low" | "Medium" | "High",
  "rent_level": "Low" | "Medium" | "High",
  "water_quality": "Poor" | "Average" | "Good",
  "ai_score": number (0-100, weighted overall livability score),
  "summary": string (max 60 words, concise recommendation-style)
}

Rules:
- Do not invent fictional places.
- Avoid extreme scores unless strongly justified.
- Keep internal consistency between fields.
- Do NOT include explanations, markdown, or text outside the JSON.
"#;

/// Produces a qualitative assessment for a resolved location
#[async_trait]
pub trait NarrativeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<NarrativeAssessment>;
}

#[must_use]
pub fn user_prompt(address: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "Analyze this real-world location:\nAddress: {address}\nLatitude: {latitude}\nLongitude: {longitude}"
    )
}

/// Span from the first `{` to the last `}` of a reply
#[must_use]
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Extract, decode and validate the assessment embedded in a model reply.
///
/// Every failure is a [`CitySenseError::Narrative`]: the reply came from the
/// model, not from the caller.
pub fn parse_assessment(reply: &str) -> Result<NarrativeAssessment> {
    let raw = extract_json(reply.trim()).ok_or_else(|| {
        let excerpt: String = reply.chars().take(200).collect();
        CitySenseError::narrative(format!("response does not contain valid JSON: {excerpt}"))
    })?;

    let value: Value = serde_json::from_str(raw).map_err(|e| {
        CitySenseError::narrative(format!("response does not contain valid JSON: {e}"))
    })?;

    let assessment: NarrativeAssessment = serde_json::from_value(value)
        .map_err(|e| CitySenseError::narrative(format!("response violates schema: {e}")))?;
    assessment.validate().map_err(|e| match e {
        CitySenseError::Validation { message } => {
            CitySenseError::narrative(format!("response out of range: {message}"))
        }
        other => other,
    })?;

    Ok(assessment)
}
