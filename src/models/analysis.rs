//! Analysis results, narrative assessments and report feedback

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Location;
use crate::Result;
use crate::error::CitySenseError;
use crate::risk::{RiskReport, WeatherRisk, units::round_half_even};

/// Maximum length of a feedback comment (characters)
pub const MAX_COMMENT_CHARS: usize = 500;

/// Three-step level used for noise and rent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "Low"),
            Level::Medium => write!(f, "Medium"),
            Level::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaterQuality {
    Poor,
    Average,
    Good,
}

impl fmt::Display for WaterQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaterQuality::Poor => write!(f, "Poor"),
            WaterQuality::Average => write!(f, "Average"),
            WaterQuality::Good => write!(f, "Good"),
        }
    }
}

/// Qualitative assessment of a location produced by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeAssessment {
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub historical_landmarks: Vec<String>,
    #[serde(default)]
    pub top_attractions: Vec<String>,
    #[serde(default)]
    pub cultural_notes: Option<String>,
    /// 0-100
    #[serde(default)]
    pub tourism_score: Option<f64>,
    /// 0-10, relative to global urban averages
    pub safety_score: f64,
    pub noise_level: Level,
    pub rent_level: Level,
    pub water_quality: WaterQuality,
    /// 0-100 weighted livability score
    pub ai_score: f64,
    pub summary: String,
}

impl NarrativeAssessment {
    /// Check score ranges the schema constrains
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.safety_score) {
            return Err(CitySenseError::validation(format!(
                "safety_score must be between 0 and 10, got: {}",
                self.safety_score
            )));
        }
        if !(0.0..=100.0).contains(&self.ai_score) {
            return Err(CitySenseError::validation(format!(
                "ai_score must be between 0 and 100, got: {}",
                self.ai_score
            )));
        }
        if let Some(tourism) = self.tourism_score {
            if !(0.0..=100.0).contains(&tourism) {
                return Err(CitySenseError::validation(format!(
                    "tourism_score must be between 0 and 100, got: {tourism}"
                )));
            }
        }
        Ok(())
    }
}

/// Everything needed to persist a new analysis; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysisResult {
    pub user_id: String,
    pub location: Location,
    pub safety_score: f64,
    pub noise_level: Level,
    pub rent_level: Level,
    pub water_quality: WaterQuality,
    pub ai_summary: String,
    pub ai_score: u8,
    /// Apparent temperature in Celsius
    pub temperature: Option<f64>,
    /// Wind speed in km/h
    pub windspeed: Option<f64>,
    /// General weather risk level
    pub weather_code: Option<WeatherRisk>,
    pub risk_report: Option<RiskReport>,
}

impl NewAnalysisResult {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        location: Location,
        narrative: &NarrativeAssessment,
        risk_report: Option<RiskReport>,
    ) -> Self {
        let (temperature, windspeed, weather_code) = match &risk_report {
            Some(report) => (
                Some(report.human_feeling_index.apparent_temperature),
                Some(report.human_feeling_index.wind_speed_kmh),
                Some(report.weather_risk.risk_level),
            ),
            None => (None, None, None),
        };

        Self {
            user_id: user_id.into(),
            location,
            safety_score: narrative.safety_score,
            noise_level: narrative.noise_level,
            rent_level: narrative.rent_level,
            water_quality: narrative.water_quality,
            ai_summary: narrative.summary.clone(),
            ai_score: narrative.ai_score.round().clamp(0.0, 100.0) as u8,
            temperature,
            windspeed,
            weather_code,
            risk_report,
        }
    }
}

/// Complete, persisted analysis of a location for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: u64,
    pub user_id: String,
    pub location: Location,
    pub safety_score: f64,
    pub noise_level: Level,
    pub rent_level: Level,
    pub water_quality: WaterQuality,
    pub ai_summary: String,
    pub ai_score: u8,
    /// Mean feedback quality score (0-5)
    pub avg_feedback_score: f64,
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
    pub weather_code: Option<WeatherRisk>,
    pub risk_report: Option<RiskReport>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    #[must_use]
    pub fn from_new(id: u64, new: NewAnalysisResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            location: new.location,
            safety_score: new.safety_score,
            noise_level: new.noise_level,
            rent_level: new.rent_level,
            water_quality: new.water_quality,
            ai_summary: new.ai_summary,
            ai_score: new.ai_score,
            avg_feedback_score: 0.0,
            temperature: new.temperature,
            windspeed: new.windspeed,
            weather_code: new.weather_code,
            risk_report: new.risk_report,
            created_at,
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - Score: {}", self.location.address, self.ai_score)
    }
}

/// Ratings submitted for a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub accuracy: u8,
    pub usefulness: u8,
    pub clarity: u8,
    #[serde(default)]
    pub comment: String,
}

impl FeedbackSubmission {
    /// Validate ratings (1-5) and normalize the comment
    pub fn validated(self) -> Result<Self> {
        for (name, value) in [
            ("accuracy", self.accuracy),
            ("usefulness", self.usefulness),
            ("clarity", self.clarity),
        ] {
            if !(1..=5).contains(&value) {
                return Err(CitySenseError::validation(format!(
                    "{name} rating must be between 1 and 5, got: {value}"
                )));
            }
        }

        let comment = self.comment.trim().to_string();
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(CitySenseError::validation(format!(
                "Comment must not exceed {MAX_COMMENT_CHARS} characters."
            )));
        }

        Ok(Self { comment, ..self })
    }
}

/// One user's feedback on one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFeedback {
    pub report_id: u64,
    pub user_id: String,
    pub accuracy: u8,
    pub usefulness: u8,
    pub clarity: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReportFeedback {
    /// Average of the three ratings, rounded to 2 decimals
    #[must_use]
    pub fn quality_score(&self) -> f64 {
        let total = f64::from(self.accuracy) + f64::from(self.usefulness) + f64::from(self.clarity);
        round_half_even(total / 3.0, 2)
    }
}
