//! Data models for the `CitySense` service
//!
//! - Location: analyzed addresses and coordinates
//! - Forecast: the forecast document the risk engine consumes
//! - Analysis: persisted results, narrative assessments and feedback

pub mod analysis;
pub mod forecast;
pub mod location;

pub use analysis::{
    AnalysisResult, FeedbackSubmission, Level, NarrativeAssessment, NewAnalysisResult,
    ReportFeedback, WaterQuality,
};
pub use forecast::{
    CurrentConditions, DailySeries, ForecastDocument, ForecastLocation, HourlySeries,
};
pub use location::{Location, weather_cache_key};
