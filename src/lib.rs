//! `CitySense` - location livability analysis with a weather risk engine
//!
//! This library provides the deterministic weather risk classification,
//! the collaborators that feed it (forecast provider, geocoder, language
//! model, cache, city index, report store) and the HTTP surface on top.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod models;
pub mod narrative;
pub mod risk;
pub mod store;
pub mod suggestions;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use analysis::{AnalysisService, HeatmapLayer, HeatmapPoint};
pub use cache::PersistentCache;
pub use config::CitySenseConfig;
pub use error::CitySenseError;
pub use location_resolver::{AddressInput, LocationResolver, NominatimResolver};
pub use models::{AnalysisResult, ForecastDocument, Location, ReportFeedback};
pub use narrative::{GroqAnalyzer, NarrativeAnalyzer};
pub use risk::{RiskReport, classify};
pub use store::{FjallReportStore, ReportStore};
pub use suggestions::{CityIndex, CitySuggestion};
pub use weather::{ForecastProvider, OpenMeteoProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CitySenseError>;
