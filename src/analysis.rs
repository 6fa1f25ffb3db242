//! Location analysis workflow
//!
//! [`AnalysisService`] ties the collaborators together: geocode the address,
//! ask the language model for a qualitative assessment, classify the
//! (cached) forecast with the risk engine and persist the combined result.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::cache::{PersistentCache, suggestions_cache_key};
use crate::config::CitySenseConfig;
use crate::error::CitySenseError;
use crate::location_resolver::LocationResolver;
use crate::models::{AnalysisResult, FeedbackSubmission, Level, NewAnalysisResult, ReportFeedback};
use crate::narrative::NarrativeAnalyzer;
use crate::risk::{RiskReport, classify};
use crate::store::ReportStore;
use crate::suggestions::{CityIndex, CitySuggestion};
use crate::weather::{ForecastProvider, cached_forecast};

/// Heatmap weight for a High noise or rent level; every other level gets the low weight
const HIGH_LEVEL_WEIGHT: f64 = 30.0;
const LOW_LEVEL_WEIGHT: f64 = 15.0;

/// Metric plotted on the heatmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapLayer {
    #[default]
    AiScore,
    Safety,
    Noise,
    Rent,
}

impl HeatmapLayer {
    /// Unknown or missing layer names fall back to the livability score
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("safety") => HeatmapLayer::Safety,
            Some("noise") => HeatmapLayer::Noise,
            Some("rent") => HeatmapLayer::Rent,
            _ => HeatmapLayer::AiScore,
        }
    }

    fn weight(self, result: &AnalysisResult) -> f64 {
        let level_weight = |level: Level| {
            if level == Level::High {
                HIGH_LEVEL_WEIGHT
            } else {
                LOW_LEVEL_WEIGHT
            }
        };

        match self {
            HeatmapLayer::AiScore => f64::from(result.ai_score),
            HeatmapLayer::Safety => result.safety_score,
            HeatmapLayer::Noise => level_weight(result.noise_level),
            HeatmapLayer::Rent => level_weight(result.rent_level),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// Tunables the service reads from configuration
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub weather_ttl: Duration,
    pub suggestions_ttl: Duration,
    pub suggestion_limit: usize,
    pub suggestion_min_score: f64,
    pub suggestion_min_query_chars: usize,
}

impl ServiceSettings {
    #[must_use]
    pub fn from_config(config: &CitySenseConfig) -> Self {
        Self {
            weather_ttl: Duration::from_secs(config.cache.weather_ttl_seconds),
            suggestions_ttl: Duration::from_secs(config.cache.suggestions_ttl_seconds),
            suggestion_limit: config.suggestions.limit,
            suggestion_min_score: config.suggestions.min_score,
            suggestion_min_query_chars: config.suggestions.min_query_chars,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&CitySenseConfig::default())
    }
}

/// External services the analysis workflow depends on
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn LocationResolver>,
    pub narrative: Arc<dyn NarrativeAnalyzer>,
    pub forecasts: Arc<dyn ForecastProvider>,
    pub store: Arc<dyn ReportStore>,
    pub cache: PersistentCache,
    pub cities: Arc<CityIndex>,
}

#[derive(Clone)]
pub struct AnalysisService {
    parts: Collaborators,
    settings: ServiceSettings,
}

impl AnalysisService {
    #[must_use]
    pub fn new(parts: Collaborators, settings: ServiceSettings) -> Self {
        Self { parts, settings }
    }

    /// Analyze an address for a user and persist the result.
    ///
    /// Geocoding misses and narrative failures abort the analysis; forecast
    /// or classification failures only leave the weather fields empty.
    #[tracing::instrument(name = "analyze", skip(self))]
    pub async fn analyze(&self, user_id: &str, address: &str) -> Result<AnalysisResult> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CitySenseError::validation("Address cannot be empty"));
        }

        let resolved = self.parts.resolver.resolve(address).await?.ok_or_else(|| {
            warn!("Geocoding failed for: {address}");
            CitySenseError::not_found("Address not found. Try a different location.")
        })?;

        let location = self
            .parts
            .store
            .get_or_create_location(address, resolved.latitude, resolved.longitude)
            .await?;

        let (narrative, weather) = tokio::join!(
            self.parts
                .narrative
                .analyze(address, location.latitude, location.longitude),
            self.weather_report(resolved.latitude, resolved.longitude),
        );

        let narrative = narrative.map_err(|e| {
            error!("AI analysis failed for {address}: {e}");
            match e {
                CitySenseError::Narrative { .. } | CitySenseError::Config { .. } => e,
                other => CitySenseError::narrative(other.to_string()),
            }
        })?;

        let new = NewAnalysisResult::new(user_id, location, &narrative, weather);
        self.parts.store.create_result(new).await
    }

    /// Forecast through the cache, then classify; failures are logged and dropped
    async fn weather_report(&self, latitude: f64, longitude: f64) -> Option<RiskReport> {
        let forecast = cached_forecast(
            &self.parts.cache,
            self.parts.forecasts.as_ref(),
            latitude,
            longitude,
            self.settings.weather_ttl,
        )
        .await;

        match forecast.and_then(|document| classify(&document)) {
            Ok(report) => {
                info!("Weather data retrieved for ({latitude}, {longitude})");
                Some(report)
            }
            Err(e) => {
                error!("Weather fetch failed for ({latitude}, {longitude}): {e}");
                None
            }
        }
    }

    /// A report owned by the user
    pub async fn report(&self, id: u64, user_id: &str) -> Result<AnalysisResult> {
        let report = self
            .parts
            .store
            .get_result(id, user_id)
            .await?
            .ok_or_else(|| CitySenseError::not_found(format!("Report {id} not found")))?;
        info!("Report viewed: {id} by user: {user_id}");
        Ok(report)
    }

    /// The user's reports, newest first
    pub async fn reports(&self, user_id: &str) -> Result<Vec<AnalysisResult>> {
        let reports = self.parts.store.results_for_user(user_id).await?;
        debug!("Reports listed for user: {user_id}, count: {}", reports.len());
        Ok(reports)
    }

    pub async fn submit_feedback(
        &self,
        report_id: u64,
        user_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<(ReportFeedback, AnalysisResult)> {
        self.parts
            .store
            .submit_feedback(report_id, user_id, submission)
            .await
    }

    /// One point per stored result; store failures yield an empty map
    pub async fn heatmap(&self, layer: HeatmapLayer) -> Vec<HeatmapPoint> {
        match self.parts.store.all_results().await {
            Ok(results) => {
                let points: Vec<HeatmapPoint> = results
                    .iter()
                    .map(|r| HeatmapPoint {
                        lat: r.location.latitude,
                        lng: r.location.longitude,
                        weight: layer.weight(r),
                    })
                    .collect();
                debug!("Heatmap data: {} points on layer: {layer:?}", points.len());
                points
            }
            Err(e) => {
                error!("Heatmap data error: {e}");
                Vec::new()
            }
        }
    }

    /// Fuzzy city suggestions, cached per normalized query; errors yield an empty list
    pub async fn suggest_cities(&self, query: &str) -> Vec<CitySuggestion> {
        let query = query.trim();
        if query.chars().count() < self.settings.suggestion_min_query_chars {
            return Vec::new();
        }

        let key = suggestions_cache_key(query);
        match self.parts.cache.get::<Vec<CitySuggestion>>(&key).await {
            Ok(Some(cached)) => {
                debug!("City suggestions cache hit for '{query}'");
                return cached;
            }
            Ok(None) => debug!("City suggestions cache miss for '{query}'"),
            Err(e) => warn!("City suggestions cache read failed for '{query}': {e}"),
        }

        let cities = Arc::clone(&self.parts.cities);
        let settings = self.settings.clone();
        let owned_query = query.to_string();
        let results = match task::spawn_blocking(move || {
            cities.suggest(
                &owned_query,
                settings.suggestion_limit,
                settings.suggestion_min_score,
                settings.suggestion_min_query_chars,
            )
        })
        .await
        {
            Ok(results) => results,
            Err(e) => {
                error!("City suggestions error for '{query}': {e}");
                return Vec::new();
            }
        };

        if let Err(e) = self
            .parts
            .cache
            .put(&key, results.clone(), self.settings.suggestions_ttl)
            .await
        {
            warn!("City suggestions cache write failed for '{query}': {e}");
        }
        results
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::risk::WeatherRisk;
    use std::sync::atomic::Ordering;

    fn submission(score: u8) -> FeedbackSubmission {
        FeedbackSubmission {
            accuracy: score,
            usefulness: score,
            clarity: score,
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn test_analyze_persists_narrative_and_weather() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));

        let result = service.analyze("alice", "London, UK").await.unwrap();

        assert_eq!(result.user_id, "alice");
        assert_eq!(result.location.address, "London, UK");
        assert_eq!(result.safety_score, 7.5);
        assert_eq!(result.ai_score, 78);
        assert_eq!(result.temperature, Some(18.0));
        assert_eq!(result.windspeed, Some(10.0));
        assert_eq!(result.weather_code, Some(WeatherRisk::Normal));
        assert!(result.risk_report.is_some());
    }

    #[tokio::test]
    async fn test_analyze_unknown_address() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));

        let result = service.analyze("alice", "Atlantis").await;
        assert!(matches!(result, Err(CitySenseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_analyze_geocoder_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));

        let result = service.analyze("alice", "Offline").await;
        assert!(matches!(result, Err(CitySenseError::Api { .. })));
    }

    #[tokio::test]
    async fn test_analyze_narrative_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), true, Arc::new(FixedForecasts::calm()));

        let result = service.analyze("alice", "London, UK").await;
        assert!(matches!(result, Err(CitySenseError::Narrative { .. })));
        assert!(service.reports("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_rejects_reply_outside_schema() {
        let dir = tempfile::tempdir().unwrap();
        let reply = LONDON_REPLY.replace("\"High\"", "\"Deafening\"");
        let service = service_with(
            dir.path(),
            FixedNarrative::replying(&reply),
            Arc::new(FixedForecasts::calm()),
        );

        let result = service.analyze("alice", "London, UK").await;
        assert!(matches!(result, Err(CitySenseError::Narrative { .. })));
        assert!(service.reports("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_without_weather() {
        let dir = tempfile::tempdir().unwrap();
        let forecasts = Arc::new(FixedForecasts {
            document: None,
            calls: Default::default(),
        });
        let service = service(dir.path(), false, forecasts);

        let result = service.analyze("alice", "London, UK").await.unwrap();
        assert!(result.temperature.is_none());
        assert!(result.windspeed.is_none());
        assert!(result.weather_code.is_none());
        assert!(result.risk_report.is_none());
    }

    #[tokio::test]
    async fn test_analyze_with_incomplete_forecast_keeps_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut document = crate::models::forecast::test_support::calm_forecast(3);
        document.current.apparent_temperature = None;
        let forecasts = Arc::new(FixedForecasts {
            document: Some(document),
            calls: Default::default(),
        });
        let service = service(dir.path(), false, forecasts);

        let result = service.analyze("alice", "London, UK").await.unwrap();
        assert!(result.risk_report.is_none());
        assert_eq!(result.ai_score, 78);
    }

    #[tokio::test]
    async fn test_forecast_is_cached_between_analyses() {
        let dir = tempfile::tempdir().unwrap();
        let forecasts = Arc::new(FixedForecasts::calm());
        let service = service(dir.path(), false, Arc::clone(&forecasts));

        service.analyze("alice", "London, UK").await.unwrap();
        service.analyze("bob", "London, UK").await.unwrap();
        assert_eq!(forecasts.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_report_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));
        let result = service.analyze("alice", "London, UK").await.unwrap();

        assert_eq!(service.report(result.id, "alice").await.unwrap().id, result.id);
        assert!(matches!(
            service.report(result.id, "bob").await,
            Err(CitySenseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_feedback_average() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));
        let result = service.analyze("alice", "London, UK").await.unwrap();

        service
            .submit_feedback(result.id, "alice", submission(5))
            .await
            .unwrap();
        let (_, report) = service
            .submit_feedback(result.id, "bob", submission(3))
            .await
            .unwrap();
        assert_eq!(report.avg_feedback_score, 4.0);
    }

    #[tokio::test]
    async fn test_heatmap_layers() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));
        service.analyze("alice", "London, UK").await.unwrap();

        let weights =
            |points: Vec<HeatmapPoint>| points.iter().map(|p| p.weight).collect::<Vec<_>>();
        assert_eq!(weights(service.heatmap(HeatmapLayer::AiScore).await), vec![78.0]);
        assert_eq!(weights(service.heatmap(HeatmapLayer::Safety).await), vec![7.5]);
        assert_eq!(weights(service.heatmap(HeatmapLayer::Noise).await), vec![30.0]);
        assert_eq!(weights(service.heatmap(HeatmapLayer::Rent).await), vec![15.0]);

        let point = &service.heatmap(HeatmapLayer::AiScore).await[0];
        assert_eq!((point.lat, point.lng), (51.5074, -0.1278));
    }

    #[test]
    fn test_heatmap_layer_from_param() {
        assert_eq!(HeatmapLayer::from_param(None), HeatmapLayer::AiScore);
        assert_eq!(HeatmapLayer::from_param(Some("safety")), HeatmapLayer::Safety);
        assert_eq!(HeatmapLayer::from_param(Some("rent")), HeatmapLayer::Rent);
        assert_eq!(HeatmapLayer::from_param(Some("bogus")), HeatmapLayer::AiScore);
    }

    #[tokio::test]
    async fn test_suggest_cities() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), false, Arc::new(FixedForecasts::calm()));

        let results = service.suggest_cities("lon").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "London");

        // served from cache the second time
        assert_eq!(service.suggest_cities("  LON ").await, results);
        assert!(service.suggest_cities("l").await.is_empty());
    }
}
