use anyhow::{Context, Result};
use std::sync::Arc;

use citysense::analysis::{Collaborators, ServiceSettings};
use citysense::{
    AnalysisService, CityIndex, CitySenseConfig, FjallReportStore, GroqAnalyzer,
    NominatimResolver, OpenMeteoProvider, PersistentCache, telemetry, web,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(Into::into);
    let config = CitySenseConfig::load_from_path(config_path)?;
    telemetry::init(&config.logging);

    tracing::info!("Starting CitySense {}", citysense::VERSION);
    if config.narrative.api_key.is_none() {
        tracing::warn!("No narrative API key configured; analyses will fail until one is set");
    }

    let cities = match CityIndex::load(&config.suggestions.cities_file) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!("City suggestions disabled: {e}");
            CityIndex::default()
        }
    };

    let parts = Collaborators {
        resolver: Arc::new(NominatimResolver::new(&config.geocoding)?),
        narrative: Arc::new(GroqAnalyzer::new(&config.narrative)?),
        forecasts: Arc::new(OpenMeteoProvider::new(&config.weather)?),
        store: Arc::new(
            FjallReportStore::open(&config.storage.location)
                .context("Failed to open report store")?,
        ),
        cache: PersistentCache::open(&config.cache.location).context("Failed to open cache")?,
        cities: Arc::new(cities),
    };

    let service = AnalysisService::new(parts, ServiceSettings::from_config(&config));
    web::run(&config.server, service).await
}
