//! Forecast retrieval
//!
//! The risk engine never fetches data itself; a [`ForecastProvider`]
//! produces the [`ForecastDocument`] it classifies, optionally through the
//! persistent cache.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::Result;
use crate::cache::PersistentCache;
use crate::models::{ForecastDocument, weather_cache_key};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Source of multi-horizon forecasts for a coordinate pair
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastDocument>;
}

/// Fetch a forecast, serving it from the cache while fresh.
///
/// Cache failures are logged and fall through to the provider; only the
/// provider's own errors are returned.
pub async fn cached_forecast(
    cache: &PersistentCache,
    provider: &dyn ForecastProvider,
    latitude: f64,
    longitude: f64,
    ttl: Duration,
) -> Result<ForecastDocument> {
    let key = weather_cache_key(latitude, longitude);

    match cache.get::<ForecastDocument>(&key).await {
        Ok(Some(document)) => {
            debug!("Weather cache hit for ({latitude}, {longitude})");
            return Ok(document);
        }
        Ok(None) => debug!("Weather cache miss for ({latitude}, {longitude})"),
        Err(e) => warn!("Weather cache read failed for {key}: {e}"),
    }

    let document = provider.fetch_forecast(latitude, longitude).await?;

    if let Err(e) = cache.put(&key, document.clone(), ttl).await {
        warn!("Weather cache write failed for {key}: {e}");
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forecast::test_support::calm_forecast;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ForecastProvider for CountingProvider {
        async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut document = calm_forecast(1);
            document.location.latitude = latitude;
            document.location.longitude = longitude;
            Ok(document)
        }
    }

    #[tokio::test]
    async fn test_cached_forecast_fetches_once_while_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let ttl = Duration::from_secs(3600);

        let first = cached_forecast(&cache, &provider, 51.5074, -0.1278, ttl)
            .await
            .unwrap();
        let second = cached_forecast(&cache, &provider, 51.5074, -0.1278, ttl)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_forecast_refetches_after_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let ttl = Duration::from_secs(3600);

        cached_forecast(&cache, &provider, 51.5074, -0.1278, ttl)
            .await
            .unwrap();
        cache.invalidate_weather(51.5074, -0.1278).await.unwrap();
        cached_forecast(&cache, &provider, 51.5074, -0.1278, ttl)
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
