//! Open-Meteo forecast client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::info;

use super::ForecastProvider;
use crate::Result;
use crate::client::{build_http_client, ensure_success};
use crate::config::WeatherConfig;
use crate::error::CitySenseError;
use crate::models::{
    CurrentConditions, DailySeries, ForecastDocument, ForecastLocation, HourlySeries,
};

const CURRENT_VARIABLES: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,rain,snowfall,weather_code,cloud_cover,wind_speed_10m,wind_gusts_10m,\
pressure_msl,visibility,is_day";

const HOURLY_VARIABLES: &str = "temperature_2m,apparent_temperature,dew_point_2m,\
relative_humidity_2m,precipitation_probability,precipitation,rain,snowfall,snow_depth,\
freezing_level_height,cloud_cover,wind_speed_10m,wind_gusts_10m,pressure_msl,visibility";

const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,apparent_temperature_max,\
apparent_temperature_min,precipitation_sum,rain_sum,snowfall_sum,snow_depth_max,\
wind_speed_10m_max,wind_gusts_10m_max,uv_index_max";

/// Raw `/v1/forecast` response; variables the engine does not read are ignored
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    current: CurrentConditions,
    #[serde(default)]
    daily: DailySeries,
    #[serde(default)]
    hourly: HourlySeries,
}

impl OpenMeteoResponse {
    /// The document carries the requested coordinates, not the grid cell Open-Meteo snapped to
    fn into_document(self, latitude: f64, longitude: f64) -> ForecastDocument {
        ForecastDocument {
            location: ForecastLocation {
                latitude,
                longitude,
                timezone: self.timezone,
            },
            current: self.current,
            daily: self.daily,
            hourly: self.hourly,
        }
    }
}

/// Parse an Open-Meteo response body into a forecast document
pub fn parse_forecast(body: &str, latitude: f64, longitude: f64) -> Result<ForecastDocument> {
    let response: OpenMeteoResponse = serde_json::from_str(body)
        .map_err(|e| CitySenseError::api(format!("Invalid forecast response: {e}")))?;
    Ok(response.into_document(latitude, longitude))
}

pub struct OpenMeteoProvider {
    client: ClientWithMiddleware,
    base_url: String,
    forecast_days: u8,
}

impl OpenMeteoProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = build_http_client(config.timeout_seconds, config.max_retries, None)?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.forecast_days,
        ))
    }

    #[must_use]
    pub fn with_client(client: ClientWithMiddleware, base_url: String, forecast_days: u8) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            forecast_days,
        }
    }

    #[must_use]
    pub fn forecast_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/forecast?latitude={latitude}&longitude={longitude}&forecast_days={}\
             &current={}&hourly={}&daily={}&timezone=auto",
            self.base_url,
            self.forecast_days,
            urlencoding::encode(CURRENT_VARIABLES),
            urlencoding::encode(HOURLY_VARIABLES),
            urlencoding::encode(DAILY_VARIABLES),
        )
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    #[tracing::instrument(name = "open_meteo_forecast", level = "debug", skip(self))]
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastDocument> {
        let url = self.forecast_url(latitude, longitude);
        let response = self.client.get(&url).send().await?;
        let response = ensure_success(response, "Open-Meteo").await?;
        let body = response.text().await?;

        let document = parse_forecast(&body, latitude, longitude)?;
        info!(
            "Fetched forecast for ({latitude}, {longitude}): {} days, {} hours",
            document.daily.temperature_max.len(),
            document.hourly.visibility.len()
        );
        Ok(document)
    }
}
