//! Forecast document consumed by the weather risk engine
//!
//! Field names follow the short form used throughout the crate; the serde
//! aliases accept Open-Meteo's native variable names as well, so a raw
//! `current`/`daily`/`hourly` block can be deserialized directly.

use serde::{Deserialize, Serialize};

/// Coordinates and timezone the forecast was requested for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

/// Single-instant snapshot of current conditions
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    /// Apparent ("feels like") temperature in Celsius
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    /// Relative humidity in percent
    #[serde(default, alias = "relative_humidity_2m")]
    pub relative_humidity: Option<f64>,
    /// Wind speed in km/h
    #[serde(default, alias = "wind_speed_10m")]
    pub wind_speed: Option<f64>,
    /// Air temperature in Celsius
    #[serde(default, alias = "temperature_2m")]
    pub temperature: Option<f64>,
    /// Precipitation in mm
    #[serde(default)]
    pub precipitation: Option<f64>,
    /// Wind gusts in km/h
    #[serde(default, alias = "wind_gusts_10m")]
    pub wind_gusts: Option<f64>,
    /// Sea level pressure in hPa
    #[serde(default)]
    pub pressure_msl: Option<f64>,
    /// Visibility in meters
    #[serde(default)]
    pub visibility: Option<f64>,
    /// WMO weather code
    #[serde(default)]
    pub weather_code: Option<u8>,
}

/// Per-day series, one entry per forecast day
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    /// Daily maximum temperature in Celsius
    #[serde(default, alias = "temperature_2m_max")]
    pub temperature_max: Vec<Option<f64>>,
    /// Daily minimum temperature in Celsius
    #[serde(default, alias = "temperature_2m_min")]
    pub temperature_min: Vec<Option<f64>>,
    /// Daily snowfall in cm
    #[serde(default)]
    pub snowfall_sum: Vec<Option<f64>>,
    /// Daily maximum snow depth in cm
    #[serde(default)]
    pub snow_depth_max: Vec<Option<f64>>,
}

/// Per-hour series, one entry per forecast hour
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    /// Freezing level height in meters
    #[serde(default)]
    pub freezing_level_height: Vec<Option<f64>>,
    /// Visibility in meters
    #[serde(default)]
    pub visibility: Vec<Option<f64>>,
    /// Wind gusts in km/h
    #[serde(default, alias = "wind_gusts_10m")]
    pub wind_gusts: Vec<Option<f64>>,
    /// Mean sea level pressure in hPa
    #[serde(default)]
    pub pressure_msl: Vec<Option<f64>>,
}

/// Multi-horizon forecast payload (current, daily and hourly)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastDocument {
    pub location: ForecastLocation,
    #[serde(default)]
    pub current: CurrentConditions,
    #[serde(default)]
    pub daily: DailySeries,
    #[serde(default)]
    pub hourly: HourlySeries,
}
