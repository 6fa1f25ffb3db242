//! Weather risk engine
//!
//! Turns a [`ForecastDocument`] into a [`RiskReport`]: aggregate temperature
//! statistics plus three independent classifications (thermal comfort,
//! snow hazard, general weather danger). The engine is a pure function of
//! its input. Any required value that is absent, empty or `null` fails the
//! whole call with [`CitySenseError::DataIncomplete`]; nothing is defaulted.

pub mod hazard;
pub mod rules;
pub mod snow;
pub mod thermal;
pub mod units;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::error::CitySenseError;
use crate::models::{ForecastDocument, ForecastLocation};

pub use hazard::{HazardInputs, WeatherRisk, WeatherRiskAssessment};
pub use rules::RiskColor;
pub use snow::{SnowAnalysis, SnowInputs, SnowRisk};
pub use thermal::{HumanFeelingIndex, ThermalInputs, ThermalStatus};

/// Aggregate temperature statistics over the forecast window (°C).
///
/// The `14d` suffix names the usual request window; the values cover
/// whatever number of days the input holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStatistics {
    pub avg_max_temperature_14d: f64,
    pub min_temperature_14d: f64,
    pub max_temperature_14d: f64,
}

/// Structured risk report for one forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub location: ForecastLocation,
    pub statistics: TemperatureStatistics,
    #[serde(rename = "humanFeelingIndex")]
    pub human_feeling_index: HumanFeelingIndex,
    #[serde(rename = "snowAnalysis")]
    pub snow_analysis: SnowAnalysis,
    #[serde(rename = "weatherRiskEngine")]
    pub weather_risk: WeatherRiskAssessment,
}

/// Classify a forecast document into a risk report
pub fn classify(forecast: &ForecastDocument) -> Result<RiskReport> {
    let daily = &forecast.daily;
    let hourly = &forecast.hourly;
    let current = &forecast.current;

    let temperature_max = required_series("daily.temperature_max", &daily.temperature_max)?;
    let temperature_min = required_series("daily.temperature_min", &daily.temperature_min)?;
    let snowfall_sum = required_series("daily.snowfall_sum", &daily.snowfall_sum)?;
    let snow_depth_max = required_series("daily.snow_depth_max", &daily.snow_depth_max)?;
    ensure_aligned(&[
        ("daily.temperature_max", temperature_max.len()),
        ("daily.temperature_min", temperature_min.len()),
        ("daily.snowfall_sum", snowfall_sum.len()),
        ("daily.snow_depth_max", snow_depth_max.len()),
    ])?;

    let freezing_level = required_series(
        "hourly.freezing_level_height",
        &hourly.freezing_level_height,
    )?;
    let visibility = required_series("hourly.visibility", &hourly.visibility)?;
    let wind_gusts = required_series("hourly.wind_gusts", &hourly.wind_gusts)?;
    let pressure = required_series("hourly.pressure_msl", &hourly.pressure_msl)?;

    let thermal = ThermalInputs {
        feel: required_scalar("current.apparent_temperature", current.apparent_temperature)?,
        humidity: required_scalar("current.relative_humidity", current.relative_humidity)?,
        wind_kmh: required_scalar("current.wind_speed", current.wind_speed)?,
    };

    let statistics = TemperatureStatistics {
        avg_max_temperature_14d: units::round_half_even(units::exact_mean(&temperature_max), 2),
        min_temperature_14d: minimum(&temperature_min),
        max_temperature_14d: maximum(&temperature_max),
    };

    let snow = SnowInputs {
        total_snow_cm: snowfall_sum.iter().sum(),
        max_snow_depth_cm: maximum(&snow_depth_max),
        min_freezing_level_m: minimum(&freezing_level),
    };

    let hazard = HazardInputs {
        min_visibility_m: minimum(&visibility),
        max_gusts_kmh: maximum(&wind_gusts),
        min_pressure_hpa: minimum(&pressure),
    };

    let report = RiskReport {
        location: forecast.location.clone(),
        statistics,
        human_feeling_index: HumanFeelingIndex::assess(thermal),
        snow_analysis: SnowAnalysis::assess(snow),
        weather_risk: WeatherRiskAssessment::assess(hazard),
    };

    debug!(
        thermal = %report.human_feeling_index.status,
        snow = %report.snow_analysis.risk_level,
        weather = %report.weather_risk.risk_level,
        "Classified forecast for {:.4}, {:.4}",
        report.location.latitude,
        report.location.longitude
    );

    Ok(report)
}

/// Unwrap a series, failing on an empty series or a `null` entry.
fn required_series(field: &str, values: &[Option<f64>]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(CitySenseError::data_incomplete(field));
    }
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.ok_or_else(|| CitySenseError::data_incomplete(format!("{field}[{index}]")))
        })
        .collect()
}

fn required_scalar(field: &str, value: Option<f64>) -> Result<f64> {
    value.ok_or_else(|| CitySenseError::data_incomplete(field))
}

fn ensure_aligned(series: &[(&str, usize)]) -> Result<()> {
    let Some(&(first_field, expected)) = series.first() else {
        return Ok(());
    };
    match series.iter().find(|(_, len)| *len != expected) {
        Some((field, len)) => Err(CitySenseError::data_incomplete(format!(
            "{field} has {len} entries, {first_field} has {expected}"
        ))),
        None => Ok(()),
    }
}

fn minimum(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn maximum(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
