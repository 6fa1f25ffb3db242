//! Human thermal comfort ("feels like") classification

use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::{RiskColor, Rule, first_match};
use super::units::kmh_to_ms;

/// Apparent temperature below which strong wind makes cold extreme (°C)
pub const EXTREME_FREEZE_FEEL_C: f64 = -5.0;
/// Wind speed above which cold becomes extreme (km/h)
pub const EXTREME_FREEZE_WIND_KMH: f64 = 25.0;
/// Apparent temperature below which it is freezing (°C)
pub const FREEZING_FEEL_C: f64 = 0.0;
/// Apparent temperature above which humid air causes heat stress (°C)
pub const HEAT_STRESS_FEEL_C: f64 = 35.0;
/// Relative humidity above which heat becomes stressful (%)
pub const HEAT_STRESS_HUMIDITY: f64 = 60.0;

/// Thermal comfort status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThermalStatus {
    Comfortable,
    Freezing,
    ExtremeFreeze,
    HeatStress,
}

impl ThermalStatus {
    #[must_use]
    pub const fn color(self) -> RiskColor {
        match self {
            ThermalStatus::Comfortable => RiskColor::Green,
            ThermalStatus::Freezing => RiskColor::Orange,
            ThermalStatus::ExtremeFreeze | ThermalStatus::HeatStress => RiskColor::Red,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ThermalStatus::Comfortable => "COMFORTABLE",
            ThermalStatus::Freezing => "FREEZING",
            ThermalStatus::ExtremeFreeze => "EXTREME_FREEZE",
            ThermalStatus::HeatStress => "HEAT_STRESS",
        }
    }
}

impl fmt::Display for ThermalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions the status is derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalInputs {
    /// Apparent temperature (°C)
    pub feel: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (km/h)
    pub wind_kmh: f64,
}

/// Evaluated top to bottom, first match wins.
const THERMAL_RULES: &[Rule<ThermalInputs, ThermalStatus>] = &[
    Rule {
        level: ThermalStatus::ExtremeFreeze,
        applies: |i: &ThermalInputs| {
            i.feel < EXTREME_FREEZE_FEEL_C && i.wind_kmh > EXTREME_FREEZE_WIND_KMH
        },
    },
    Rule {
        level: ThermalStatus::Freezing,
        applies: |i: &ThermalInputs| i.feel < FREEZING_FEEL_C,
    },
    Rule {
        level: ThermalStatus::HeatStress,
        applies: |i: &ThermalInputs| {
            i.feel > HEAT_STRESS_FEEL_C && i.humidity > HEAT_STRESS_HUMIDITY
        },
    },
];

/// Thermal status for the given conditions
#[must_use]
pub fn thermal_status(inputs: &ThermalInputs) -> ThermalStatus {
    first_match(inputs, ThermalStatus::Comfortable, THERMAL_RULES)
}

/// Human feeling index section of the risk report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanFeelingIndex {
    pub apparent_temperature: f64,
    pub humidity_percent: f64,
    pub wind_speed_kmh: f64,
    pub wind_speed_ms: f64,
    pub status: ThermalStatus,
    pub status_color: RiskColor,
}

impl HumanFeelingIndex {
    #[must_use]
    pub fn assess(inputs: ThermalInputs) -> Self {
        let status = thermal_status(&inputs);
        Self {
            apparent_temperature: inputs.feel,
            humidity_percent: inputs.humidity,
            wind_speed_kmh: inputs.wind_kmh,
            wind_speed_ms: kmh_to_ms(inputs.wind_kmh),
            status,
            status_color: status.color(),
        }
    }
}
