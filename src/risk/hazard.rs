//! General weather danger classification (visibility, gusts, pressure)

use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::{RiskColor, Rule, escalate};
use super::units::kmh_to_ms;

pub const DANGEROUS_VISIBILITY_M: f64 = 800.0;
pub const DANGEROUS_GUSTS_KMH: f64 = 60.0;
pub const EXTREME_VISIBILITY_M: f64 = 300.0;
pub const EXTREME_PRESSURE_HPA: f64 = 995.0;
pub const EXTREME_GUSTS_KMH: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherRisk {
    Normal,
    Dangerous,
    Extreme,
}

impl WeatherRisk {
    #[must_use]
    pub const fn color(self) -> RiskColor {
        match self {
            WeatherRisk::Normal => RiskColor::Green,
            WeatherRisk::Dangerous => RiskColor::Orange,
            WeatherRisk::Extreme => RiskColor::Red,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WeatherRisk::Normal => "NORMAL",
            WeatherRisk::Dangerous => "DANGEROUS",
            WeatherRisk::Extreme => "EXTREME",
        }
    }
}

impl fmt::Display for WeatherRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardInputs {
    pub min_visibility_m: f64,
    pub max_gusts_kmh: f64,
    pub min_pressure_hpa: f64,
}

const HAZARD_RULES: &[Rule<HazardInputs, WeatherRisk>] = &[
    Rule {
        level: WeatherRisk::Dangerous,
        applies: |i: &HazardInputs| {
            i.min_visibility_m < DANGEROUS_VISIBILITY_M || i.max_gusts_kmh > DANGEROUS_GUSTS_KMH
        },
    },
    Rule {
        level: WeatherRisk::Extreme,
        applies: |i: &HazardInputs| {
            i.min_visibility_m < EXTREME_VISIBILITY_M
                || (i.min_pressure_hpa < EXTREME_PRESSURE_HPA
                    && i.max_gusts_kmh > EXTREME_GUSTS_KMH)
        },
    },
];

#[must_use]
pub fn weather_risk(inputs: &HazardInputs) -> WeatherRisk {
    escalate(inputs, WeatherRisk::Normal, HAZARD_RULES)
}

/// General weather risk section of the risk report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRiskAssessment {
    pub min_visibility_m: f64,
    pub max_wind_gusts_kmh: f64,
    pub max_wind_gusts_ms: f64,
    pub min_pressure_hpa: f64,
    pub risk_level: WeatherRisk,
    pub risk_color: RiskColor,
}

impl WeatherRiskAssessment {
    #[must_use]
    pub fn assess(inputs: HazardInputs) -> Self {
        let risk_level = weather_risk(&inputs);
        Self {
            min_visibility_m: inputs.min_visibility_m,
            max_wind_gusts_kmh: inputs.max_gusts_kmh,
            max_wind_gusts_ms: kmh_to_ms(inputs.max_gusts_kmh),
            min_pressure_hpa: inputs.min_pressure_hpa,
            risk_level,
            risk_color: risk_level.color(),
        }
    }
}
