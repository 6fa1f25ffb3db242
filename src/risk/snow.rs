//! Snow hazard classification

use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::{RiskColor, Rule, escalate};
use super::units::cm_to_mm;

pub const MEDIUM_TOTAL_SNOW_CM: f64 = 5.0;
pub const MEDIUM_SNOW_DEPTH_CM: f64 = 10.0;
pub const HIGH_TOTAL_SNOW_CM: f64 = 20.0;
pub const HIGH_SNOW_DEPTH_CM: f64 = 30.0;
/// Freezing level below which snow risk is high regardless of amounts (m)
pub const HIGH_FREEZING_LEVEL_M: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnowRisk {
    Low,
    Medium,
    High,
}

impl SnowRisk {
    #[must_use]
    pub const fn color(self) -> RiskColor {
        match self {
            SnowRisk::Low => RiskColor::Green,
            SnowRisk::Medium => RiskColor::Orange,
            SnowRisk::High => RiskColor::Red,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SnowRisk::Low => "LOW",
            SnowRisk::Medium => "MEDIUM",
            SnowRisk::High => "HIGH",
        }
    }
}

impl fmt::Display for SnowRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowInputs {
    pub total_snow_cm: f64,
    pub max_snow_depth_cm: f64,
    pub min_freezing_level_m: f64,
}

/// Increasing severity; every rule is checked.
const SNOW_RULES: &[Rule<SnowInputs, SnowRisk>] = &[
    Rule {
        level: SnowRisk::Medium,
        applies: |i: &SnowInputs| {
            i.total_snow_cm > MEDIUM_TOTAL_SNOW_CM || i.max_snow_depth_cm > MEDIUM_SNOW_DEPTH_CM
        },
    },
    Rule {
        level: SnowRisk::High,
        applies: |i: &SnowInputs| {
            i.total_snow_cm > HIGH_TOTAL_SNOW_CM
                || i.max_snow_depth_cm > HIGH_SNOW_DEPTH_CM
                || i.min_freezing_level_m < HIGH_FREEZING_LEVEL_M
        },
    },
];

#[must_use]
pub fn snow_risk(inputs: &SnowInputs) -> SnowRisk {
    escalate(inputs, SnowRisk::Low, SNOW_RULES)
}

/// Snow analysis section of the risk report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowAnalysis {
    pub total_snow_cm: f64,
    pub total_snow_mm: f64,
    pub max_snow_depth_cm: f64,
    pub freezing_level_min_m: f64,
    pub risk_level: SnowRisk,
    pub risk_color: RiskColor,
}

impl SnowAnalysis {
    #[must_use]
    pub fn assess(inputs: SnowInputs) -> Self {
        let risk_level = snow_risk(&inputs);
        Self {
            total_snow_cm: inputs.total_snow_cm,
            total_snow_mm: cm_to_mm(inputs.total_snow_cm),
            max_snow_depth_cm: inputs.max_snow_depth_cm,
            freezing_level_min_m: inputs.min_freezing_level_m,
            risk_level,
            risk_color: risk_level.color(),
        }
    }
}
