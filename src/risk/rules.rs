//! Ordered rule tables shared by the classifications

use serde::{Deserialize, Serialize};
use std::fmt;

/// Traffic-light color attached to every classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskColor {
    Green,
    Orange,
    Red,
}

impl RiskColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RiskColor::Green => "GREEN",
            RiskColor::Orange => "ORANGE",
            RiskColor::Red => "RED",
        }
    }
}

impl fmt::Display for RiskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guard paired with the level it yields when it holds
pub struct Rule<I, L> {
    pub level: L,
    pub applies: fn(&I) -> bool,
}

/// First rule (in table order) whose guard holds wins; `default` otherwise.
pub fn first_match<I, L: Copy>(input: &I, default: L, rules: &[Rule<I, L>]) -> L {
    rules
        .iter()
        .find(|rule| (rule.applies)(input))
        .map_or(default, |rule| rule.level)
}

/// Every rule is evaluated; the result is the most severe level whose guard
/// held, never lower than `base`.
pub fn escalate<I, L: Copy + Ord>(input: &I, base: L, rules: &[Rule<I, L>]) -> L {
    rules
        .iter()
        .filter(|rule| (rule.applies)(input))
        .map(|rule| rule.level)
        .fold(base, Ord::max)
}
