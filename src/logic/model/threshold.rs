//! Risk Thresholds
//!
//! Buckets the dropout probability into low / medium / high.
//! Boundaries belong to the outer buckets: `p >= high_min` is high,
//! `p <= low_max` is low, everything strictly between is medium.

use serde::{Deserialize, Serialize};

/// At or above this dropout probability = high risk
pub const HIGH_RISK_MIN: f64 = 0.65;

/// At or below this dropout probability = low risk
pub const LOW_RISK_MAX: f64 = 0.35;

/// Three-bucket discretization of dropout probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }

    pub fn all() -> [RiskCategory; 3] {
        [RiskCategory::Low, RiskCategory::Medium, RiskCategory::High]
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Lower bound (inclusive) of the high bucket
    pub high_min: f64,

    /// Upper bound (inclusive) of the low bucket
    pub low_max: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_min: HIGH_RISK_MIN,
            low_max: LOW_RISK_MAX,
        }
    }
}

impl RiskThresholds {
    pub fn new(low_max: f64, high_min: f64) -> Self {
        Self { high_min, low_max }
    }

    /// Total over [0, 1]; high is checked first so the two inclusive bounds
    /// never overlap even if misconfigured
    pub fn categorize(&self, dropout_probability: f64) -> RiskCategory {
        if dropout_probability >= self.high_min {
            RiskCategory::High
        } else if dropout_probability <= self.low_max {
            RiskCategory::Low
        } else {
            RiskCategory::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = RiskThresholds::default();
        assert_eq!(t.high_min, 0.65);
        assert_eq!(t.low_max, 0.35);
    }

    #[test]
    fn test_boundaries_land_in_outer_buckets() {
        let t = RiskThresholds::default();
        assert_eq!(t.categorize(0.65), RiskCategory::High);
        assert_eq!(t.categorize(0.35), RiskCategory::Low);
        assert_eq!(t.categorize(0.6499), RiskCategory::Medium);
        assert_eq!(t.categorize(0.3501), RiskCategory::Medium);
    }

    #[test]
    fn test_extremes() {
        let t = RiskThresholds::default();
        assert_eq!(t.categorize(0.0), RiskCategory::Low);
        assert_eq!(t.categorize(1.0), RiskCategory::High);
        assert_eq!(t.categorize(0.5), RiskCategory::Medium);
    }

    #[test]
    fn test_no_gaps_across_unit_interval() {
        let t = RiskThresholds::default();
        let mut previous = RiskCategory::Low;
        for step in 0..=1000 {
            let p = step as f64 / 1000.0;
            let category = t.categorize(p);
            // Monotone: never steps back to a lower bucket
            assert!(category >= previous, "p={p} went from {previous} to {category}");
            previous = category;
        }
        assert_eq!(previous, RiskCategory::High);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskCategory::Medium).unwrap(), "\"medium\"");
        assert_eq!(RiskCategory::High.to_string(), "high");
    }
}
