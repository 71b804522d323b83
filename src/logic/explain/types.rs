use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder reported when no feature qualifies as a factor
pub const NO_FACTOR: &str = "None";

/// Direction of a feature's push on dropout probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpretation {
    #[serde(rename = "Increases dropout risk")]
    IncreasesRisk,
    #[serde(rename = "Decreases dropout risk")]
    DecreasesRisk,
    #[serde(rename = "Neutral impact")]
    Neutral,
}

impl Interpretation {
    pub fn from_impact(dropout_impact: f64) -> Self {
        if dropout_impact > 0.0 {
            Interpretation::IncreasesRisk
        } else if dropout_impact < 0.0 {
            Interpretation::DecreasesRisk
        } else {
            Interpretation::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interpretation::IncreasesRisk => "Increases dropout risk",
            Interpretation::DecreasesRisk => "Decreases dropout risk",
            Interpretation::Neutral => "Neutral impact",
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-feature attribution as extracted from the canonical array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature_name: String,
    pub original_value: Value,
    pub scaled_value: f64,
    pub dropout_impact: f64, // sign = direction, magnitude = importance
    pub graduate_impact: f64,
}

/// One ranked row of an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    #[serde(rename = "feature")]
    pub feature_name: String,
    pub original_value: Value,
    #[serde(rename = "preprocessed_value")]
    pub scaled_value: f64,
    pub dropout_impact: f64,
    pub graduate_impact: f64,
    pub interpretation: Interpretation,
}

impl From<FeatureAttribution> for AttributionRecord {
    fn from(a: FeatureAttribution) -> Self {
        Self {
            interpretation: Interpretation::from_impact(a.dropout_impact),
            feature_name: a.feature_name,
            original_value: a.original_value,
            scaled_value: a.scaled_value,
            dropout_impact: a.dropout_impact,
            graduate_impact: a.graduate_impact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub most_influential_feature: String,
    pub strongest_dropout_factor: String,
    pub strongest_protective_factor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationSummary {
    /// Sorted by descending |dropout_impact|
    pub feature_impacts: Vec<AttributionRecord>,
    pub summary: SummaryStats,
}

impl ExplanationSummary {
    pub fn most_influential_feature(&self) -> &str {
        &self.summary.most_influential_feature
    }

    pub fn strongest_dropout_factor(&self) -> &str {
        &self.summary.strongest_dropout_factor
    }

    pub fn strongest_protective_factor(&self) -> &str {
        &self.summary.strongest_protective_factor
    }

    /// The `n` most influential records
    pub fn top_features(&self, n: usize) -> &[AttributionRecord] {
        &self.feature_impacts[..n.min(self.feature_impacts.len())]
    }
}
