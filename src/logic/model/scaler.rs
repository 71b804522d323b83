//! Feature Scaler
//!
//! Learned transform for the 6 continuous features, loaded from JSON.
//! Binary features never pass through here.
//!
//! ```json
//! { "kind": "standard", "mean": [..6], "scale": [..6] }
//! { "kind": "min_max", "min_vals": [..6], "max_vals": [..6] }
//! ```
//!
//! `mean_` / `scale_` are accepted as aliases so a fitted sklearn scaler can
//! be dumped attribute-for-attribute.

use serde::{Deserialize, Serialize};

use crate::logic::features::CONTINUOUS_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    /// (x - mean) / scale
    Standard {
        #[serde(alias = "mean_")]
        mean: Vec<f64>,
        #[serde(alias = "scale_")]
        scale: Vec<f64>,
    },
    /// (x - min) / (max - min)
    MinMax {
        min_vals: Vec<f64>,
        max_vals: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalerError {
    #[error("expected {expected} {field} values, got {actual}")]
    Length {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("non-finite {field} value at index {index}")]
    NonFinite { field: &'static str, index: usize },
    #[error("failed to parse scaler: {0}")]
    Parse(String),
}

impl FeatureScaler {
    /// Scaler that leaves values unchanged
    pub fn identity() -> Self {
        FeatureScaler::Standard {
            mean: vec![0.0; CONTINUOUS_COUNT],
            scale: vec![1.0; CONTINUOUS_COUNT],
        }
    }

    /// Parse and validate
    pub fn from_json(content: &str) -> Result<Self, ScalerError> {
        let scaler: FeatureScaler =
            serde_json::from_str(content).map_err(|e| ScalerError::Parse(e.to_string()))?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> Result<(), ScalerError> {
        let columns: [(&'static str, &Vec<f64>); 2] = match self {
            FeatureScaler::Standard { mean, scale } => [("mean", mean), ("scale", scale)],
            FeatureScaler::MinMax { min_vals, max_vals } => {
                [("min_vals", min_vals), ("max_vals", max_vals)]
            }
        };

        for (field, values) in columns {
            if values.len() != CONTINUOUS_COUNT {
                return Err(ScalerError::Length {
                    field,
                    expected: CONTINUOUS_COUNT,
                    actual: values.len(),
                });
            }
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(ScalerError::NonFinite { field, index });
            }
        }

        Ok(())
    }

    /// Transform the continuous block
    pub fn transform(&self, values: &[f64; CONTINUOUS_COUNT]) -> [f64; CONTINUOUS_COUNT] {
        let mut out = [0.0f64; CONTINUOUS_COUNT];

        match self {
            FeatureScaler::Standard { mean, scale } => {
                for i in 0..CONTINUOUS_COUNT {
                    let m = mean.get(i).copied().unwrap_or(0.0);
                    // sklearn stores 1.0 for zero-variance columns
                    let s = match scale.get(i).copied() {
                        Some(s) if s != 0.0 => s,
                        _ => 1.0,
                    };
                    out[i] = (values[i] - m) / s;
                }
            }
            FeatureScaler::MinMax { min_vals, max_vals } => {
                for i in 0..CONTINUOUS_COUNT {
                    let min_val = min_vals.get(i).copied().unwrap_or(0.0);
                    let max_val = max_vals.get(i).copied().unwrap_or(1.0);
                    let range = (max_val - min_val).max(1e-8);
                    out[i] = (values[i] - min_val) / range;
                }
            }
        }

        out
    }
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_noop() {
        let values = [12.0, 15.0, 20.0, 15.0, 18.0, 180.0];
        assert_eq!(FeatureScaler::identity().transform(&values), values);
    }

    #[test]
    fn test_standard_transform() {
        let scaler = FeatureScaler::Standard {
            mean: vec![10.0, 12.0, 20.0, 10.0, 10.0, 150.0],
            scale: vec![2.0, 4.0, 5.0, 0.0, 1.0, 10.0],
        };
        let out = scaler.transform(&[12.0, 16.0, 25.0, 13.0, 9.0, 180.0]);
        assert_eq!(out, [1.0, 1.0, 1.0, 3.0, -1.0, 3.0]);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler = FeatureScaler::MinMax {
            min_vals: vec![0.0, 0.0, 17.0, 0.0, 0.0, 100.0],
            max_vals: vec![20.0, 20.0, 67.0, 20.0, 20.0, 200.0],
        };
        let out = scaler.transform(&[10.0, 5.0, 42.0, 20.0, 0.0, 150.0]);
        assert_eq!(out, [0.5, 0.25, 0.5, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_from_json_accepts_sklearn_names() {
        let json = r#"{"kind":"standard","mean_":[0,0,0,0,0,0],"scale_":[1,1,1,1,1,1]}"#;
        let scaler = FeatureScaler::from_json(json).unwrap();
        assert_eq!(scaler, FeatureScaler::identity());
    }

    #[test]
    fn test_from_json_rejects_wrong_width() {
        let json = r#"{"kind":"min_max","min_vals":[0,0],"max_vals":[1,1]}"#;
        let err = FeatureScaler::from_json(json).unwrap_err();
        assert!(matches!(err, ScalerError::Length { field: "min_vals", actual: 2, .. }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            FeatureScaler::from_json("not json"),
            Err(ScalerError::Parse(_))
        ));
    }
}
