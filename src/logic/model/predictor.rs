//! Predictor
//!
//! Runs the classifier on one normalized vector and turns the probability
//! pair into a labelled, risk-bucketed [`PredictionResult`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::inference::{Classifier, InferenceError};
use super::threshold::{RiskCategory, RiskThresholds};
use crate::logic::features::{FeatureVector, LayoutInfo, FEATURE_COUNT};

pub const DROPOUT_CLASS: u8 = 0;
pub const GRADUATE_CLASS: u8 = 1;

/// Allowed drift of `p_dropout + p_graduate` from 1 before the output is rejected
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-3;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub dropout: f64,
    pub graduate: f64,
}

/// Prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = dropout, 1 = graduate
    #[serde(rename = "prediction")]
    pub predicted_class: u8,
    pub label: String,
    pub probability: ClassProbabilities,
    pub risk_category: RiskCategory,
}

impl PredictionResult {
    pub fn dropout_probability(&self) -> f64 {
        self.probability.dropout
    }

    pub fn graduate_probability(&self) -> f64 {
        self.probability.graduate
    }
}

pub fn label_for(class: u8) -> &'static str {
    if class == GRADUATE_CLASS {
        "Graduate"
    } else {
        "Dropout"
    }
}

/// Engine Status for callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub model_name: String,
    pub inference_device: String,
    pub avg_latency_ms: f32,
    pub inference_count: u64,
    /// Feature layout the engine expects its inputs in
    pub layout: LayoutInfo,
}

// ============================================================================
// PREDICTOR
// ============================================================================

pub struct Predictor {
    thresholds: RiskThresholds,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl Predictor {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self {
            thresholds,
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Classify one vector
    pub fn predict(
        &self,
        classifier: &dyn Classifier,
        vector: &FeatureVector,
    ) -> Result<PredictionResult, InferenceError> {
        let start_time = Instant::now();

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Predicting on {}", vector.to_log_entry());
        }

        let input = Array2::from_shape_vec((1, FEATURE_COUNT), vector.values.to_vec())
            .map_err(|e| InferenceError::Runtime(format!("Array error: {}", e)))?;
        let output = classifier.predict_proba(input.view())?;

        let row: Vec<f32> = output
            .rows()
            .into_iter()
            .next()
            .map(|r| r.to_vec())
            .ok_or_else(|| InferenceError::InvalidOutput("empty output".to_string()))?;

        let result = from_probabilities(&row, &self.thresholds)?;

        self.latency_sum_us
            .fetch_add(start_time.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        log::debug!(
            "Prediction: {} (p_dropout={:.4}, risk={})",
            result.label,
            result.probability.dropout,
            result.risk_category
        );

        Ok(result)
    }

    pub fn status(&self, model_loaded: bool, model_name: impl Into<String>) -> EngineStatus {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

        EngineStatus {
            model_loaded,
            model_name: model_name.into(),
            inference_device: "ONNX Runtime (CPU)".to_string(),
            avg_latency_ms: avg,
            inference_count: count,
            layout: LayoutInfo::current(),
        }
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(RiskThresholds::default())
    }
}

/// Validate a `[p_dropout, p_graduate]` row and derive the result
pub fn from_probabilities(
    row: &[f32],
    thresholds: &RiskThresholds,
) -> Result<PredictionResult, InferenceError> {
    let [dropout, graduate] = match row {
        [d, g] => [*d as f64, *g as f64],
        _ => {
            return Err(InferenceError::InvalidOutput(format!(
                "expected 2 class probabilities, got {}",
                row.len()
            )))
        }
    };

    if !dropout.is_finite() || !graduate.is_finite() || dropout < 0.0 || graduate < 0.0 {
        return Err(InferenceError::InvalidOutput(format!(
            "probabilities must be finite and non-negative: [{}, {}]",
            dropout, graduate
        )));
    }

    let total = dropout + graduate;
    if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(InferenceError::InvalidOutput(format!(
            "probabilities sum to {} instead of 1",
            total
        )));
    }

    let dropout = dropout / total;
    let graduate = 1.0 - dropout;

    // Ties go to dropout, like argmax picking the first index
    let predicted_class = if graduate > dropout { GRADUATE_CLASS } else { DROPOUT_CLASS };

    Ok(PredictionResult {
        predicted_class,
        label: label_for(predicted_class).to_string(),
        probability: ClassProbabilities { dropout, graduate },
        risk_category: thresholds.categorize(dropout),
    })
}
