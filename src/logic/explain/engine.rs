//! Attribution Engine
//!
//! Runs an [`AttributionMethod`] for one normalized input and maps the
//! canonical attribution array back onto named features by slot index.

use ndarray::Array3;
use serde_json::Value;

use super::kernel::KernelExplainer;
use super::shape::{canonicalize, RawAttribution};
use super::types::FeatureAttribution;
use crate::logic::config::PipelineConfig;
use crate::logic::error::ExplanationError;
use crate::logic::features::{FeatureVector, NormalizedInput, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::model::Classifier;
use crate::logic::resources::BackgroundSample;

/// A backend that computes per-feature contributions for one vector.
/// Implementations may return any layout [`RawAttribution`] can describe.
pub trait AttributionMethod: Send + Sync {
    fn attribute(
        &self,
        classifier: &dyn Classifier,
        background: &BackgroundSample,
        vector: &FeatureVector,
    ) -> Result<RawAttribution, ExplanationError>;

    fn name(&self) -> &str;
}

pub struct AttributionEngine {
    method: Box<dyn AttributionMethod>,
}

impl AttributionEngine {
    pub fn new(method: impl AttributionMethod + 'static) -> Self {
        Self {
            method: Box::new(method),
        }
    }

    /// Kernel SHAP with the configured sample budget
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(KernelExplainer::from_config(config))
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    pub fn attribute(
        &self,
        classifier: &dyn Classifier,
        background: &BackgroundSample,
        input: &NormalizedInput,
    ) -> Result<Vec<FeatureAttribution>, ExplanationError> {
        input
            .vector
            .validate()
            .map_err(|e| ExplanationError::Unavailable(e.to_string()))?;

        let raw = self.method.attribute(classifier, background, &input.vector)?;
        let canonical = canonicalize(raw)?;

        Ok(extract(&canonical, input))
    }
}

/// Read row 0 of the canonical array by layout index. Slots the array does
/// not cover, or that hold non-finite values, are left out.
pub fn extract(canonical: &Array3<f64>, input: &NormalizedInput) -> Vec<FeatureAttribution> {
    let (_, features, classes) = canonical.dim();
    if features != FEATURE_COUNT {
        log::warn!(
            "Attribution covers {} features, layout has {}",
            features,
            FEATURE_COUNT
        );
    }

    let mut out = Vec::with_capacity(FEATURE_COUNT);
    for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
        let Some(&dropout_impact) = canonical.get([0, i, 0]) else {
            log::debug!("Skipping {}: no attribution at index {}", name, i);
            continue;
        };
        let graduate_impact = if classes > 1 {
            canonical.get([0, i, 1]).copied().unwrap_or(0.0)
        } else {
            0.0
        };

        if !dropout_impact.is_finite() || !graduate_impact.is_finite() {
            log::warn!("Skipping {}: non-finite attribution", name);
            continue;
        }

        out.push(FeatureAttribution {
            feature_name: name.to_string(),
            original_value: input.originals.get(i).cloned().unwrap_or(Value::Null),
            scaled_value: input.vector.values[i] as f64,
            dropout_impact,
            graduate_impact,
        });
    }
    out
}
