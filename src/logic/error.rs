//! Error taxonomy for the prediction pipeline.
//!
//! Two tiers: [`PipelineError`] is propagated to the caller untouched,
//! [`ExplanationError`] is absorbed into a degraded explanation payload.

use serde::{Deserialize, Serialize};

use super::features::normalize::FeatureError;
use super::model::inference::InferenceError;

/// Which cached artifact a [`ResourceError`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Classifier,
    Scaler,
    Background,
}

impl Artifact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Artifact::Classifier => "classifier",
            Artifact::Scaler => "scaler",
            Artifact::Background => "background sample",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cached artifact failed to load. Cloneable so that one stored failure can
/// be handed to every caller of the cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{artifact} unavailable: {reason}")]
pub struct ResourceError {
    pub artifact: Artifact,
    pub reason: String,
}

impl ResourceError {
    pub fn new(artifact: Artifact, reason: impl Into<String>) -> Self {
        Self {
            artifact,
            reason: reason.into(),
        }
    }
}

/// Errors that reach the caller of `predict`/`explain`
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(#[from] ResourceError),

    #[error("invalid value for {feature}: {value}")]
    InvalidFeatureValue { feature: &'static str, value: String },

    #[error("prediction failed: {0}")]
    PredictionFailed(#[source] InferenceError),
}

impl From<FeatureError> for PipelineError {
    fn from(err: FeatureError) -> Self {
        PipelineError::InvalidFeatureValue {
            feature: err.feature,
            value: err.value,
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ResourceUnavailable(_) => "resource_unavailable",
            PipelineError::InvalidFeatureValue { .. } => "invalid_feature_value",
            PipelineError::PredictionFailed(_) => "prediction_failed",
        }
    }
}

/// Errors of the attribution layer; never block a prediction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExplanationError {
    #[error("explanation unavailable: {0}")]
    Unavailable(String),

    #[error("attribution produced no usable feature records")]
    Empty,
}

impl From<ResourceError> for ExplanationError {
    fn from(err: ResourceError) -> Self {
        ExplanationError::Unavailable(err.to_string())
    }
}

impl From<InferenceError> for ExplanationError {
    fn from(err: InferenceError) -> Self {
        ExplanationError::Unavailable(err.to_string())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
