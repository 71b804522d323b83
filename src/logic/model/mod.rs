//! Model Module - Classifier, Scaler & Risk Bucketing
//!
//! Tách logic inference khỏi input handling.
//! Dễ dàng swap model: anything implementing [`Classifier`] can be injected.

pub mod inference;
pub mod predictor;
pub mod scaler;
pub mod threshold;

// Re-export common types
pub use inference::{Classifier, InferenceError, ModelMetadata, OnnxClassifier};
pub use predictor::{ClassProbabilities, EngineStatus, PredictionResult, Predictor};
pub use scaler::{FeatureScaler, ScalerError};
pub use threshold::{RiskCategory, RiskThresholds};
