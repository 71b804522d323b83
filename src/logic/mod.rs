//! Logic Module - Prediction & Attribution Engines
//!
//! - `features/` - Feature layout, vector, input normalization
//! - `model/` - Classifier (ONNX), scaler, predictor, risk thresholds
//! - `resources/` - Artifact sources and the once-only cache
//! - `explain/` - Kernel SHAP, shape normalization, summaries
//! - `pipeline/` - The service object tying them together

pub mod config;
pub mod error;

pub mod explain;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod resources;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PipelineConfig;
pub use error::{ExplanationError, PipelineError, PipelineResult, ResourceError};
pub use pipeline::{ExplainedPrediction, Pipeline};
