//! Student dropout risk prediction with per-feature explanations.

pub mod api;
pub mod constants;
pub mod logic;

pub use logic::{ExplainedPrediction, Pipeline, PipelineConfig, PipelineError};
