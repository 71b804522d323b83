//! Explain Module - Per-feature Attribution
//!
//! `kernel` estimates Shapley values, `shape` folds whatever layout a backend
//! returns into one canonical array, `engine` reads it out per feature and
//! `summary` ranks the result.

pub mod engine;
pub mod kernel;
pub mod shape;
pub mod summary;
pub mod types;

pub use engine::{AttributionEngine, AttributionMethod};
pub use kernel::KernelExplainer;
pub use shape::{AttributionShape, RawAttribution};
pub use summary::summarize;
pub use types::{AttributionRecord, ExplanationSummary, FeatureAttribution, Interpretation};
