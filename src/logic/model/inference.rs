//! Inference Engine - ONNX Runtime Integration
//!
//! Load và chạy ONNX model.
//! The classifier is hidden behind [`Classifier`] so the predictor and the
//! attribution engine never see which runtime is underneath.

use ndarray::{Array2, ArrayView2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::features::{layout::layout_hash, FEATURE_COUNT};

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("InferenceError: {0}")]
    Runtime(String),

    #[error("InferenceError: invalid model output: {0}")]
    InvalidOutput(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Binary dropout/graduate classifier
///
/// `predict_proba` takes `n × FEATURE_COUNT` rows in model input space and
/// returns `n × k` scores, one row per input row. For the two-class models
/// this pipeline ships, column 0 is dropout and column 1 is graduate.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError>;

    fn name(&self) -> &str;
}

// ============================================================================
// MODEL METADATA
// ============================================================================

/// Recorded once when the classifier is loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub feature_count: usize,
    pub layout_hash: u32,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl ModelMetadata {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            feature_count: FEATURE_COUNT,
            layout_hash: layout_hash(),
            loaded_at: chrono::Utc::now(),
        }
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    // Session::run needs exclusive access
    session: Mutex<Session>,
    output_name: String,
    metadata: ModelMetadata,
}

impl OnnxClassifier {
    /// Load ONNX model từ bytes; `source` names where they came from
    pub fn load_from_bytes(
        model_bytes: &[u8],
        source: &str,
        output_name: Option<&str>,
    ) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {} ({} bytes)", source, model_bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError::Runtime(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Runtime(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| InferenceError::Runtime(format!("Failed to load model: {}", e)))?;

        let output_name = select_output(session.outputs.iter().map(|o| o.name.as_str()), output_name)?;
        let metadata = ModelMetadata::new(source);

        log::info!(
            "ONNX model loaded (output: {}, layout {:08x}, {} features)",
            output_name,
            metadata.layout_hash,
            metadata.feature_count
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            metadata,
        })
    }
}

/// The requested output if the model has it, else the first output
fn select_output<'a>(
    mut available: impl Iterator<Item = &'a str>,
    requested: Option<&str>,
) -> Result<String, InferenceError> {
    match requested {
        Some(name) => {
            if available.any(|o| o == name) {
                Ok(name.to_string())
            } else {
                Err(InferenceError::Runtime(format!("Model has no output named {}", name)))
            }
        }
        None => available
            .next()
            .map(str::to_string)
            .ok_or_else(|| InferenceError::Runtime("No output defined".to_string())),
    }
}

/// Split a flat output buffer into `n_rows` equal rows
fn split_rows(data: &[f32], n_rows: usize) -> Result<Array2<f32>, InferenceError> {
    if n_rows == 0 || data.is_empty() || data.len() % n_rows != 0 {
        return Err(InferenceError::InvalidOutput(format!(
            "{} values cannot be split into {} rows",
            data.len(),
            n_rows
        )));
    }

    let n_cols = data.len() / n_rows;
    Array2::from_shape_vec((n_rows, n_cols), data.to_vec())
        .map_err(|e| InferenceError::InvalidOutput(format!("Array error: {}", e)))
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        let n_rows = rows.nrows();
        if n_rows == 0 {
            return Ok(Array2::zeros((0, 0)));
        }

        let input_tensor = Value::from_array(rows.to_owned())
            .map_err(|e| InferenceError::Runtime(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::InvalidOutput("No output".to_string()))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::InvalidOutput(format!("Extract error: {}", e)))?;

        split_rows(output_tensor.1, n_rows)
    }

    fn name(&self) -> &str {
        &self.metadata.model_path
    }
}
