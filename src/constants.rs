//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change where artifacts are read from, only edit this file or set the
//! matching environment variable.

/// Default classifier artifact (ONNX)
pub const DEFAULT_MODEL_PATH: &str = "models/classifier.onnx";

/// Default scaler artifact (JSON)
pub const DEFAULT_SCALER_PATH: &str = "models/scaler.json";

/// Default background reference sample (JSON rows, model input space)
pub const DEFAULT_BACKGROUND_PATH: &str = "models/background.json";

/// Coalitions evaluated per explanation
pub const DEFAULT_NSAMPLES: usize = 100;

/// Background rows kept for attribution
pub const DEFAULT_BACKGROUND_ROWS: usize = 100;

/// Sampler seed for attribution
pub const DEFAULT_ATTRIBUTION_SEED: u64 = 42;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Dropout-Risk";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get classifier path from environment or use default
pub fn get_model_path() -> String {
    std::env::var("DROPOUT_MODEL_PATH")
        .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
}

/// Get scaler path from environment or use default
pub fn get_scaler_path() -> String {
    std::env::var("DROPOUT_SCALER_PATH")
        .unwrap_or_else(|_| DEFAULT_SCALER_PATH.to_string())
}

/// Get background sample path from environment or use default
pub fn get_background_path() -> String {
    std::env::var("DROPOUT_BACKGROUND_PATH")
        .unwrap_or_else(|_| DEFAULT_BACKGROUND_PATH.to_string())
}

/// Expected SHA-256 of the classifier file, if pinned
pub fn get_model_sha256() -> Option<String> {
    std::env::var("DROPOUT_MODEL_SHA256")
        .ok()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// ONNX output holding the class probabilities, if not the first one
pub fn get_model_output() -> Option<String> {
    std::env::var("DROPOUT_MODEL_OUTPUT")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Get attribution sample budget from environment or use default
pub fn get_nsamples() -> usize {
    std::env::var("DROPOUT_SHAP_SAMPLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_NSAMPLES)
}

/// Get background row cap from environment or use default
pub fn get_background_rows() -> usize {
    std::env::var("DROPOUT_BACKGROUND_ROWS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_BACKGROUND_ROWS)
}

/// Get attribution seed from environment or use default
pub fn get_attribution_seed() -> u64 {
    std::env::var("DROPOUT_SHAP_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ATTRIBUTION_SEED)
}
