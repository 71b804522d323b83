//! Pipeline configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;
use super::model::RiskThresholds;

/// Where artifacts live and how attribution is budgeted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// ONNX classifier
    pub model_path: PathBuf,

    /// Pinned SHA-256 of the classifier file (hex, lowercase)
    pub model_sha256: Option<String>,

    /// ONNX output name holding probabilities; first output when unset
    pub model_output: Option<String>,

    /// Scaler JSON
    pub scaler_path: PathBuf,

    /// Background sample JSON
    pub background_path: PathBuf,

    /// Coalitions sampled per explanation
    pub nsamples: usize,

    /// Background rows kept (first N)
    pub max_background_rows: usize,

    /// Sampler seed
    pub seed: u64,

    pub thresholds: RiskThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(constants::DEFAULT_MODEL_PATH),
            model_sha256: None,
            model_output: None,
            scaler_path: PathBuf::from(constants::DEFAULT_SCALER_PATH),
            background_path: PathBuf::from(constants::DEFAULT_BACKGROUND_PATH),
            nsamples: constants::DEFAULT_NSAMPLES,
            max_background_rows: constants::DEFAULT_BACKGROUND_ROWS,
            seed: constants::DEFAULT_ATTRIBUTION_SEED,
            thresholds: RiskThresholds::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            model_path: PathBuf::from(constants::get_model_path()),
            model_sha256: constants::get_model_sha256(),
            model_output: constants::get_model_output(),
            scaler_path: PathBuf::from(constants::get_scaler_path()),
            background_path: PathBuf::from(constants::get_background_path()),
            nsamples: constants::get_nsamples(),
            max_background_rows: constants::get_background_rows(),
            seed: constants::get_attribution_seed(),
            thresholds: RiskThresholds::default(),
        }
    }

    /// Same settings, artifacts under `dir` with the default file names
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.model_path = dir.join("classifier.onnx");
        self.scaler_path = dir.join("scaler.json");
        self.background_path = dir.join("background.json");
        self
    }
}
