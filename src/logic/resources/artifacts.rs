//! Artifact Sources
//!
//! Where the classifier, scaler and background sample come from. The cache
//! only ever talks to [`ArtifactSource`], so tests and embedders can hand it
//! in-memory artifacts instead of files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::config::PipelineConfig;
use crate::logic::error::{Artifact, ResourceError};
use crate::logic::features::layout::validate_layout;
use crate::logic::features::FEATURE_COUNT;
use crate::logic::model::{Classifier, FeatureScaler, OnnxClassifier};

// ============================================================================
// BACKGROUND SAMPLE
// ============================================================================

/// Reference rows for attribution, already in model input space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSample {
    rows: Vec<[f32; FEATURE_COUNT]>,
}

/// On-disk forms: a bare array of rows, or rows tagged with the layout they
/// were produced under
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackgroundFile {
    Versioned {
        feature_version: u8,
        layout_hash: u32,
        rows: Vec<Vec<f64>>,
    },
    Bare(Vec<Vec<f64>>),
}

impl BackgroundSample {
    pub fn new(rows: Vec<[f32; FEATURE_COUNT]>) -> Self {
        Self { rows }
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let file: BackgroundFile =
            serde_json::from_str(content).map_err(|e| format!("failed to parse: {}", e))?;

        let raw_rows = match file {
            BackgroundFile::Versioned {
                feature_version,
                layout_hash,
                rows,
            } => {
                validate_layout(feature_version, layout_hash).map_err(|e| e.to_string())?;
                rows
            }
            BackgroundFile::Bare(rows) => rows,
        };

        if raw_rows.is_empty() {
            return Err("background sample has no rows".to_string());
        }

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (i, raw) in raw_rows.iter().enumerate() {
            if raw.len() != FEATURE_COUNT {
                return Err(format!(
                    "row {} has {} values, expected {}",
                    i,
                    raw.len(),
                    FEATURE_COUNT
                ));
            }
            if raw.iter().any(|v| !v.is_finite()) {
                return Err(format!("row {} contains a non-finite value", i));
            }
            let mut row = [0.0f32; FEATURE_COUNT];
            for (j, v) in raw.iter().enumerate() {
                row[j] = *v as f32;
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[[f32; FEATURE_COUNT]] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `max` rows, in file order
    pub fn truncated(&self, max: usize) -> Self {
        Self {
            rows: self.rows.iter().take(max).copied().collect(),
        }
    }

    pub fn to_array(&self) -> Array2<f32> {
        let mut out = Array2::zeros((self.rows.len(), FEATURE_COUNT));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                out[[i, j]] = *v;
            }
        }
        out
    }
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// Loads each artifact once per call; the cache guarantees one call per
/// process
pub trait ArtifactSource: Send + Sync {
    fn load_classifier(&self) -> Result<Arc<dyn Classifier>, ResourceError>;

    fn load_scaler(&self) -> Result<FeatureScaler, ResourceError>;

    fn load_background(&self) -> Result<BackgroundSample, ResourceError>;

    fn describe(&self) -> String {
        "custom artifact source".to_string()
    }
}

// ============================================================================
// FILE SOURCE
// ============================================================================

/// Reads artifacts from the paths in [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct FileArtifacts {
    model_path: PathBuf,
    model_sha256: Option<String>,
    model_output: Option<String>,
    scaler_path: PathBuf,
    background_path: PathBuf,
}

impl FileArtifacts {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            model_sha256: config.model_sha256.clone(),
            model_output: config.model_output.clone(),
            scaler_path: config.scaler_path.clone(),
            background_path: config.background_path.clone(),
        }
    }
}

fn read_artifact(artifact: Artifact, path: &Path) -> Result<String, ResourceError> {
    std::fs::read_to_string(path)
        .map_err(|e| ResourceError::new(artifact, format!("failed to read {}: {}", path.display(), e)))
}

/// Compare the SHA-256 of `bytes` against the pinned digest
pub fn verify_checksum(bytes: &[u8], expected_hex: &str) -> Result<(), String> {
    let actual = hex::encode(Sha256::digest(bytes));

    if actual != expected_hex.to_lowercase() {
        return Err(format!(
            "checksum mismatch: expected {}, got {}",
            expected_hex, actual
        ));
    }

    Ok(())
}

impl ArtifactSource for FileArtifacts {
    fn load_classifier(&self) -> Result<Arc<dyn Classifier>, ResourceError> {
        let bytes = std::fs::read(&self.model_path).map_err(|e| {
            ResourceError::new(
                Artifact::Classifier,
                format!("failed to read {}: {}", self.model_path.display(), e),
            )
        })?;

        // Verified bytes are the ones handed to the runtime
        if let Some(expected) = &self.model_sha256 {
            verify_checksum(&bytes, expected)
                .map_err(|e| ResourceError::new(Artifact::Classifier, e))?;
        }

        let classifier = OnnxClassifier::load_from_bytes(
            &bytes,
            &self.model_path.display().to_string(),
            self.model_output.as_deref(),
        )
        .map_err(|e| ResourceError::new(Artifact::Classifier, e.to_string()))?;

        Ok(Arc::new(classifier))
    }

    fn load_scaler(&self) -> Result<FeatureScaler, ResourceError> {
        let content = read_artifact(Artifact::Scaler, &self.scaler_path)?;
        let scaler = FeatureScaler::from_json(&content)
            .map_err(|e| ResourceError::new(Artifact::Scaler, e.to_string()))?;

        log::info!("Scaler loaded from: {}", self.scaler_path.display());
        Ok(scaler)
    }

    fn load_background(&self) -> Result<BackgroundSample, ResourceError> {
        let content = read_artifact(Artifact::Background, &self.background_path)?;
        let sample = BackgroundSample::from_json(&content)
            .map_err(|e| ResourceError::new(Artifact::Background, e))?;

        log::info!(
            "Background sample loaded from: {} ({} rows)",
            self.background_path.display(),
            sample.len()
        );
        Ok(sample)
    }

    fn describe(&self) -> String {
        format!(
            "files (model: {}, scaler: {}, background: {})",
            self.model_path.display(),
            self.scaler_path.display(),
            self.background_path.display()
        )
    }
}
