//! Test doubles for the injected seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ndarray::{Array2, ArrayView2};

use super::error::{Artifact, ExplanationError, ResourceError};
use super::explain::{AttributionMethod, RawAttribution};
use super::features::{FeatureVector, FEATURE_COUNT};
use super::model::{Classifier, FeatureScaler, InferenceError};
use super::resources::{ArtifactSource, BackgroundSample};

// ============================================================================
// CLASSIFIERS
// ============================================================================

/// p_dropout = sigmoid(bias + w·x)
pub struct LogisticClassifier {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
}

impl Default for LogisticClassifier {
    fn default() -> Self {
        Self {
            // approved, grade, age, evaluated, enrolled, prev_qual, fees, scholarship, debtor, gender
            weights: [-0.15, -0.1, 0.05, 0.02, 0.03, -0.01, -1.0, -0.5, 0.8, 0.2],
            bias: 1.5,
        }
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        let mut out = Array2::zeros((rows.nrows(), 2));
        for (i, row) in rows.rows().into_iter().enumerate() {
            let logit: f64 = self.bias
                + row.iter().zip(self.weights.iter()).map(|(x, w)| *x as f64 * w).sum::<f64>();
            let p = 1.0 / (1.0 + (-logit).exp());
            out[[i, 0]] = p as f32;
            out[[i, 1]] = (1.0 - p) as f32;
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

/// Scores linear in the inputs: [s, 1 - s] with s = bias + w·x
pub struct LinearClassifier {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
    /// Emit only the first column
    pub single_output: bool,
}

impl Classifier for LinearClassifier {
    fn predict_proba(&self, rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        let cols = if self.single_output { 1 } else { 2 };
        let mut out = Array2::zeros((rows.nrows(), cols));
        for (i, row) in rows.rows().into_iter().enumerate() {
            let s: f64 = self.bias
                + row.iter().zip(self.weights.iter()).map(|(x, w)| *x as f64 * w).sum::<f64>();
            out[[i, 0]] = s as f32;
            if !self.single_output {
                out[[i, 1]] = (1.0 - s) as f32;
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// Always fails
pub struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn predict_proba(&self, _rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        Err(InferenceError::Runtime("session poisoned".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

// ============================================================================
// ATTRIBUTION
// ============================================================================

/// Hands back the same raw attribution for every vector
pub struct FixedAttribution(pub RawAttribution);

impl AttributionMethod for FixedAttribution {
    fn attribute(
        &self,
        _classifier: &dyn Classifier,
        _background: &BackgroundSample,
        _vector: &FeatureVector,
    ) -> Result<RawAttribution, ExplanationError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

// ============================================================================
// ARTIFACTS
// ============================================================================

/// A small background in identity-scaler space
pub fn sample_background(n: usize) -> BackgroundSample {
    let rows = (0..n)
        .map(|i| {
            let k = (i % 7) as f32;
            [
                8.0 + k,
                11.0 + k * 0.5,
                19.0 + k,
                10.0 + k,
                12.0 + k,
                130.0 + k * 5.0,
                (i % 2) as f32,
                (i % 3 == 0) as u8 as f32,
                (i % 4 == 0) as u8 as f32,
                (i % 5 < 2) as u8 as f32,
            ]
        })
        .collect();
    BackgroundSample::new(rows)
}

#[derive(Default)]
pub struct LoadCounters {
    pub classifier: AtomicUsize,
    pub scaler: AtomicUsize,
    pub background: AtomicUsize,
}

pub struct InMemoryArtifacts {
    classifier: Result<Arc<dyn Classifier>, String>,
    scaler: Result<FeatureScaler, String>,
    background: Result<BackgroundSample, String>,
    delay: Duration,
    counters: Arc<LoadCounters>,
}

impl InMemoryArtifacts {
    pub fn healthy() -> Self {
        Self {
            classifier: Ok(Arc::new(LogisticClassifier::default())),
            scaler: Ok(FeatureScaler::identity()),
            background: Ok(sample_background(20)),
            delay: Duration::ZERO,
            counters: Arc::new(LoadCounters::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Ok(Arc::new(classifier));
        self
    }

    pub fn with_background(mut self, background: BackgroundSample) -> Self {
        self.background = Ok(background);
        self
    }

    pub fn with_corrupt_scaler(mut self) -> Self {
        self.scaler = Err("failed to parse scaler: expected value at line 1 column 1".to_string());
        self
    }

    pub fn with_missing_classifier(mut self) -> Self {
        self.classifier = Err("failed to read models/classifier.onnx: No such file or directory".to_string());
        self
    }

    pub fn with_missing_background(mut self) -> Self {
        self.background = Err("failed to read models/background.json".to_string());
        self
    }

    pub fn with_load_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn counters(&self) -> Arc<LoadCounters> {
        Arc::clone(&self.counters)
    }
}

impl ArtifactSource for InMemoryArtifacts {
    fn load_classifier(&self) -> Result<Arc<dyn Classifier>, ResourceError> {
        self.counters.classifier.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.classifier
            .clone()
            .map_err(|e| ResourceError::new(Artifact::Classifier, e))
    }

    fn load_scaler(&self) -> Result<FeatureScaler, ResourceError> {
        self.counters.scaler.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.scaler
            .clone()
            .map_err(|e| ResourceError::new(Artifact::Scaler, e))
    }

    fn load_background(&self) -> Result<BackgroundSample, ResourceError> {
        self.counters.background.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.background
            .clone()
            .map_err(|e| ResourceError::new(Artifact::Background, e))
    }
}
