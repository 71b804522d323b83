//! Pipeline - Normalize → Predict → (Attribute → Summarize)
//!
//! [`Pipeline`] owns the resource cache and the engines and is constructed
//! once. Prediction errors propagate; attribution errors are folded into
//! [`ExplainedPrediction::explanation`] so an explanation can never block
//! the prediction it belongs to.

pub mod batch;


use once_cell::sync::OnceCell;

use crate::logic::config::PipelineConfig;
use crate::logic::error::{ExplanationError, PipelineError, PipelineResult, ResourceError};
use crate::logic::explain::{summarize, AttributionEngine, AttributionMethod, ExplanationSummary};
use crate::logic::features::{normalize, NormalizedInput, RawInput};
use crate::logic::model::{EngineStatus, PredictionResult, Predictor};
use crate::logic::resources::{ArtifactSource, FileArtifacts, ResourceCache};

pub use batch::{BatchEntry, BatchReport, BatchSummary};

/// A prediction plus its explanation, or why there is none
#[derive(Debug, Clone)]
pub struct ExplainedPrediction {
    pub prediction: PredictionResult,
    pub explanation: Result<ExplanationSummary, ExplanationError>,
}

pub struct Pipeline {
    config: PipelineConfig,
    cache: ResourceCache,
    predictor: Predictor,
    engine: AttributionEngine,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, source: impl ArtifactSource + 'static) -> Self {
        Self {
            cache: ResourceCache::new(source),
            predictor: Predictor::new(config.thresholds),
            engine: AttributionEngine::from_config(&config),
            config,
        }
    }

    /// Artifacts read from the configured paths
    pub fn from_config(config: PipelineConfig) -> Self {
        let source = FileArtifacts::from_config(&config);
        Self::new(config, source)
    }

    /// Replace the attribution backend
    pub fn with_attribution(mut self, method: impl AttributionMethod + 'static) -> Self {
        self.engine = AttributionEngine::new(method);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    fn normalized(&self, input: &RawInput) -> PipelineResult<NormalizedInput> {
        let scaler = self.cache.get_scaler()?;
        Ok(normalize(input, &scaler)?)
    }

    fn predict_normalized(&self, input: &NormalizedInput) -> PipelineResult<PredictionResult> {
        let classifier = self.cache.get_classifier()?;
        self.predictor
            .predict(classifier.as_ref(), &input.vector)
            .map_err(PipelineError::PredictionFailed)
    }

    fn attribute(&self, input: &NormalizedInput) -> Result<ExplanationSummary, ExplanationError> {
        let classifier = self.cache.get_classifier()?;
        let background = self.cache.get_background_sample()?;
        let records = self.engine.attribute(classifier.as_ref(), &background, input)?;
        summarize(records)
    }

    pub fn predict(&self, input: &RawInput) -> PipelineResult<PredictionResult> {
        let normalized = self.normalized(input)?;
        self.predict_normalized(&normalized)
    }

    pub fn explain(&self, input: &RawInput) -> PipelineResult<ExplainedPrediction> {
        let normalized = self.normalized(input)?;
        let prediction = self.predict_normalized(&normalized)?;

        let explanation = self.attribute(&normalized);
        if let Err(e) = &explanation {
            log::warn!("Explanation degraded ({}): {}", self.engine.method_name(), e);
        }

        Ok(ExplainedPrediction {
            prediction,
            explanation,
        })
    }

    /// Load every artifact now; first failure wins
    pub fn warm_up(&self) -> Result<(), ResourceError> {
        self.cache.get_scaler()?;
        self.cache.get_classifier()?;
        self.cache.get_background_sample()?;
        log::info!("Pipeline warm: all artifacts loaded");
        Ok(())
    }

    pub fn status(&self) -> EngineStatus {
        self.predictor
            .status(self.cache.is_classifier_loaded(), self.cache.classifier_name())
    }
}

// ============================================================================
// PROCESS-WIDE INSTANCE
// ============================================================================

static PIPELINE: OnceCell<Pipeline> = OnceCell::new();

/// Build the global pipeline on first call; later configs are ignored
pub fn init(config: PipelineConfig) -> &'static Pipeline {
    PIPELINE.get_or_init(|| {
        log::info!("Initializing pipeline");
        Pipeline::from_config(config)
    })
}

/// The global pipeline, if `init` has run
pub fn get() -> Option<&'static Pipeline> {
    PIPELINE.get()
}
