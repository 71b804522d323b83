//! Commands - Entry points for the outer request layer
//!
//! Each command takes a [`Pipeline`] and a JSON request body and returns a
//! serializable response in the wire shapes the frontend reads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::logic::error::{ExplanationError, PipelineError};
use crate::logic::explain::{AttributionRecord, ExplanationSummary};
use crate::logic::features::RawInput;
use crate::logic::model::{EngineStatus, PredictionResult};
use crate::logic::pipeline::{BatchReport, ExplainedPrediction, Pipeline};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Pipeline(e) => e.kind(),
        }
    }

    /// `{ "error": ..., "kind": ... }`
    pub fn to_body(&self) -> Value {
        json!({
            "error": self.to_string(),
            "kind": self.kind(),
        })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// WIRE TYPES
// ============================================================================

/// `{prediction, label, probability: {dropout, graduate}, risk_category}`
pub type PredictionResponse = PredictionResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExplanationPayload {
    Explained(ExplanationSummary),
    Degraded {
        error: String,
        feature_impacts: Vec<AttributionRecord>,
    },
}

impl From<Result<ExplanationSummary, ExplanationError>> for ExplanationPayload {
    fn from(result: Result<ExplanationSummary, ExplanationError>) -> Self {
        match result {
            Ok(summary) => ExplanationPayload::Explained(summary),
            Err(e) => ExplanationPayload::Degraded {
                error: e.to_string(),
                feature_impacts: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub prediction: PredictionResponse,
    pub explanation: ExplanationPayload,
}

impl From<ExplainedPrediction> for ExplanationResponse {
    fn from(explained: ExplainedPrediction) -> Self {
        Self {
            prediction: explained.prediction,
            explanation: explained.explanation.into(),
        }
    }
}

// ============================================================================
// REQUEST PARSING
// ============================================================================

/// One student record: a JSON object
pub fn parse_record(value: Value) -> ApiResult<RawInput> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::InvalidRequest(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

/// A list of records, either a bare array or `{"students": [...]}`
pub fn parse_records(value: Value) -> ApiResult<Vec<RawInput>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("students") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ApiError::InvalidRequest(
                    "expected an array or an object with a \"students\" array".to_string(),
                ))
            }
        },
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "expected an array, got {}",
                type_name(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            parse_record(item).map_err(|e| ApiError::InvalidRequest(format!("record {}: {}", i, e)))
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Predict dropout risk for one student
pub fn predict_student(pipeline: &Pipeline, request: Value) -> ApiResult<PredictionResponse> {
    let input = parse_record(request)?;
    Ok(pipeline.predict(&input)?)
}

/// Prediction plus per-feature explanation; explanation failures degrade
/// the payload and never fail the command
pub fn predict_with_explanation(pipeline: &Pipeline, request: Value) -> ApiResult<ExplanationResponse> {
    let input = parse_record(request)?;
    Ok(pipeline.explain(&input)?.into())
}

/// Predict many students; per-record failures are reported in the report
pub fn predict_batch(pipeline: &Pipeline, request: Value) -> ApiResult<BatchReport> {
    let inputs = parse_records(request)?;
    Ok(pipeline.predict_batch(&inputs))
}

/// Model and inference counters
pub fn get_engine_status(pipeline: &Pipeline) -> EngineStatus {
    pipeline.status()
}
