//! Batch prediction over many student records.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Pipeline;
use crate::logic::features::RawInput;
use crate::logic::model::{PredictionResult, RiskCategory};

/// Outcome for one record, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_predictions: usize,
    pub successful_predictions: usize,
    pub failed_predictions: usize,
    /// Mean dropout probability over successful records, 0 when none
    pub average_risk_score: f64,
    /// Count per risk category; every category is present
    pub risk_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub predictions: Vec<BatchEntry>,
    pub summary: BatchSummary,
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut risk_distribution: BTreeMap<String, usize> = RiskCategory::all()
            .iter()
            .map(|c| (c.as_str().to_string(), 0))
            .collect();

        let mut score_sum = 0.0;
        let mut successful = 0;
        for prediction in entries.iter().filter_map(|e| e.prediction.as_ref()) {
            successful += 1;
            score_sum += prediction.dropout_probability();
            *risk_distribution
                .entry(prediction.risk_category.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            total_predictions: entries.len(),
            successful_predictions: successful,
            failed_predictions: entries.len() - successful,
            average_risk_score: if successful > 0 { score_sum / successful as f64 } else { 0.0 },
            risk_distribution,
        }
    }
}

impl Pipeline {
    /// Predict every record in parallel. A bad record is reported in its
    /// entry and does not stop the others.
    pub fn predict_batch(&self, inputs: &[RawInput]) -> BatchReport {
        let predictions: Vec<BatchEntry> = inputs
            .par_iter()
            .enumerate()
            .map(|(index, input)| match self.predict(input) {
                Ok(prediction) => BatchEntry {
                    index,
                    prediction: Some(prediction),
                    error: None,
                },
                Err(e) => BatchEntry {
                    index,
                    prediction: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        let summary = BatchSummary::from_entries(&predictions);
        log::info!(
            "Batch: {} records, {} ok, {} failed, avg risk {:.3}",
            summary.total_predictions,
            summary.successful_predictions,
            summary.failed_predictions,
            summary.average_risk_score
        );

        BatchReport {
            predictions,
            summary,
        }
    }
}
