//! Ranking and headline factors for a set of feature attributions.

use std::cmp::Ordering;

use super::types::{AttributionRecord, ExplanationSummary, FeatureAttribution, SummaryStats, NO_FACTOR};
use crate::logic::error::ExplanationError;

/// First feature (layout order) with the largest value of `key`, provided
/// that value passes `keep`
fn strongest<F, K>(attributions: &[FeatureAttribution], key: K, keep: F) -> String
where
    K: Fn(&FeatureAttribution) -> f64,
    F: Fn(f64) -> bool,
{
    let mut best: Option<&FeatureAttribution> = None;
    for a in attributions.iter().filter(|a| keep(key(*a))) {
        match best {
            Some(b) if key(b) >= key(a) => {}
            _ => best = Some(a),
        }
    }
    best.map(|a| a.feature_name.clone())
        .unwrap_or_else(|| NO_FACTOR.to_string())
}

pub fn summarize(attributions: Vec<FeatureAttribution>) -> Result<ExplanationSummary, ExplanationError> {
    if attributions.is_empty() {
        return Err(ExplanationError::Empty);
    }

    let strongest_dropout_factor = strongest(&attributions, |a| a.dropout_impact, |v| v > 0.0);
    // Most negative dropout impact, i.e. the largest protective push
    let strongest_protective_factor = strongest(&attributions, |a| -a.dropout_impact, |v| v > 0.0);

    let mut feature_impacts: Vec<AttributionRecord> =
        attributions.into_iter().map(AttributionRecord::from).collect();
    // Stable: equal magnitudes keep layout order
    feature_impacts.sort_by(|a, b| {
        b.dropout_impact
            .abs()
            .partial_cmp(&a.dropout_impact.abs())
            .unwrap_or(Ordering::Equal)
    });

    let most_influential_feature = feature_impacts[0].feature_name.clone();

    Ok(ExplanationSummary {
        feature_impacts,
        summary: SummaryStats {
            most_influential_feature,
            strongest_dropout_factor,
            strongest_protective_factor,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::explain::types::Interpretation;
    use serde_json::{json, Value};

    fn attr(name: &str, dropout: f64) -> FeatureAttribution {
        FeatureAttribution {
            feature_name: name.to_string(),
            original_value: Value::Null,
            scaled_value: 0.0,
            dropout_impact: dropout,
            graduate_impact: -dropout,
        }
    }

    #[test]
    fn test_ranking_and_factors() {
        let summary = summarize(vec![
            attr("Total_units_approved", -0.30),
            attr("Average_grade", -0.10),
            attr("Debtor", 0.25),
            attr("Gender", 0.05),
            attr("Scholarship_holder", 0.0),
        ])
        .unwrap();

        let order: Vec<&str> = summary.feature_impacts.iter().map(|r| r.feature_name.as_str()).collect();
        assert_eq!(
            order,
            ["Total_units_approved", "Debtor", "Average_grade", "Gender", "Scholarship_holder"]
        );
        assert_eq!(summary.most_influential_feature(), "Total_units_approved");
        assert_eq!(summary.strongest_dropout_factor(), "Debtor");
        assert_eq!(summary.strongest_protective_factor(), "Total_units_approved");
    }

    #[test]
    fn test_interpretations() {
        let summary = summarize(vec![attr("a", 0.2), attr("b", -0.1), attr("c", 0.0)]).unwrap();
        let by_name = |n: &str| {
            summary
                .feature_impacts
                .iter()
                .find(|r| r.feature_name == n)
                .map(|r| r.interpretation)
                .unwrap()
        };
        assert_eq!(by_name("a"), Interpretation::IncreasesRisk);
        assert_eq!(by_name("b"), Interpretation::DecreasesRisk);
        assert_eq!(by_name("c"), Interpretation::Neutral);
    }

    #[test]
    fn test_ties_keep_layout_order() {
        let summary = summarize(vec![attr("first", 0.1), attr("second", -0.1), attr("third", 0.1)]).unwrap();
        let order: Vec<&str> = summary.feature_impacts.iter().map(|r| r.feature_name.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
        assert_eq!(summary.strongest_dropout_factor(), "first");
    }

    #[test]
    fn test_no_positive_or_negative_factor() {
        let all_protective = summarize(vec![attr("a", -0.2), attr("b", -0.1)]).unwrap();
        assert_eq!(all_protective.strongest_dropout_factor(), NO_FACTOR);
        assert_eq!(all_protective.strongest_protective_factor(), "a");

        let all_zero = summarize(vec![attr("a", 0.0), attr("b", 0.0)]).unwrap();
        assert_eq!(all_zero.strongest_dropout_factor(), "None");
        assert_eq!(all_zero.strongest_protective_factor(), "None");
        assert_eq!(all_zero.most_influential_feature(), "a");
    }

    #[test]
    fn test_empty_is_an_error() {
        assert_eq!(summarize(vec![]).unwrap_err(), ExplanationError::Empty);
    }

    #[test]
    fn test_top_features_and_wire_shape() {
        let summary = summarize(vec![attr("a", 0.3), attr("b", -0.2), attr("c", 0.1)]).unwrap();
        assert_eq!(summary.top_features(2).len(), 2);
        assert_eq!(summary.top_features(10).len(), 3);

        let wire = serde_json::to_value(&summary).unwrap();
        assert_eq!(wire["summary"]["most_influential_feature"], json!("a"));
        assert_eq!(wire["feature_impacts"][0]["feature"], json!("a"));
        assert_eq!(wire["feature_impacts"][0]["interpretation"], json!("Increases dropout risk"));
        assert!(wire["feature_impacts"][0].get("preprocessed_value").is_some());
    }
}
