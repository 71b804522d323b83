//! Normalizer tests: alias resolution, coercion tables, remap and scaling.

#[cfg(test)]
mod normalize_tests {
    use serde_json::{json, Value};

    use crate::logic::features::normalize::{
        coerce_flag, coerce_gender, normalize, parse_field, parse_input, RawInput,
        DEFAULT_GRADE_PERCENT, FEATURE_SPECS,
    };
    use crate::logic::features::{feature_index, FEATURE_COUNT, FEATURE_LAYOUT};
    use crate::logic::model::scaler::FeatureScaler;

    fn raw(value: Value) -> RawInput {
        value.as_object().cloned().unwrap_or_default()
    }

    fn scenario_a() -> RawInput {
        raw(json!({
            "average_grade": 75,
            "previous_qualification_grade": 80,
            "age_at_enrollment": 20,
            "total_units_approved": 12,
            "total_units_evaluated": 15,
            "total_units_enrolled": 18,
            "tuition_fees_up_to_date": true,
            "scholarship_holder": false,
            "debtor": false,
            "gender": "female"
        }))
    }

    #[test]
    fn test_specs_follow_layout() {
        for (spec, name) in FEATURE_SPECS.iter().zip(FEATURE_LAYOUT.iter()) {
            assert_eq!(spec.name, *name);
            assert!(spec.aliases.len() >= 2, "{} needs two spellings", spec.name);
        }
    }

    #[test]
    fn test_scenario_a_remap() {
        let (_, values) = parse_input(&scenario_a()).unwrap();

        assert_eq!(values, [12.0, 15.0, 20.0, 15.0, 18.0, 180.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_identity_scaler_keeps_model_values() {
        let normalized = normalize(&scenario_a(), &FeatureScaler::identity()).unwrap();

        assert_eq!(normalized.vector.get_by_name("Average_grade"), Some(15.0));
        assert_eq!(normalized.vector.get_by_name("Previous_qualification_(grade)"), Some(180.0));
        assert_eq!(normalized.vector.get_by_name("Gender"), Some(0.0));
        assert_eq!(normalized.originals.len(), FEATURE_COUNT);
        assert_eq!(normalized.originals[1], json!(75));
        assert_eq!(normalized.originals[9], json!("female"));
    }

    #[test]
    fn test_scaler_only_touches_continuous_block() {
        let scaler = FeatureScaler::Standard {
            mean: vec![100.0; 6],
            scale: vec![1.0; 6],
        };
        let normalized = normalize(&scenario_a(), &scaler).unwrap();

        assert_eq!(normalized.vector.get(0), Some(-88.0));
        assert_eq!(normalized.vector.get(5), Some(80.0));
        assert_eq!(normalized.vector.binary(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(normalized.model_values[0], 12.0);
    }

    #[test]
    fn test_internal_keys_are_accepted() {
        let input = raw(json!({
            "Total_units_approved": 7,
            "Average_grade": 50,
            "Previous_qualification_(grade)": 0,
            "Debtor": 1,
            "Gender": "M"
        }));
        let (_, values) = parse_input(&input).unwrap();

        assert_eq!(values[0], 7.0);
        assert_eq!(values[1], 10.0);
        assert_eq!(values[5], 100.0);
        assert_eq!(values[8], 1.0);
        assert_eq!(values[9], 1.0);
    }

    #[test]
    fn test_friendly_key_wins_over_internal() {
        let input = raw(json!({ "debtor": "no", "Debtor": "yes" }));
        let (_, values) = parse_input(&input).unwrap();
        assert_eq!(values[8], 0.0);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let (fields, values) = parse_input(&RawInput::new()).unwrap();

        assert!(fields.iter().all(|f| f.defaulted));
        assert_eq!(values[feature_index("Total_units_approved").unwrap()], 0.0);
        assert_eq!(values[feature_index("Age_at_enrollment").unwrap()], 0.0);
        assert_eq!(values[feature_index("Average_grade").unwrap()], DEFAULT_GRADE_PERCENT / 5.0);
        assert_eq!(values[feature_index("Previous_qualification_(grade)").unwrap()], 150.0);
        assert_eq!(&values[6..], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(fields[9].original, json!("female"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let input = raw(json!({ "debtor": null, "Debtor": true }));
        let (_, values) = parse_input(&input).unwrap();
        assert_eq!(values[8], 1.0);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let input = raw(json!({ "average_grade": " 60 ", "age_at_enrollment": "19" }));
        let (_, values) = parse_input(&input).unwrap();
        assert_eq!(values[1], 12.0);
        assert_eq!(values[2], 19.0);
    }

    #[test]
    fn test_bad_numeric_is_rejected() {
        let input = raw(json!({ "total_units_enrolled": "lots" }));
        let err = parse_input(&input).unwrap_err();
        assert_eq!(err.feature, "Total_units_enrolled");

        let input = raw(json!({ "age_at_enrollment": true }));
        assert!(parse_input(&input).is_err());
    }

    #[test]
    fn test_flag_representations_agree() {
        for truthy in [json!(true), json!(1), json!(1.0), json!("yes"), json!("Y"), json!("TRUE"), json!("1")] {
            assert_eq!(coerce_flag(&truthy), Some(1.0), "{truthy}");
        }
        for falsy in [json!(false), json!(0), json!("no"), json!("N"), json!("False"), json!("0")] {
            assert_eq!(coerce_flag(&falsy), Some(0.0), "{falsy}");
        }
        for bad in [json!(2), json!(0.5), json!("maybe"), json!([]), json!({})] {
            assert_eq!(coerce_flag(&bad), None, "{bad}");
        }
    }

    #[test]
    fn test_gender_representations() {
        for male in [json!("male"), json!("M"), json!(" Male "), json!(1)] {
            assert_eq!(coerce_gender(&male), Some(1.0), "{male}");
        }
        for female in [json!("female"), json!("f"), json!("FEMALE"), json!(0)] {
            assert_eq!(coerce_gender(&female), Some(0.0), "{female}");
        }
        for bad in [json!("other"), json!(2), json!(true), json!("yes")] {
            assert_eq!(coerce_gender(&bad), None, "{bad}");
        }
    }

    #[test]
    fn test_invalid_flag_fails_the_field() {
        let input = raw(json!({ "scholarship_holder": "sometimes" }));
        let err = parse_field(&FEATURE_SPECS[7], &input).unwrap_err();

        assert_eq!(err.feature, "Scholarship_holder");
        assert_eq!(err.value, "\"sometimes\"");
    }

    #[test]
    fn test_debtor_spellings_normalize_identically() {
        let scaler = FeatureScaler::identity();
        let mut vectors = Vec::new();

        for debtor in [json!("yes"), json!(1), json!(true)] {
            let mut input = scenario_a();
            input.insert("debtor".to_string(), debtor);
            vectors.push(normalize(&input, &scaler).unwrap().vector);
        }

        assert_eq!(vectors[0], vectors[1]);
        assert_eq!(vectors[1], vectors[2]);
        assert_eq!(vectors[0].get_by_name("Debtor"), Some(1.0));
    }
}
