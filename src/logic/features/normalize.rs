//! Input Normalizer
//!
//! Turns a loosely-typed key/value record into the canonical
//! [`FeatureVector`]. Every field is resolved through [`FEATURE_SPECS`]:
//! first alias present wins, a missing field takes its documented default,
//! and a present-but-unrecognizable value is an error. There is no range
//! validation here; that belongs to the caller.
//!
//! Continuous fields are remapped from the user domain to the training
//! domain before the scaler runs:
//!
//! | field                      | user domain | remap       | model domain |
//! |----------------------------|-------------|-------------|--------------|
//! | average grade              | 0-100 %     | `pct / 5`   | 0-20         |
//! | previous qualification     | 0-100 %     | `pct + 100` | 100-200      |
//! | units approved/eval/enroll | 0-20        | none        | 0-20         |
//! | age                        | years       | none        | years        |

use serde_json::{Map, Value};

use super::layout::{CONTINUOUS_COUNT, FEATURE_COUNT};
use super::vector::FeatureVector;
use crate::logic::model::scaler::FeatureScaler;

/// Caller-owned input record
pub type RawInput = Map<String, Value>;

// ============================================================================
// ALIAS TABLE
// ============================================================================

/// Linear remap from a 0-100 percentage to the training scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradeRemap {
    Divide(f64),
    Offset(f64),
}

impl GradeRemap {
    pub fn apply(&self, pct: f64) -> f64 {
        match *self {
            GradeRemap::Divide(d) => pct / d,
            GradeRemap::Offset(o) => pct + o,
        }
    }
}

/// How a field is coerced and what it defaults to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    /// Taken as-is (units, age)
    Numeric { default: f64 },
    /// 0-100 percentage, remapped to the training scale
    Percentage { default_pct: f64, remap: GradeRemap },
    /// bool / 0|1 / yes-no string
    Flag { default: bool },
    /// male=1, female=0
    Gender,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    /// Canonical model name, same as `FEATURE_LAYOUT[i]`
    pub name: &'static str,
    /// Accepted keys, looked up in order
    pub aliases: &'static [&'static str],
    pub kind: FeatureKind,
}

/// Midpoint used when a percentage-like grade is missing
pub const DEFAULT_GRADE_PERCENT: f64 = 50.0;

/// Gender assumed when none is given
pub const DEFAULT_GENDER: &str = "female";

/// One entry per layout slot, in layout order
pub const FEATURE_SPECS: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec {
        name: "Total_units_approved",
        aliases: &["total_units_approved", "Total_units_approved"],
        kind: FeatureKind::Numeric { default: 0.0 },
    },
    FeatureSpec {
        name: "Average_grade",
        aliases: &["average_grade", "Average_grade"],
        kind: FeatureKind::Percentage {
            default_pct: DEFAULT_GRADE_PERCENT,
            remap: GradeRemap::Divide(5.0),
        },
    },
    FeatureSpec {
        name: "Age_at_enrollment",
        aliases: &["age_at_enrollment", "Age_at_enrollment"],
        kind: FeatureKind::Numeric { default: 0.0 },
    },
    FeatureSpec {
        name: "Total_units_evaluated",
        aliases: &["total_units_evaluated", "Total_units_evaluated"],
        kind: FeatureKind::Numeric { default: 0.0 },
    },
    FeatureSpec {
        name: "Total_units_enrolled",
        aliases: &["total_units_enrolled", "Total_units_enrolled"],
        kind: FeatureKind::Numeric { default: 0.0 },
    },
    FeatureSpec {
        name: "Previous_qualification_(grade)",
        aliases: &["previous_qualification_grade", "Previous_qualification_(grade)"],
        kind: FeatureKind::Percentage {
            default_pct: DEFAULT_GRADE_PERCENT,
            remap: GradeRemap::Offset(100.0),
        },
    },
    FeatureSpec {
        name: "Tuition_fees_up_to_date",
        aliases: &["tuition_fees_up_to_date", "Tuition_fees_up_to_date"],
        kind: FeatureKind::Flag { default: false },
    },
    FeatureSpec {
        name: "Scholarship_holder",
        aliases: &["scholarship_holder", "Scholarship_holder"],
        kind: FeatureKind::Flag { default: false },
    },
    FeatureSpec {
        name: "Debtor",
        aliases: &["debtor", "Debtor"],
        kind: FeatureKind::Flag { default: false },
    },
    FeatureSpec {
        name: "Gender",
        aliases: &["gender", "Gender"],
        kind: FeatureKind::Gender,
    },
];

// ============================================================================
// PARSING
// ============================================================================

/// A value that matched none of the accepted representations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {feature}: {value}")]
pub struct FeatureError {
    pub feature: &'static str,
    pub value: String,
}

impl FeatureError {
    fn new(spec: &FeatureSpec, raw: &Value) -> Self {
        Self {
            feature: spec.name,
            value: raw.to_string(),
        }
    }
}

/// One field after coercion and remap, before scaling
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    /// Value in the training domain
    pub value: f64,
    /// What the caller sent (or the default that was applied)
    pub original: Value,
    pub defaulted: bool,
}

/// First alias with a non-null value
fn lookup<'a>(spec: &FeatureSpec, input: &'a RawInput) -> Option<&'a Value> {
    spec.aliases
        .iter()
        .find_map(|key| input.get(*key).filter(|v| !v.is_null()))
}

fn coerce_number(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// bool, 0/1, or yes/no-like string → 0/1
pub fn coerce_flag(raw: &Value) -> Option<f64> {
    match raw {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Some(1.0),
            Some(v) if v == 0.0 => Some(0.0),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(1.0),
            "no" | "n" | "false" | "0" => Some(0.0),
            _ => None,
        },
        _ => None,
    }
}

/// male/m/1 → 1, female/f/0 → 0
pub fn coerce_gender(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Some(1.0),
            Some(v) if v == 0.0 => Some(0.0),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(1.0),
            "female" | "f" => Some(0.0),
            _ => None,
        },
        _ => None,
    }
}

fn default_field(spec: &FeatureSpec) -> ParsedField {
    let (value, original) = match spec.kind {
        FeatureKind::Numeric { default } => (default, Value::from(default)),
        FeatureKind::Percentage { default_pct, remap } => {
            (remap.apply(default_pct), Value::from(default_pct))
        }
        FeatureKind::Flag { default } => (if default { 1.0 } else { 0.0 }, Value::Bool(default)),
        FeatureKind::Gender => (0.0, Value::String(DEFAULT_GENDER.to_string())),
    };

    ParsedField {
        value,
        original,
        defaulted: true,
    }
}

/// Resolve and coerce a single field
pub fn parse_field(spec: &FeatureSpec, input: &RawInput) -> Result<ParsedField, FeatureError> {
    let Some(raw) = lookup(spec, input) else {
        return Ok(default_field(spec));
    };

    let value = match spec.kind {
        FeatureKind::Numeric { .. } => coerce_number(raw),
        FeatureKind::Percentage { remap, .. } => coerce_number(raw).map(|pct| remap.apply(pct)),
        FeatureKind::Flag { .. } => coerce_flag(raw),
        FeatureKind::Gender => coerce_gender(raw),
    }
    .ok_or_else(|| FeatureError::new(spec, raw))?;

    Ok(ParsedField {
        value,
        original: raw.clone(),
        defaulted: false,
    })
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Output of the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    /// Scaled vector, ready for the classifier
    pub vector: FeatureVector,
    /// Remapped values before scaling
    pub model_values: [f64; FEATURE_COUNT],
    /// Caller's values per slot, for display
    pub originals: Vec<Value>,
}

/// Parse every field without scaling
pub fn parse_input(input: &RawInput) -> Result<(Vec<ParsedField>, [f64; FEATURE_COUNT]), FeatureError> {
    let mut fields = Vec::with_capacity(FEATURE_COUNT);
    let mut model_values = [0.0f64; FEATURE_COUNT];

    for (i, spec) in FEATURE_SPECS.iter().enumerate() {
        let field = parse_field(spec, input)?;
        model_values[i] = field.value;
        fields.push(field);
    }

    Ok((fields, model_values))
}

/// Normalize a raw record: alias resolution, coercion, remap, then scaling of
/// the continuous block only
pub fn normalize(input: &RawInput, scaler: &FeatureScaler) -> Result<NormalizedInput, FeatureError> {
    let (fields, model_values) = parse_input(input)?;

    let mut continuous = [0.0f64; CONTINUOUS_COUNT];
    continuous.copy_from_slice(&model_values[..CONTINUOUS_COUNT]);
    let scaled = scaler.transform(&continuous);

    let mut values = [0.0f32; FEATURE_COUNT];
    for (i, v) in scaled.iter().enumerate() {
        values[i] = *v as f32;
    }
    for i in CONTINUOUS_COUNT..FEATURE_COUNT {
        values[i] = model_values[i] as f32;
    }

    let defaulted: Vec<&str> = FEATURE_SPECS
        .iter()
        .zip(fields.iter())
        .filter(|(_, f)| f.defaulted)
        .map(|(s, _)| s.name)
        .collect();
    if !defaulted.is_empty() {
        log::debug!("Defaults applied for: {}", defaulted.join(", "));
    }

    Ok(NormalizedInput {
        vector: FeatureVector::from_values(values),
        model_values,
        originals: fields.into_iter().map(|f| f.original).collect(),
    })
}
