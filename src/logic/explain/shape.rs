//! Attribution Shape Normalization
//!
//! Attribution backends disagree on what they hand back: a list with one
//! array per class, a single 2-D array, or a flat 1-D vector. Everything is
//! folded into one canonical `rows × features × classes` array before any
//! value is read out of it.

use ndarray::{stack, Array1, Array2, Array3, ArrayD, Axis, Ix1, Ix2};

use crate::logic::error::ExplanationError;

/// What an attribution backend returned, before interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttribution {
    /// One array per output class
    PerClass(Vec<ArrayD<f64>>),
    /// A single array for whatever the model emitted
    Array(ArrayD<f64>),
}

/// Recognized layouts
#[derive(Debug, Clone, PartialEq)]
pub enum AttributionShape {
    /// (dropout, graduate), each rows × features
    ClassPair(Array2<f64>, Array2<f64>),
    /// rows × features, one class
    Single(Array2<f64>),
    /// features, one row and one class
    Flat(Array1<f64>),
}

fn unrecognized(detail: String) -> ExplanationError {
    ExplanationError::Unavailable(format!("unrecognized attribution shape: {}", detail))
}

/// Per-class arrays may come as rows × features or as a bare feature vector
fn as_rows(array: ArrayD<f64>) -> Result<Array2<f64>, ExplanationError> {
    let shape = array.shape().to_vec();
    match array.ndim() {
        2 => array
            .into_dimensionality::<Ix2>()
            .map_err(|e| unrecognized(e.to_string())),
        1 => array
            .into_dimensionality::<Ix1>()
            .map(|v| v.insert_axis(Axis(0)))
            .map_err(|e| unrecognized(e.to_string())),
        _ => Err(unrecognized(format!("per-class array of shape {:?}", shape))),
    }
}

/// Recognize one of the three layouts; anything else is an error, never a guess
pub fn classify(raw: RawAttribution) -> Result<AttributionShape, ExplanationError> {
    let shape = match raw {
        RawAttribution::PerClass(arrays) => {
            if arrays.len() != 2 {
                return Err(unrecognized(format!("{} per-class arrays", arrays.len())));
            }
            let mut it = arrays.into_iter();
            let (Some(first), Some(second)) = (it.next(), it.next()) else {
                return Err(unrecognized("missing per-class array".to_string()));
            };
            let dropout = as_rows(first)?;
            let graduate = as_rows(second)?;
            if dropout.dim() != graduate.dim() {
                return Err(unrecognized(format!(
                    "per-class arrays disagree: {:?} vs {:?}",
                    dropout.dim(),
                    graduate.dim()
                )));
            }
            AttributionShape::ClassPair(dropout, graduate)
        }
        RawAttribution::Array(array) => match array.ndim() {
            2 => AttributionShape::Single(
                array
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| unrecognized(e.to_string()))?,
            ),
            1 => AttributionShape::Flat(
                array
                    .into_dimensionality::<Ix1>()
                    .map_err(|e| unrecognized(e.to_string()))?,
            ),
            n => return Err(unrecognized(format!("{}-dimensional array", n))),
        },
    };

    let (rows, features) = shape.dims();
    if rows == 0 || features == 0 {
        return Err(unrecognized(format!("empty array ({} x {})", rows, features)));
    }

    Ok(shape)
}

impl AttributionShape {
    /// (rows, features)
    pub fn dims(&self) -> (usize, usize) {
        match self {
            AttributionShape::ClassPair(a, _) | AttributionShape::Single(a) => a.dim(),
            AttributionShape::Flat(v) => (1, v.len()),
        }
    }

    pub fn class_count(&self) -> usize {
        match self {
            AttributionShape::ClassPair(..) => 2,
            AttributionShape::Single(_) | AttributionShape::Flat(_) => 1,
        }
    }

    /// rows × features × classes
    pub fn to_canonical(&self) -> Result<Array3<f64>, ExplanationError> {
        match self {
            AttributionShape::ClassPair(dropout, graduate) => {
                stack(Axis(2), &[dropout.view(), graduate.view()])
                    .map_err(|e| unrecognized(e.to_string()))
            }
            AttributionShape::Single(a) => Ok(a.clone().insert_axis(Axis(2))),
            AttributionShape::Flat(v) => {
                Ok(v.clone().insert_axis(Axis(0)).insert_axis(Axis(2)))
            }
        }
    }
}

/// Classify then canonicalize
pub fn canonicalize(raw: RawAttribution) -> Result<Array3<f64>, ExplanationError> {
    classify(raw)?.to_canonical()
}
