//! Features Module - Student Feature Schema & Input Normalization
//!
//! `layout` fixes the slot order, `vector` carries values in that order,
//! `normalize` maps loosely-typed caller input onto it.

pub mod layout;
pub mod normalize;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{
    feature_index, feature_name, LayoutInfo, LayoutMismatchError, CONTINUOUS_COUNT,
    FEATURE_COUNT, FEATURE_LAYOUT,
};
pub use normalize::{normalize, FeatureError, NormalizedInput, RawInput, FEATURE_SPECS};
pub use vector::FeatureVector;
