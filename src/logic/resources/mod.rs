//! Resources Module - Process-lifetime artifacts
//!
//! `artifacts` knows how to load, `cache` makes sure it happens once.

pub mod artifacts;
pub mod cache;

pub use artifacts::{ArtifactSource, BackgroundSample, FileArtifacts};
pub use cache::ResourceCache;
