//! Resource Cache
//!
//! Holds the three read-only artifacts for the life of the process. Each
//! cell is initialized at most once: concurrent first callers block on the
//! cell while one of them loads, and whatever that load returned (the
//! artifact or its failure) is what every later caller gets. A failed load
//! is never retried behind the caller's back.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::artifacts::{ArtifactSource, BackgroundSample};
use crate::logic::error::ResourceError;
use crate::logic::model::{Classifier, FeatureScaler};

type Slot<T> = OnceCell<Result<Arc<T>, ResourceError>>;

pub struct ResourceCache {
    source: Box<dyn ArtifactSource>,
    classifier: Slot<dyn Classifier>,
    scaler: Slot<FeatureScaler>,
    background: Slot<BackgroundSample>,
}

fn logged<T>(result: Result<T, ResourceError>, what: &str) -> Result<T, ResourceError> {
    match &result {
        Ok(_) => log::info!("{} ready", what),
        Err(e) => log::error!("{} failed to load: {}", what, e),
    }
    result
}

impl ResourceCache {
    pub fn new(source: impl ArtifactSource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn ArtifactSource>) -> Self {
        log::debug!("Resource cache over {}", source.describe());
        Self {
            source,
            classifier: OnceCell::new(),
            scaler: OnceCell::new(),
            background: OnceCell::new(),
        }
    }

    pub fn get_classifier(&self) -> Result<Arc<dyn Classifier>, ResourceError> {
        self.classifier
            .get_or_init(|| logged(self.source.load_classifier(), "Classifier"))
            .clone()
    }

    pub fn get_scaler(&self) -> Result<Arc<FeatureScaler>, ResourceError> {
        self.scaler
            .get_or_init(|| logged(self.source.load_scaler().map(Arc::new), "Scaler"))
            .clone()
    }

    pub fn get_background_sample(&self) -> Result<Arc<BackgroundSample>, ResourceError> {
        self.background
            .get_or_init(|| logged(self.source.load_background().map(Arc::new), "Background sample"))
            .clone()
    }

    /// True once the classifier has loaded successfully; never triggers a load
    pub fn is_classifier_loaded(&self) -> bool {
        matches!(self.classifier.get(), Some(Ok(_)))
    }

    /// Name of the loaded classifier, "None" otherwise
    pub fn classifier_name(&self) -> String {
        match self.classifier.get() {
            Some(Ok(classifier)) => classifier.name().to_string(),
            _ => "None".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::error::Artifact;
    use crate::logic::testing::InMemoryArtifacts;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_returns_same_instance() {
        let artifacts = InMemoryArtifacts::healthy();
        let counters = artifacts.counters();
        let cache = ResourceCache::new(artifacts);

        let a = cache.get_scaler().unwrap();
        let b = cache.get_scaler().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c1 = cache.get_classifier().unwrap();
        let c2 = cache.get_classifier().unwrap();
        assert!(Arc::ptr_eq(&c1, &c2));

        assert_eq!(counters.scaler.load(Ordering::SeqCst), 1);
        assert_eq!(counters.classifier.load(Ordering::SeqCst), 1);
        assert_eq!(counters.background.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_first_calls_load_once() {
        let artifacts = InMemoryArtifacts::healthy().with_load_delay_ms(20);
        let counters = artifacts.counters();
        let cache = ResourceCache::new(artifacts);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert!(cache.get_background_sample().is_ok());
                    assert!(cache.get_classifier().is_ok());
                });
            }
        });

        assert_eq!(counters.background.load(Ordering::SeqCst), 1);
        assert_eq!(counters.classifier.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_is_sticky_and_identical() {
        let artifacts = InMemoryArtifacts::healthy().with_corrupt_scaler();
        let counters = artifacts.counters();
        let cache = ResourceCache::new(artifacts);

        let first = cache.get_scaler().unwrap_err();
        let second = cache.get_scaler().unwrap_err();

        assert_eq!(first, second);
        assert_eq!(first.artifact, Artifact::Scaler);
        assert_eq!(counters.scaler.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_loaded_flag_does_not_trigger_load() {
        let artifacts = InMemoryArtifacts::healthy();
        let counters = artifacts.counters();
        let cache = ResourceCache::new(artifacts);

        assert!(!cache.is_classifier_loaded());
        assert_eq!(cache.classifier_name(), "None");
        assert_eq!(counters.classifier.load(Ordering::SeqCst), 0);

        cache.get_classifier().unwrap();
        assert!(cache.is_classifier_loaded());
        assert_eq!(cache.classifier_name(), "logistic");
    }
}
