//! Error types for the watcher

use crate::config::ConfigError;
use loftwatch_document::DocumentError;
use loftwatch_domain::LifecycleError;
use loftwatch_extractor::ExtractorError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a watcher session, or the watcher itself
///
/// Inside a session every variant leads to a restart. Only failures to
/// start (invalid configuration, no document provider) stop the process.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The readiness predicate did not hold before the timeout
    #[error("Page not ready after {0:?}")]
    ReadinessTimeout(Duration),

    /// The mandatory watched field is not on the page
    #[error("Required field missing: {0}")]
    ExtractionFieldMissing(String),

    /// Document provider failure
    #[error("Document provider error: {0}")]
    Provider(#[from] DocumentError),

    /// The provider stopped delivering mutation batches
    #[error("Observation stream closed")]
    ObservationClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Illegal lifecycle transition
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<ExtractorError> for WatcherError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::FieldMissing(field) => WatcherError::ExtractionFieldMissing(field),
            ExtractorError::Config(msg) => WatcherError::Config(ConfigError::Invalid(msg)),
        }
    }
}
