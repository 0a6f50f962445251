//! Report payloads sent to the collector

use crate::MonitorTarget;

/// Typed payload of the initial report
///
/// Derived deterministically from an [`crate::ExtractedSnapshot`]; any field
/// that could not be extracted or parsed is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReport {
    /// Monitored URL
    pub url: String,
    /// Event title
    pub title: Option<String>,
    /// UTC timestamp formatted `DD.MM.YYYY HH:mm:ss`
    pub date_time_utc: Option<String>,
    /// Distance in kilometres
    pub distance_km: Option<u32>,
    /// Release location
    pub location: Option<String>,
    /// Second component of the arrivals counter
    pub total_count: Option<String>,
}

impl NormalizedReport {
    /// An empty report for the given target
    pub fn empty(target: &MonitorTarget) -> Self {
        Self {
            url: target.url().to_string(),
            title: None,
            date_time_utc: None,
            distance_km: None,
            location: None,
            total_count: None,
        }
    }
}

/// Incremental update sent when a watched field changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaReport {
    /// New resolved text of the watched field
    pub value: String,
}

impl DeltaReport {
    /// Create a delta report
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}
