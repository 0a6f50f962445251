//! Loftwatch Reporter
//!
//! Delivers the initial report and every delta report to the collector.
//!
//! # Delivery
//!
//! Delivery is at-most-once and best effort: no retries, no idempotency
//! key, no authentication. Callers log a [`TransportError`] and carry on.
//!
//! # Reporters
//!
//! - [`ReportingClient`]: HTTP POST to `{base_url}/api/events/update`
//! - [`MockReporter`]: Records reports in memory for testing
//!
//! # Examples
//!
//! ```
//! use loftwatch_reporter::{EventReporter, MockReporter, SentReport};
//! use loftwatch_domain::DeltaReport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let reporter = MockReporter::new();
//! reporter.send_delta(&DeltaReport::new("41/85")).await.unwrap();
//! assert_eq!(reporter.sent(), vec![SentReport::Delta(DeltaReport::new("41/85"))]);
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
mod error;
pub mod wire;

use async_trait::async_trait;
use loftwatch_domain::{DeltaReport, NormalizedReport};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use client::ReportingClient;
pub use error::TransportError;
pub use wire::{DeltaReportBody, InitialReportBody};

/// Destination of watcher reports
#[async_trait]
pub trait EventReporter: Send + Sync + 'static {
    /// Send the initial report of a session
    async fn send_initial(&self, report: &NormalizedReport) -> Result<(), TransportError>;

    /// Send an incremental report for a changed field
    async fn send_delta(&self, delta: &DeltaReport) -> Result<(), TransportError>;
}

#[async_trait]
impl<R: EventReporter> EventReporter for Arc<R> {
    async fn send_initial(&self, report: &NormalizedReport) -> Result<(), TransportError> {
        (**self).send_initial(report).await
    }

    async fn send_delta(&self, delta: &DeltaReport) -> Result<(), TransportError> {
        (**self).send_delta(delta).await
    }
}

/// A report recorded by [`MockReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentReport {
    /// Initial report
    Initial(NormalizedReport),
    /// Delta report
    Delta(DeltaReport),
}

/// In-memory reporter for deterministic testing
///
/// Records every report it is asked to send, including failed ones, which
/// are listed by [`MockReporter::attempts`] but not by [`MockReporter::sent`].
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MockReporter {
    sent: Arc<Mutex<Vec<SentReport>>>,
    attempts: Arc<Mutex<usize>>,
    failure: Option<TransportError>,
    delay: Option<Duration>,
}

impl MockReporter {
    /// Create a reporter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reporter that fails every send with `error`
    pub fn failing(error: TransportError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Wait `delay` before completing each send
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reports delivered successfully, in order
    pub fn sent(&self) -> Vec<SentReport> {
        self.sent.lock().unwrap().clone()
    }

    /// Delta values delivered successfully, in order
    pub fn delta_values(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|r| match r {
                SentReport::Delta(d) => Some(d.value),
                SentReport::Initial(_) => None,
            })
            .collect()
    }

    /// Initial reports delivered successfully, in order
    pub fn initial_reports(&self) -> Vec<NormalizedReport> {
        self.sent()
            .into_iter()
            .filter_map(|r| match r {
                SentReport::Initial(report) => Some(report),
                SentReport::Delta(_) => None,
            })
            .collect()
    }

    /// Number of send calls, successful or not
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    async fn record(&self, report: SentReport) -> Result<(), TransportError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sent.lock().unwrap().push(report);
        Ok(())
    }
}

#[async_trait]
impl EventReporter for MockReporter {
    async fn send_initial(&self, report: &NormalizedReport) -> Result<(), TransportError> {
        self.record(SentReport::Initial(report.clone())).await
    }

    async fn send_delta(&self, delta: &DeltaReport) -> Result<(), TransportError> {
        self.record(SentReport::Delta(delta.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> NormalizedReport {
        NormalizedReport {
            url: "https://live.example.org/e/1".to_string(),
            title: None,
            date_time_utc: None,
            distance_km: Some(12),
            location: None,
            total_count: Some("85".to_string()),
        }
    }

    #[tokio::test]
    async fn test_mock_records_in_order() {
        let reporter = MockReporter::new();
        reporter.send_initial(&report()).await.unwrap();
        reporter.send_delta(&DeltaReport::new("41/85")).await.unwrap();
        reporter.send_delta(&DeltaReport::new("42/85")).await.unwrap();

        assert_eq!(reporter.initial_reports(), vec![report()]);
        assert_eq!(reporter.delta_values(), vec!["41/85", "42/85"]);
        assert_eq!(reporter.attempts(), 3);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let reporter = MockReporter::failing(TransportError::Status(503));
        let result = reporter.send_delta(&DeltaReport::new("1/2")).await;
        assert_eq!(result, Err(TransportError::Status(503)));
        assert!(reporter.sent().is_empty());
        assert_eq!(reporter.attempts(), 1);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_record() {
        let reporter = MockReporter::new();
        let shared = Arc::new(reporter.clone());
        shared.send_delta(&DeltaReport::new("5/9")).await.unwrap();
        assert_eq!(reporter.delta_values(), vec!["5/9"]);
    }
}
