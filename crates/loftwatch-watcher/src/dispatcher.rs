//! Per-session delivery of outbound reports
//!
//! The session enqueues reports without waiting on the network; a
//! background task sends them in order and logs each outcome.

use crate::metrics::WatcherMetrics;
use loftwatch_domain::{DeltaReport, NormalizedReport};
use loftwatch_reporter::EventReporter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A report waiting to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundReport {
    /// Initial report of a session
    Initial(NormalizedReport),
    /// Changed watched field
    Delta(DeltaReport),
}

impl OutboundReport {
    fn kind(&self) -> &'static str {
        match self {
            OutboundReport::Initial(_) => "initial report",
            OutboundReport::Delta(_) => "delta report",
        }
    }
}

/// Bounded report queue drained by a background task
///
/// Delivery is at-most-once: a report is dropped with a warning when the
/// queue is full, and a failed send is logged and not retried.
pub struct ReportDispatcher {
    queue: mpsc::Sender<OutboundReport>,
    task: JoinHandle<()>,
    metrics: Arc<WatcherMetrics>,
}

impl ReportDispatcher {
    /// Start a dispatcher sending through `reporter`
    pub fn spawn<R: EventReporter>(reporter: Arc<R>, capacity: usize, metrics: Arc<WatcherMetrics>) -> Self {
        let (queue, pending) = mpsc::channel(capacity);
        let task = tokio::spawn(deliver(reporter, pending, Arc::clone(&metrics)));
        Self { queue, task, metrics }
    }

    /// Queue a report without waiting for it to be sent
    ///
    /// Returns `false` if the report was dropped.
    pub fn enqueue(&self, report: OutboundReport) -> bool {
        match self.queue.try_send(report) {
            Ok(()) => true,
            Err(TrySendError::Full(report)) => {
                warn!("Report queue full, dropping {}", report.kind());
                self.metrics.record_report_dropped();
                false
            }
            Err(TrySendError::Closed(report)) => {
                warn!("Report dispatcher stopped, dropping {}", report.kind());
                self.metrics.record_report_dropped();
                false
            }
        }
    }

    /// Stop accepting reports and wait up to `grace` for queued ones
    ///
    /// Reports still pending after `grace` are abandoned.
    pub async fn shutdown(self, grace: Duration) {
        let Self { queue, mut task, .. } = self;
        drop(queue);

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Report dispatcher task failed: {}", e),
            Err(_) => {
                warn!("Pending reports not delivered within {:?}, abandoning them", grace);
                task.abort();
            }
        }
    }
}

async fn deliver<R: EventReporter>(
    reporter: Arc<R>,
    mut pending: mpsc::Receiver<OutboundReport>,
    metrics: Arc<WatcherMetrics>,
) {
    while let Some(report) = pending.recv().await {
        let result = match &report {
            OutboundReport::Initial(initial) => reporter.send_initial(initial).await,
            OutboundReport::Delta(delta) => reporter.send_delta(delta).await,
        };

        match (result, &report) {
            (Ok(()), OutboundReport::Initial(_)) => {
                metrics.record_report_sent();
                info!("Initial report sent");
            }
            (Ok(()), OutboundReport::Delta(delta)) => {
                metrics.record_report_sent();
                info!("Sent new arrivals value: {}", delta.value);
            }
            (Err(e), _) if e.is_rejection() => {
                metrics.record_report_failed();
                error!("Collector rejected {}: {}", report.kind(), e);
            }
            (Err(e), _) => {
                metrics.record_report_failed();
                warn!("Failed to send {}: {}", report.kind(), e);
            }
        }
    }
}
