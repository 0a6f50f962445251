//! Metrics collection for watcher operations

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the worker, its sessions and their report dispatchers
#[derive(Debug, Default)]
pub struct WatcherMetrics {
    sessions_started: AtomicU64,
    sessions_completed: AtomicU64,
    sessions_failed: AtomicU64,
    changes_detected: AtomicU64,
    reports_sent: AtomicU64,
    reports_failed: AtomicU64,
    reports_dropped: AtomicU64,
}

impl WatcherMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session start
    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session that ran out its budget
    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session that ended with an error
    pub fn record_session_failed(&self) {
        self.sessions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a detected change
    pub fn record_change(&self) {
        self.changes_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a report the collector accepted
    pub fn record_report_sent(&self) {
        self.reports_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a report that failed in transport
    pub fn record_report_failed(&self) {
        self.reports_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a report dropped before sending
    pub fn record_report_dropped(&self) {
        self.reports_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Sessions started
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    /// Sessions that ran out their budget
    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed.load(Ordering::Relaxed)
    }

    /// Sessions that ended with an error
    pub fn sessions_failed(&self) -> u64 {
        self.sessions_failed.load(Ordering::Relaxed)
    }

    /// Changes detected across all sessions
    pub fn changes_detected(&self) -> u64 {
        self.changes_detected.load(Ordering::Relaxed)
    }

    /// Reports the collector accepted
    pub fn reports_sent(&self) -> u64 {
        self.reports_sent.load(Ordering::Relaxed)
    }

    /// Reports that failed in transport
    pub fn reports_failed(&self) -> u64 {
        self.reports_failed.load(Ordering::Relaxed)
    }

    /// Reports dropped before sending
    pub fn reports_dropped(&self) -> u64 {
        self.reports_dropped.load(Ordering::Relaxed)
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Watcher Metrics Summary".to_string(),
            "=======================".to_string(),
            format!(
                "Sessions: {} started, {} completed, {} failed",
                self.sessions_started(),
                self.sessions_completed(),
                self.sessions_failed()
            ),
            format!("Changes detected: {}", self.changes_detected()),
            format!(
                "Reports: {} sent, {} failed, {} dropped",
                self.reports_sent(),
                self.reports_failed(),
                self.reports_dropped()
            ),
        ]
        .join("\n")
    }
}
