//! HTTP client for the collector endpoint
//!
//! Reports are POSTed as JSON to `{base_url}/api/events/update`. There is no
//! retry: a failed report is returned to the caller, which logs it and moves
//! on.
//!
//! # Examples
//!
//! ```no_run
//! use loftwatch_reporter::ReportingClient;
//!
//! let client = ReportingClient::new("https://collector.example.org").unwrap();
//! assert_eq!(client.endpoint(), "https://collector.example.org/api/events/update");
//! ```

use crate::error::TransportError;
use crate::wire::{DeltaReportBody, InitialReportBody};
use crate::EventReporter;
use async_trait::async_trait;
use loftwatch_domain::{DeltaReport, NormalizedReport};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default collector base URL
pub const DEFAULT_BASE_URL: &str = "https://live.myloft.ro";

/// Path of the update endpoint
pub const UPDATE_PATH: &str = "/api/events/update";

/// Default timeout for a report request (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Sends reports to the collector over HTTP
#[derive(Debug, Clone)]
pub struct ReportingClient {
    endpoint: String,
    client: reqwest::Client,
}

impl ReportingClient {
    /// Create a client for the collector at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Other`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), UPDATE_PATH),
            client,
        })
    }

    /// Full URL reports are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B: Serialize + Sync>(&self, body: &B) -> Result<(), TransportError> {
        let response = self.client.post(&self.endpoint).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        debug!("Collector accepted report (HTTP {})", status.as_u16());
        Ok(())
    }
}

#[async_trait]
impl EventReporter for ReportingClient {
    async fn send_initial(&self, report: &NormalizedReport) -> Result<(), TransportError> {
        self.post(&InitialReportBody::from(report)).await
    }

    async fn send_delta(&self, delta: &DeltaReport) -> Result<(), TransportError> {
        self.post(&DeltaReportBody::from(delta)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = ReportingClient::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8000/api/events/update");
    }

    #[test]
    fn test_default_base_url() {
        let client = ReportingClient::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(client.endpoint(), "https://live.myloft.ro/api/events/update");
    }

    #[tokio::test]
    async fn test_unreachable_collector() {
        // Nothing listens on port 9 locally
        let client = ReportingClient::new("http://127.0.0.1:9").unwrap();
        let result = client.send_delta(&DeltaReport::new("1/2")).await;
        assert!(matches!(
            result,
            Err(TransportError::Connect(_)) | Err(TransportError::Other(_))
        ));
    }
}
