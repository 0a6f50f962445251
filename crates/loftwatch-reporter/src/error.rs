//! Error types for report delivery

use thiserror::Error;

/// Failure to deliver a report to the collector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The collector could not be reached
    #[error("Connection error: {0}")]
    Connect(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The collector answered with a non-success status
    #[error("Collector returned HTTP {0}")]
    Status(u16),

    /// The payload could not be encoded
    #[error("Failed to encode report: {0}")]
    Encode(String),

    /// Any other transport failure
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Whether the collector itself rejected the report
    pub fn is_rejection(&self) -> bool {
        matches!(self, TransportError::Status(code) if (400..500).contains(code))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else if e.is_builder() || e.is_body() {
            TransportError::Encode(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}
