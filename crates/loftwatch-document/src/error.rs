//! Error types for document providers

use thiserror::Error;

/// Errors raised by document providers and tree queries
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The provider could not be started
    #[error("Failed to launch document provider: {0}")]
    Launch(String),

    /// Navigation to the target failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// HTTP transport error while loading the page
    #[error("HTTP error: {0}")]
    Http(String),

    /// No document has been loaded yet
    #[error("No document loaded")]
    NotLoaded,

    /// The provider has been closed
    #[error("Document provider is closed")]
    Closed,

    /// A selector did not match any node
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

impl From<reqwest::Error> for DocumentError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            DocumentError::Http(format!("HTTP {}: {}", status, e))
        } else {
            DocumentError::Http(e.to_string())
        }
    }
}
