//! Trait definitions for document providers
//!
//! These traits define the boundary between the watcher and the engine that
//! renders the monitored page.

use crate::error::DocumentError;
use crate::mutation::{ChangeKinds, MutationBatch, NodeContent};
use crate::selector::NodeSelector;
use crate::tree::DocumentView;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// When navigation is considered complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyPolicy {
    /// The document has been received and parsed
    Load,
    /// Network activity has settled after load
    #[default]
    NetworkIdle,
}

/// A live, query-able, mutation-observable document
///
/// A provider is exclusively owned by one watcher session and is closed when
/// that session ends.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Load `url` and wait until `policy` is satisfied
    async fn navigate(&mut self, url: &str, policy: ReadyPolicy) -> Result<(), DocumentError>;

    /// Run a read-only query against the current document
    async fn evaluate<T, F>(&self, query: F) -> Result<T, DocumentError>
    where
        F: FnOnce(&DocumentView) -> T + Send,
        T: Send;

    /// Deliver changes of the node named by `selector` to `callback`
    ///
    /// The sender is the in-process counterpart of a callback exposed to the
    /// page: the provider publishes one [`MutationBatch`] per coalesced group
    /// of changes and the caller consumes them from the receiving half.
    ///
    /// Returns the node's content read under the same lock that installs the
    /// observer. Callers must compare later batches against it rather than
    /// against a separate read.
    async fn observe(
        &mut self,
        selector: NodeSelector,
        kinds: ChangeKinds,
        callback: mpsc::Sender<MutationBatch>,
    ) -> Result<NodeContent, DocumentError>;

    /// Click the element named by `selector`
    ///
    /// Returns `Ok(false)` when the provider cannot interact with the page.
    async fn click(&mut self, selector: &NodeSelector) -> Result<bool, DocumentError> {
        let _ = selector;
        Ok(false)
    }

    /// Release the document and stop delivering mutations
    async fn close(&mut self) -> Result<(), DocumentError>;
}

/// Opens a fresh provider for each watcher session
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Provider type produced by this factory
    type Provider: DocumentProvider;

    /// Acquire a new provider session
    async fn open(&self) -> Result<Self::Provider, DocumentError>;
}
