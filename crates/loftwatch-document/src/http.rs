//! Provider that loads the page over HTTP and re-polls it
//!
//! Suitable for server-rendered pages. Content rendered by client-side
//! scripts is not visible to this provider.

use crate::error::DocumentError;
use crate::mutation::{ChangeKinds, MutationBatch, NodeContent};
use crate::observer::ObserverRegistry;
use crate::provider::{DocumentProvider, ProviderFactory, ReadyPolicy};
use crate::selector::NodeSelector;
use crate::tree::DocumentView;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default interval between page refreshes (2 seconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default timeout for a page fetch (30 seconds)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Default)]
struct HttpState {
    document: Option<DocumentView>,
    observers: ObserverRegistry,
}

/// Document provider backed by periodic HTTP fetches
///
/// After [`DocumentProvider::navigate`] a background task re-fetches the
/// page every poll interval, replaces the document and delivers mutation
/// batches for observed nodes. [`DocumentProvider::close`] stops the task.
pub struct HttpDocumentProvider {
    client: reqwest::Client,
    poll_interval: Duration,
    state: Arc<Mutex<HttpState>>,
    poller: Option<JoinHandle<()>>,
}

impl HttpDocumentProvider {
    /// Create a provider using `client` and refreshing every `poll_interval`
    pub fn new(client: reqwest::Client, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            state: Arc::new(Mutex::new(HttpState::default())),
            poller: None,
        }
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }
}

async fn fetch_document(client: &reqwest::Client, url: &str) -> Result<DocumentView, DocumentError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    Ok(DocumentView::parse_html(&body))
}

async fn poll_loop(
    client: reqwest::Client,
    url: String,
    interval: Duration,
    state: Arc<Mutex<HttpState>>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; the page was just loaded.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match fetch_document(&client, &url).await {
            Ok(document) => {
                let mut guard = state.lock().await;
                let HttpState { observers, .. } = &mut *guard;
                let delivered = observers.dispatch(&document).await;
                if delivered > 0 {
                    debug!("Refresh of {} delivered {} mutation batches", url, delivered);
                }
                guard.document = Some(document);
            }
            Err(e) => {
                warn!("Refresh of {} failed: {}", url, e);
            }
        }
    }
}

#[async_trait]
impl DocumentProvider for HttpDocumentProvider {
    async fn navigate(&mut self, url: &str, policy: ReadyPolicy) -> Result<(), DocumentError> {
        info!("Loading {} ({:?})", url, policy);
        self.stop_polling();

        let document = fetch_document(&self.client, url)
            .await
            .map_err(|e| DocumentError::Navigation(e.to_string()))?;
        {
            let mut state = self.state.lock().await;
            state.observers.clear();
            state.document = Some(document);
        }

        self.poller = Some(tokio::spawn(poll_loop(
            self.client.clone(),
            url.to_string(),
            self.poll_interval,
            Arc::clone(&self.state),
        )));
        Ok(())
    }

    async fn evaluate<T, F>(&self, query: F) -> Result<T, DocumentError>
    where
        F: FnOnce(&DocumentView) -> T + Send,
        T: Send,
    {
        let state = self.state.lock().await;
        let document = state.document.as_ref().ok_or(DocumentError::NotLoaded)?;
        Ok(query(document))
    }

    async fn observe(
        &mut self,
        selector: NodeSelector,
        kinds: ChangeKinds,
        callback: mpsc::Sender<MutationBatch>,
    ) -> Result<NodeContent, DocumentError> {
        let mut state = self.state.lock().await;
        let HttpState { document, observers } = &mut *state;
        let document = document.as_ref().ok_or(DocumentError::NotLoaded)?;
        observers.register(document, selector, kinds, callback)
    }

    async fn close(&mut self) -> Result<(), DocumentError> {
        self.stop_polling();
        let mut state = self.state.lock().await;
        state.observers.clear();
        state.document = None;
        Ok(())
    }
}

impl Drop for HttpDocumentProvider {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

/// Opens [`HttpDocumentProvider`]s sharing one HTTP client
#[derive(Clone)]
pub struct HttpProviderFactory {
    client: reqwest::Client,
    poll_interval: Duration,
}

impl HttpProviderFactory {
    /// Create a factory with the given refresh interval
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Launch`] if the HTTP client cannot be built.
    pub fn new(poll_interval: Duration) -> Result<Self, DocumentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
            .user_agent(concat!("loftwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DocumentError::Launch(e.to_string()))?;
        Ok(Self { client, poll_interval })
    }

    /// Refresh interval handed to every provider
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[async_trait]
impl ProviderFactory for HttpProviderFactory {
    type Provider = HttpDocumentProvider;

    async fn open(&self) -> Result<HttpDocumentProvider, DocumentError> {
        Ok(HttpDocumentProvider::new(self.client.clone(), self.poll_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = HttpProviderFactory::new(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)).unwrap();
        assert_eq!(factory.poll_interval(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_evaluate_before_navigate() {
        let factory = HttpProviderFactory::new(Duration::from_secs(1)).unwrap();
        let provider = factory.open().await.unwrap();
        let result = provider.evaluate(|doc| doc.len()).await;
        assert!(matches!(result, Err(DocumentError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_navigation_error() {
        // Nothing listens on port 9 locally
        let factory = HttpProviderFactory::new(Duration::from_secs(1)).unwrap();
        let mut provider = factory.open().await.unwrap();
        let result = provider.navigate("http://127.0.0.1:9/", ReadyPolicy::Load).await;
        assert!(matches!(result, Err(DocumentError::Navigation(_))));
        provider.close().await.unwrap();
    }
}
