//! In-memory provider driven by the caller

use crate::error::DocumentError;
use crate::mutation::{ChangeKinds, MutationBatch, NodeContent};
use crate::observer::ObserverRegistry;
use crate::provider::{DocumentProvider, ProviderFactory, ReadyPolicy};
use crate::selector::NodeSelector;
use crate::tree::DocumentView;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[derive(Default)]
struct ScriptedState {
    document: Option<DocumentView>,
    observers: ObserverRegistry,
    navigations: Vec<String>,
    clicks: Vec<NodeSelector>,
    evaluations: usize,
    closed: bool,
    fail_navigation: bool,
}

/// Provider whose document is set by the caller
///
/// Clones share state, so a test can keep a handle while a session owns
/// another and drive the page by replacing its document. Every replacement
/// is diffed against the observed nodes and delivered as mutation batches.
///
/// # Examples
///
/// ```
/// use loftwatch_document::{DocumentProvider, ReadyPolicy, ScriptedProvider};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut provider = ScriptedProvider::with_html("<table><tbody><tr><td>1</td></tr></tbody></table>");
/// provider.navigate("http://example.org", ReadyPolicy::Load).await.unwrap();
/// let rows = provider
///     .evaluate(|doc| doc.first_by_tag("tbody").map(|t| doc.count_descendants_by_tag(t, "tr")))
///     .await
///     .unwrap();
/// assert_eq!(rows, Some(1));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedProvider {
    /// Create a provider with no document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider serving the given HTML
    pub fn with_html(html: &str) -> Self {
        let state = ScriptedState {
            document: Some(DocumentView::parse_html(html)),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Make every subsequent navigation fail
    pub async fn fail_navigation(&self, fail: bool) {
        self.state.lock().await.fail_navigation = fail;
    }

    /// Replace the document with parsed HTML and notify observers
    pub async fn set_html(&self, html: &str) -> usize {
        self.set_document(DocumentView::parse_html(html)).await
    }

    /// Replace the document and notify observers
    ///
    /// Returns the number of mutation batches delivered.
    pub async fn set_document(&self, document: DocumentView) -> usize {
        let mut state = self.state.lock().await;
        let ScriptedState { observers, .. } = &mut *state;
        let delivered = observers.dispatch(&document).await;
        state.document = Some(document);
        delivered
    }

    /// URLs navigated to, in order
    pub async fn navigations(&self) -> Vec<String> {
        self.state.lock().await.navigations.clone()
    }

    /// Selectors clicked, in order
    pub async fn clicks(&self) -> Vec<NodeSelector> {
        self.state.lock().await.clicks.clone()
    }

    /// Number of queries evaluated
    pub async fn evaluations(&self) -> usize {
        self.state.lock().await.evaluations
    }

    /// Number of live observers
    pub async fn observer_count(&self) -> usize {
        self.state.lock().await.observers.len()
    }

    /// Whether the provider has been closed
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    async fn reopen(&self) {
        let mut state = self.state.lock().await;
        state.closed = false;
        state.observers.clear();
    }
}

#[async_trait]
impl DocumentProvider for ScriptedProvider {
    async fn navigate(&mut self, url: &str, _policy: ReadyPolicy) -> Result<(), DocumentError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(DocumentError::Closed);
        }
        state.navigations.push(url.to_string());
        if state.fail_navigation {
            return Err(DocumentError::Navigation(format!("scripted failure for {}", url)));
        }
        if state.document.is_none() {
            state.document = Some(DocumentView::empty());
        }
        Ok(())
    }

    async fn evaluate<T, F>(&self, query: F) -> Result<T, DocumentError>
    where
        F: FnOnce(&DocumentView) -> T + Send,
        T: Send,
    {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(DocumentError::Closed);
        }
        state.evaluations += 1;
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
        if state.closed {
            return Err(DocumentError::Closed);
        }
        let ScriptedState { document, observers, .. } = &mut *state;
        let document = document.as_ref().ok_or(DocumentError::NotLoaded)?;
        observers.register(document, selector, kinds, callback)
    }

    async fn click(&mut self, selector: &NodeSelector) -> Result<bool, DocumentError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(DocumentError::Closed);
        }
        let found = state
            .document
            .as_ref()
            .and_then(|doc| selector.resolve(doc))
            .is_some();
        if !found {
            return Err(DocumentError::NodeNotFound(selector.to_string()));
        }
        state.clicks.push(selector.clone());
        Ok(true)
    }

    async fn close(&mut self) -> Result<(), DocumentError> {
        let mut state = self.state.lock().await;
        state.observers.clear();
        state.closed = true;
        Ok(())
    }
}

/// Factory handing out handles to one shared [`ScriptedProvider`]
///
/// Each `open` reopens the shared provider and drops any observers left by
/// the previous session.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    provider: ScriptedProvider,
    opened: Arc<AtomicUsize>,
    fail_open: bool,
}

impl ScriptedFactory {
    /// Factory over the given provider
    pub fn new(provider: ScriptedProvider) -> Self {
        Self {
            provider,
            opened: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    /// Factory whose `open` always fails
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Number of providers opened so far
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Handle to the shared provider
    pub fn provider(&self) -> &ScriptedProvider {
        &self.provider
    }
}

#[async_trait]
impl ProviderFactory for ScriptedFactory {
    type Provider = ScriptedProvider;

    async fn open(&self) -> Result<ScriptedProvider, DocumentError> {
        if self.fail_open {
            return Err(DocumentError::Launch("scripted launch failure".to_string()));
        }
        self.provider.reopen().await;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.provider.clone())
    }
}
