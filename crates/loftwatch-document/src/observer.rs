//! Observer bookkeeping shared by providers

use crate::error::DocumentError;
use crate::mutation::{ChangeKinds, MutationBatch, MutationKind, MutationRecord, NodeContent, NodeFingerprint};
use crate::selector::NodeSelector;
use crate::tree::DocumentView;
use tokio::sync::mpsc;
use tracing::debug;

struct Observer {
    selector: NodeSelector,
    kinds: ChangeKinds,
    sender: mpsc::Sender<MutationBatch>,
    last: Option<NodeFingerprint>,
}

/// Registered observers of one provider
///
/// Each time the provider's document is replaced, [`ObserverRegistry::dispatch`]
/// diffs every observed node against its previous fingerprint and sends one
/// [`MutationBatch`] per node that changed. Observers whose receiver has been
/// dropped are removed.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Observer>,
}

impl ObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing the node named by `selector` in `doc`
    ///
    /// Returns the node's content as of registration. Every later batch is
    /// diffed against this same state, so a change landing right after
    /// registration is delivered rather than folded into the baseline.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NodeNotFound`] if the selector does not
    /// resolve in the current document.
    pub fn register(
        &mut self,
        doc: &DocumentView,
        selector: NodeSelector,
        kinds: ChangeKinds,
        sender: mpsc::Sender<MutationBatch>,
    ) -> Result<NodeContent, DocumentError> {
        let node = selector
            .resolve(doc)
            .ok_or_else(|| DocumentError::NodeNotFound(selector.to_string()))?;
        let last = Some(NodeFingerprint::capture(doc, node, kinds.subtree));
        debug!("Observing {}", selector);
        self.observers.push(Observer {
            selector,
            kinds,
            sender,
            last,
        });
        Ok(NodeContent::capture(doc, node))
    }

    /// Diff `doc` against the last seen state of every observer and deliver batches
    ///
    /// Returns the number of batches delivered.
    pub async fn dispatch(&mut self, doc: &DocumentView) -> usize {
        let mut delivered = 0;
        let mut index = 0;

        while index < self.observers.len() {
            let batch = {
                let observer = &mut self.observers[index];
                match observer.selector.resolve(doc) {
                    Some(node) => {
                        let current = NodeFingerprint::capture(doc, node, observer.kinds.subtree);
                        let records = match &observer.last {
                            Some(previous) => previous.diff(&current, observer.kinds),
                            None if observer.kinds.child_list => {
                                vec![MutationRecord::new(MutationKind::ChildList)]
                            }
                            None => Vec::new(),
                        };
                        observer.last = Some(current);
                        (!records.is_empty()).then(|| MutationBatch {
                            records,
                            text: Some(doc.text_content(node)),
                            inner_html: Some(doc.inner_html(node)),
                        })
                    }
                    None => {
                        let removed = observer.last.take().is_some();
                        (removed && observer.kinds.child_list).then(|| MutationBatch {
                            records: vec![MutationRecord::new(MutationKind::ChildList)],
                            text: None,
                            inner_html: None,
                        })
                    }
                }
            };

            if let Some(batch) = batch {
                if self.observers[index].sender.send(batch).await.is_err() {
                    debug!("Observer of {} dropped its receiver", self.observers[index].selector);
                    self.observers.remove(index);
                    continue;
                }
                delivered += 1;
            }
            index += 1;
        }

        delivered
    }

    /// Number of live observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Drop every observer, closing their channels
    pub fn clear(&mut self) {
        self.observers.clear();
    }
}
