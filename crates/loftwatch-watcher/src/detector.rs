//! Change detection for one watched field

use loftwatch_document::MutationBatch;
use loftwatch_domain::{DeltaReport, WatchedFieldState};

/// Turns mutation batches of a watched node into delta reports
///
/// The node's text is trimmed and compared once per batch, so a burst of
/// low-level mutations yields at most one delta. A batch whose node has
/// left the tree carries no text and never fires.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    state: WatchedFieldState,
}

impl ChangeDetector {
    /// Start from the text seen when observation was attached
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            state: WatchedFieldState::new(initial),
        }
    }

    /// The last confirmed text
    pub fn last_seen_text(&self) -> &str {
        self.state.last_seen_text()
    }

    /// Process one batch, returning a delta if the text changed
    pub fn process(&mut self, batch: &MutationBatch) -> Option<DeltaReport> {
        let text = batch.text.as_deref()?;
        self.state.observe(text.trim()).map(DeltaReport::new)
    }
}
