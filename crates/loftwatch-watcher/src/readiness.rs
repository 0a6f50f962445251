//! Waiting for the monitored content to load

use crate::error::WatcherError;
use loftwatch_document::{DocumentProvider, DocumentView};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Boolean condition over the live tree signalling the content has loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessPredicate {
    /// The first table body has at least one row
    TableRows,

    /// A label node with exactly this trimmed text exists
    LabelPresent {
        /// Class shared by label nodes
        label_class: String,
        /// Label text to look for
        label_text: String,
    },
}

impl ReadinessPredicate {
    /// Evaluate against a snapshot
    pub fn is_satisfied(&self, doc: &DocumentView) -> bool {
        match self {
            ReadinessPredicate::TableRows => doc
                .first_by_tag("tbody")
                .is_some_and(|tbody| doc.count_descendants_by_tag(tbody, "tr") > 0),
            ReadinessPredicate::LabelPresent { label_class, label_text } => doc
                .find_by_class(label_class)
                .into_iter()
                .any(|id| doc.trimmed_text(id) == *label_text),
        }
    }
}

impl fmt::Display for ReadinessPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessPredicate::TableRows => f.write_str("table rows present"),
            ReadinessPredicate::LabelPresent { label_text, .. } => {
                write!(f, "label \"{}\" present", label_text)
            }
        }
    }
}

/// Poll `predicate` every `poll_interval` until it holds
///
/// # Errors
///
/// Returns [`WatcherError::ReadinessTimeout`] when `timeout` elapses first,
/// or the provider's error if a query fails.
pub async fn wait_until_ready<P: DocumentProvider>(
    provider: &P,
    predicate: &ReadinessPredicate,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), WatcherError> {
    let poll = async {
        loop {
            if provider.evaluate(|doc| predicate.is_satisfied(doc)).await? {
                return Ok::<(), WatcherError>(());
            }
            debug!("Waiting for {}", predicate);
            tokio::time::sleep(poll_interval).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| WatcherError::ReadinessTimeout(timeout))?
}
