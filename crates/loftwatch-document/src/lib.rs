//! Loftwatch Document Layer
//!
//! The boundary between the watcher and whatever renders the monitored page.
//!
//! # Architecture
//!
//! ```text
//! DocumentProvider ──navigate/evaluate──▶ DocumentView (arena tree)
//!        │
//!        └──observe(selector, kinds, sender)──▶ ObserverRegistry ──MutationBatch──▶ mpsc
//! ```
//!
//! A provider owns the live tree. Queries run against it through
//! [`DocumentProvider::evaluate`]; changes to an observed node are diffed
//! and delivered as [`MutationBatch`]es over a bounded channel supplied by
//! the caller.
//!
//! # Providers
//!
//! - [`ScriptedProvider`]: in-memory provider driven by the caller (tests, demos)
//! - [`HttpDocumentProvider`]: fetches the page over HTTP and re-polls it
//!
//! # Examples
//!
//! ```
//! use loftwatch_document::{DocumentView, NodeSelector};
//!
//! let doc = DocumentView::parse_html(
//!     r#"<div><span class="label">Arrivals</span><span class="value"> 40/85 </span></div>"#,
//! );
//! let selector = NodeSelector::labeled_value("label", "Arrivals", "value");
//! let node = selector.resolve(&doc).unwrap();
//! assert_eq!(doc.trimmed_text(node), "40/85");
//! ```

#![warn(missing_docs)]

mod error;
mod tree;
mod selector;
mod mutation;
mod observer;
mod provider;
mod scripted;
mod http;

pub use error::DocumentError;
pub use tree::{DocumentView, NodeId, NodeKind};
pub use selector::NodeSelector;
pub use mutation::{ChangeKinds, MutationBatch, MutationKind, MutationRecord, NodeContent, NodeFingerprint};
pub use observer::ObserverRegistry;
pub use provider::{DocumentProvider, ProviderFactory, ReadyPolicy};
pub use scripted::{ScriptedFactory, ScriptedProvider};
pub use http::{HttpDocumentProvider, HttpProviderFactory};
