//! Stable node addressing across snapshots

use crate::tree::{DocumentView, NodeId};
use std::fmt;

/// Names a node so it can be found again in a later snapshot
///
/// Node ids are only meaningful within one [`DocumentView`]; observers and
/// interactions therefore carry a selector and resolve it against each new
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    /// Value node adjacent to a label, see [`DocumentView::labeled_value`]
    LabeledValue {
        /// Class shared by label nodes
        label_class: String,
        /// Exact trimmed label text
        label_text: String,
        /// Marker class the value node must carry
        value_class: String,
    },

    /// First element with the given tag
    FirstTag(String),

    /// First element carrying the given class
    FirstClass(String),

    /// First `tag` element containing an `inner_tag` whose trimmed text matches
    WithInnerText {
        /// Outer element tag, e.g. `th`
        tag: String,
        /// Inner element tag, e.g. `span`
        inner_tag: String,
        /// Exact trimmed text of the inner element
        text: String,
    },
}

impl NodeSelector {
    /// Selector for a labeled value
    pub fn labeled_value(
        label_class: impl Into<String>,
        label_text: impl Into<String>,
        value_class: impl Into<String>,
    ) -> Self {
        NodeSelector::LabeledValue {
            label_class: label_class.into(),
            label_text: label_text.into(),
            value_class: value_class.into(),
        }
    }

    /// Resolve against a snapshot
    pub fn resolve(&self, doc: &DocumentView) -> Option<NodeId> {
        match self {
            NodeSelector::LabeledValue {
                label_class,
                label_text,
                value_class,
            } => doc.labeled_value(label_class, label_text, value_class),
            NodeSelector::FirstTag(tag) => doc.first_by_tag(tag),
            NodeSelector::FirstClass(class) => doc.first_by_class(class),
            NodeSelector::WithInnerText { tag, inner_tag, text } => {
                (0..doc.len()).filter(|&id| doc.tag(id) == Some(tag.as_str())).find(|&id| {
                    doc.find_by_tag_within(id, inner_tag)
                        .first()
                        .is_some_and(|&inner| doc.trimmed_text(inner) == *text)
                })
            }
        }
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSelector::LabeledValue { label_class, label_text, value_class } => {
                write!(f, ".{}[\"{}\"] + .{}", label_class, label_text, value_class)
            }
            NodeSelector::FirstTag(tag) => write!(f, "{}", tag),
            NodeSelector::FirstClass(class) => write!(f, ".{}", class),
            NodeSelector::WithInnerText { tag, inner_tag, text } => {
                write!(f, "{} > {}[\"{}\"]", tag, inner_tag, text)
            }
        }
    }
}
