//! Mutation records and subtree diffing

use crate::tree::{DocumentView, NodeId, NodeKind};

/// Kind of low-level change observed on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Children were inserted or removed
    ChildList,
    /// An attribute changed
    Attributes,
    /// Text data changed in place
    CharacterData,
}

/// One low-level change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// What changed
    pub kind: MutationKind,
}

impl MutationRecord {
    /// Create a record of the given kind
    pub fn new(kind: MutationKind) -> Self {
        Self { kind }
    }
}

/// Which changes an observer is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeKinds {
    /// Child insertion and removal
    pub child_list: bool,
    /// Attribute changes
    pub attributes: bool,
    /// Text data changes
    pub character_data: bool,
    /// Watch the whole subtree rather than the node and its direct children
    pub subtree: bool,
}

impl ChangeKinds {
    /// Every kind of change across the whole subtree
    pub const ALL: ChangeKinds = ChangeKinds {
        child_list: true,
        attributes: true,
        character_data: true,
        subtree: true,
    };

    /// Whether records of `kind` pass this filter
    pub fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => self.attributes,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

impl Default for ChangeKinds {
    fn default() -> Self {
        Self::ALL
    }
}

/// Coalesced group of mutation records delivered together for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    /// Low-level records in this batch
    pub records: Vec<MutationRecord>,

    /// Raw text content of the observed node at delivery time
    ///
    /// `None` when the node no longer exists in the document.
    pub text: Option<String>,

    /// Markup of the observed node's children at delivery time
    ///
    /// `None` when the node no longer exists in the document.
    pub inner_html: Option<String>,
}

impl MutationBatch {
    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Content of an observed node at the moment observation started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContent {
    /// Raw text content
    pub text: String,
    /// Markup of the node's children
    pub inner_html: String,
}

impl NodeContent {
    /// Read the content of `id`
    pub fn capture(doc: &DocumentView, id: NodeId) -> Self {
        Self {
            text: doc.text_content(id),
            inner_html: doc.inner_html(id),
        }
    }
}

/// Comparable summary of a node's subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFingerprint {
    structure: String,
    attributes: String,
    text: String,
}

impl NodeFingerprint {
    /// Capture the subtree of `id`
    ///
    /// Without `subtree` only the node itself and its direct children are
    /// considered.
    pub fn capture(doc: &DocumentView, id: NodeId, subtree: bool) -> Self {
        let scope: Vec<NodeId> = if subtree {
            std::iter::once(id).chain(doc.descendants(id)).collect()
        } else {
            std::iter::once(id).chain(doc.children(id).iter().copied()).collect()
        };

        let mut structure = String::new();
        let mut attributes = String::new();
        let mut text = String::new();

        for (position, node) in scope.into_iter().enumerate() {
            let depth = depth_below(doc, id, node);
            match doc.kind(node) {
                Some(NodeKind::Element { tag, attributes: attrs, .. }) => {
                    structure.push_str(&format!("{}<{}>{};", depth, tag, doc.children(node).len()));
                    for (name, value) in attrs {
                        attributes.push_str(&format!("{}:{}={};", position, name, value));
                    }
                }
                Some(NodeKind::Text(data)) => {
                    structure.push_str(&format!("{}#text;", depth));
                    text.push_str(data);
                }
                Some(NodeKind::Document) | None => {}
            }
        }

        Self {
            structure,
            attributes,
            text,
        }
    }

    /// Records describing how `self` became `next`, filtered by `kinds`
    pub fn diff(&self, next: &NodeFingerprint, kinds: ChangeKinds) -> Vec<MutationRecord> {
        let mut records = Vec::new();
        let structural = self.structure != next.structure;

        if structural {
            records.push(MutationRecord::new(MutationKind::ChildList));
        }
        if self.attributes != next.attributes {
            records.push(MutationRecord::new(MutationKind::Attributes));
        }
        if !structural && self.text != next.text {
            records.push(MutationRecord::new(MutationKind::CharacterData));
        }

        records.retain(|r| kinds.accepts(r.kind));
        records
    }
}

fn depth_below(doc: &DocumentView, ancestor: NodeId, node: NodeId) -> usize {
    let mut depth = 0;
    let mut current = node;
    while current != ancestor {
        match doc.parent(current) {
            Some(parent) => {
                depth += 1;
                current = parent;
            }
            None => break,
        }
    }
    depth
}
