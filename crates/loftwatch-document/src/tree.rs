//! Arena tree of a rendered document

use scraper::{ElementRef, Html};

/// Index of a node inside a [`DocumentView`]
///
/// Ids are assigned in document order, so comparing two ids of the same
/// view compares their position in the page.
pub type NodeId = usize;

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic document root
    Document,

    /// An element with its attributes
    Element {
        /// Lower-case tag name
        tag: String,
        /// Attributes in source order
        attributes: Vec<(String, String)>,
        /// Class list
        classes: Vec<String>,
    },

    /// A text node
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Immutable snapshot of a rendered document
///
/// Comments, doctypes and processing instructions are dropped; only the
/// document root, elements and text nodes are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    nodes: Vec<Node>,
}

impl Default for DocumentView {
    fn default() -> Self {
        Self::empty()
    }
}

impl DocumentView {
    /// A document containing only the root node
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse an HTML string
    ///
    /// Parsing is lenient: malformed markup yields a best-effort tree,
    /// never an error.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut view = Self::empty();
        let root = view.root();
        view.push_element(parsed.root_element(), root);
        view
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_element(&mut self, element: ElementRef<'_>, parent: NodeId) {
        let value = element.value();
        let kind = NodeKind::Element {
            tag: value.name().to_ascii_lowercase(),
            attributes: value
                .attrs()
                .map(|(name, val)| (name.to_string(), val.to_string()))
                .collect(),
            classes: value.classes().map(str::to_string).collect(),
        };
        let id = self.push_node(kind, parent);

        for child in element.children() {
            match child.value() {
                scraper::Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.push_element(child_element, id);
                    }
                }
                scraper::Node::Text(text) => {
                    self.push_node(NodeKind::Text((**text).to_owned()), id);
                }
                _ => {}
            }
        }
    }

    /// The document root
    pub fn root(&self) -> NodeId {
        0
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Payload of a node
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    /// Tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Whether `id` is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    /// Class list of an element node (empty for other nodes)
    pub fn classes(&self, id: NodeId) -> &[String] {
        match self.kind(id) {
            Some(NodeKind::Element { classes, .. }) => classes,
            _ => &[],
        }
    }

    /// Whether an element carries the given class
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    /// Value of an attribute on an element
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Attributes of an element (empty for other nodes)
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Direct children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// All descendants of a node in document order, excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every element carrying `class`, in document order
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    /// First element carrying `class`
    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        (0..self.nodes.len()).find(|&id| self.has_class(id, class))
    }

    /// First element with the given tag
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        (0..self.nodes.len()).find(|&id| self.tag(id) == Some(tag))
    }

    /// Descendants of `id` with the given tag
    pub fn find_by_tag_within(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.tag(n) == Some(tag))
            .collect()
    }

    /// First descendant of `id` carrying every class in `classes`
    pub fn first_within_with_classes(&self, id: NodeId, classes: &[&str]) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&n| self.is_element(n) && classes.iter().all(|c| self.has_class(n, c)))
    }

    /// Number of descendants of `id` with the given tag
    pub fn count_descendants_by_tag(&self, id: NodeId, tag: &str) -> usize {
        self.find_by_tag_within(id, tag).len()
    }

    /// Concatenated text of every text node under `id`
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| match &self.nodes[n].kind {
                    NodeKind::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Markup of the children of `id`, without `id` itself
    ///
    /// Elements are written with their attributes in source order. Two nodes
    /// with equal inner markup have identical descendants.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Element { tag, attributes, .. }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
            Some(NodeKind::Text(text)) => out.push_str(&escape(text, false)),
            Some(NodeKind::Document) | None => {}
        }
    }

    /// Text content with surrounding whitespace removed
    pub fn trimmed_text(&self, id: NodeId) -> String {
        self.text_content(id).trim().to_string()
    }

    /// The next sibling of `id` that is an element, skipping text nodes
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&s| s == id)?;
        siblings[position + 1..]
            .iter()
            .copied()
            .find(|&s| self.is_element(s))
    }

    /// Find a value node by the text of the label preceding it
    ///
    /// The label is the first element carrying `label_class` whose trimmed
    /// text equals `label_text` exactly. The value is the label's next element
    /// sibling, and only if it carries `value_class`.
    pub fn labeled_value(&self, label_class: &str, label_text: &str, value_class: &str) -> Option<NodeId> {
        let label = self
            .find_by_class(label_class)
            .into_iter()
            .find(|&id| self.trimmed_text(id) == label_text)?;
        let value = self.next_element_sibling(label)?;
        self.has_class(value, value_class).then_some(value)
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
