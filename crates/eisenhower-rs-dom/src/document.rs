//! Arena-backed document tree.

use crate::error::DomError;
use crate::selector::Selector;
use std::fmt;
use url::Url;

/// Handle to a node inside one [`Document`].
///
/// Handles stay valid after the node is detached; a detached node simply no
/// longer shows up in traversals from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element name and attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Lower-case tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_ascii_lowercase(), value)),
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(idx).1)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A mutable snapshot of a page.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    focused: Option<NodeId>,
    url: Option<Url>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Root,
            }],
            focused: None,
            url: None,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn set_url(&mut self, url: Option<Url>) {
        self.url = url;
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Host part of the document URL, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.url.as_ref().and_then(Url::host_str)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The `body` element, or the root for bare fragments.
    pub fn body(&self) -> NodeId {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.tag_name(*id) == Some("body"))
            .unwrap_or_else(|| self.root())
    }

    /// Trimmed text of the first non-empty `title` element.
    pub fn title(&self) -> Option<String> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.tag_name(*id) == Some("title"))
            .map(|id| self.text_content(id).trim().to_string())
            .find(|title| !title.is_empty())
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.is_connected(*id))
    }

    pub fn set_focus(&mut self, node: Option<NodeId>) {
        self.focused = node.filter(|id| self.node(*id).is_some());
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id.0))
    }

    pub(crate) fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        self.detach(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Insert `node` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self
            .parent(reference)
            .ok_or(DomError::Detached(reference.0))?;
        if reference == node {
            return Ok(());
        }
        self.check_insertion(parent, node)?;
        self.detach(node);
        let siblings = &mut self.node_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|id| *id == reference)
            .map_or(siblings.len(), |idx| idx + 1);
        siblings.insert(position, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_node = self.node(parent).ok_or(DomError::UnknownNode(parent.0))?;
        if self.node(child).is_none() || child == self.root() {
            return Err(DomError::UnknownNode(child.0));
        }
        if matches!(parent_node.kind, NodeKind::Text(_)) {
            return Err(DomError::NotAContainer(parent.0));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyCycle {
                node: child.0,
                parent: parent.0,
            });
        }
        Ok(())
    }

    /// Detach a node (and its subtree) from the tree. Detached nodes are ignored.
    pub fn remove(&mut self, node: NodeId) {
        if node != self.root() {
            self.detach(node);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.retain(|id| *id != node);
        }
        if let Some(child) = self.nodes.get_mut(node.0) {
            child.parent = None;
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|node| node.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Parent chain, nearest first, ending at the root for connected nodes.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), |id| self.parent(*id))
    }

    /// Whether `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether the node is reachable from the root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root(), node)
    }

    /// Subtree below `node` in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element(element) => Ok(element),
            _ => Err(DomError::NotAnElement(node.0)),
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::name)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attr(name))
    }

    pub fn set_attr(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.element_mut(node)?.set_attr(name, value.into());
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node).ok()?.remove_attr(name)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.has_class(class))
    }

    /// Raw text of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of every text node below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.text(node) {
            return text.to_string();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Text of the node's own text children, ignoring nested elements.
    pub fn own_text(&self, node: NodeId) -> String {
        self.children(node)
            .iter()
            .filter_map(|id| self.text(*id))
            .collect()
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|id| selector.matches(self, *id))
    }

    /// All elements below `scope` matching `selector`, in document order.
    pub fn select_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.select_within(self.root(), selector)
    }

    pub fn select_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| selector.matches(self, *id))
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.select_first_within(self.root(), selector)
    }

    /// First connected element whose attribute `name` equals `value`.
    ///
    /// Used for lookups keyed by stored ids, which would need escaping as a
    /// selector string.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.attr(*id, name) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::{DomError, Selector};
    use pretty_assertions::assert_eq;

    fn sample() -> (Document, [crate::NodeId; 4]) {
        let mut doc = Document::new();
        let body = doc.create_element("BODY");
        let list = doc.create_element("div");
        let row = doc.create_element("div");
        let text = doc.create_text("Weekly sync");
        doc.append_child(doc.root(), body).expect("body");
        doc.append_child(body, list).expect("list");
        doc.append_child(list, row).expect("row");
        doc.append_child(row, text).expect("text");
        (doc, [body, list, row, text])
    }

    #[test]
    fn tree_operations_keep_document_order() {
        let (mut doc, [body, list, row, text]) = sample();
        assert_eq!(doc.tag_name(body), Some("body"));
        assert_eq!(doc.body(), body);
        assert_eq!(doc.descendants(doc.root()), vec![body, list, row, text]);

        let badge = doc.create_element("span");
        doc.insert_after(row, badge).expect("insert");
        assert_eq!(doc.children(list), &[row, badge]);
        assert_eq!(doc.text_content(list), "Weekly sync");

        doc.remove(badge);
        assert!(!doc.is_connected(badge));
        assert_eq!(doc.children(list), &[row]);
        doc.remove(badge);
    }

    #[test]
    fn rejects_cycles_and_text_parents() {
        let (mut doc, [body, list, _row, text]) = sample();
        assert!(matches!(
            doc.append_child(list, body),
            Err(DomError::HierarchyCycle { .. })
        ));
        let extra = doc.create_element("b");
        assert!(matches!(
            doc.append_child(text, extra),
            Err(DomError::NotAContainer(_))
        ));
        assert!(matches!(
            doc.insert_after(extra, body),
            Err(DomError::Detached(_))
        ));
        assert!(matches!(
            doc.set_attr(text, "id", "x"),
            Err(DomError::NotAnElement(_))
        ));
    }

    #[test]
    fn attributes_are_case_insensitive_and_replaceable() {
        let (mut doc, [_, _, row, _]) = sample();
        doc.set_attr(row, "Data-ConvId", "AAQk").expect("attr");
        doc.set_attr(row, "class", "row selected").expect("class");
        assert_eq!(doc.attr(row, "data-convid"), Some("AAQk"));
        doc.set_attr(row, "data-convid", "BBQk").expect("attr");
        assert_eq!(doc.attr(row, "data-convid"), Some("BBQk"));
        assert!(doc.has_class(row, "selected"));
        assert!(!doc.has_class(row, "select"));
        assert_eq!(doc.find_by_attr("data-convid", "BBQk"), Some(row));
        assert_eq!(doc.remove_attr(row, "data-convid").as_deref(), Some("BBQk"));
        assert_eq!(doc.remove_attr(row, "data-convid"), None);
    }

    #[test]
    fn closest_and_focus_follow_connectivity() {
        let (mut doc, [body, list, row, text]) = sample();
        doc.set_attr(list, "role", "list").expect("role");
        let selector = Selector::parse("[role=\"list\"]").expect("selector");
        assert_eq!(doc.closest(text, &selector), Some(list));
        assert_eq!(doc.closest(body, &selector), None);

        doc.set_focus(Some(row));
        assert_eq!(doc.focused(), Some(row));
        doc.remove(list);
        assert_eq!(doc.focused(), None);
    }
}
