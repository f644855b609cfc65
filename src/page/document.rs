//! This module contains the page's syntax tree.
//!
//! Nodes live in an arena and refer to their children by [`NodeId`]. Elements
//! keep the source text of their tags until they are modified, so that the
//! renderer can write untouched markup back byte-for-byte.

use super::{entities, lexer, parser};
use slog::trace;

/// Index of a node in the document's arena.
pub type NodeId = usize;

/// The types of nodes in the tree.
#[derive(Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text exactly as written, character references included.
    Text(String),
    /// Comments, declarations, raw-text bodies, and stray end tags.
    Raw(String),
}

/// An element and its children.
#[derive(Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
    /// The start tag as written, dropped once the attributes change.
    pub open_tag: Option<String>,
    pub self_closing: bool,
    pub close_tag: CloseTag,
}

/// How an element was closed.
#[derive(Debug, PartialEq, Eq)]
pub enum CloseTag {
    /// An explicit end tag, as written.
    Source(String),
    /// Closed by an ancestor's end tag or by the end of the input.
    Implicit,
    /// A void or self-closing element, which has no end tag.
    Void,
}

/// An attribute with its value as written (character references included).
#[derive(Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// A parsed HTML page.
#[derive(Debug, Default)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl HtmlDocument {
    /// Lex and parse a complete page.
    pub fn parse(input: &str) -> Result<HtmlDocument, String> {
        let tokens = lexer::lexer(input)?;
        parser::parser(&tokens)
    }

    /// Parse a fragment of markup into detached nodes of this document.
    ///
    /// The returned roots are not attached anywhere until passed to
    /// [`HtmlDocument::append_children`] or [`HtmlDocument::replace_children`].
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeId>, String> {
        let tokens = lexer::lexer(markup)?;
        parser::build(self, &tokens)
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub(crate) fn close(&mut self, id: NodeId, end_tag: &str) {
        if let Some(element) = self.element_mut(id) {
            element.close_tag = CloseTag::Source(end_tag.to_string());
        }
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<NodeId>) {
        self.roots = roots;
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id) {
            Some(Node::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id) {
            Some(Node::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// The decoded value of an attribute.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        let element = self.element(id)?;
        element
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| entities::decode(a.value.as_deref().unwrap_or("")))
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            let value = Some(entities::escape_attribute(value));
            match element.attributes.iter_mut().find(|a| a.name == name) {
                Some(attribute) => attribute.value = value,
                None => element.attributes.push(Attribute {
                    name: name.to_string(),
                    value,
                }),
            }
            element.open_tag = None;
        }
    }

    /// Whether an element carries a class.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// All elements in document order, depth first.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut found = Vec::new();
        for &root in &self.roots {
            self.collect(root, &mut found);
        }
        found
    }

    fn collect(&self, id: NodeId, found: &mut Vec<NodeId>) {
        if let Some(element) = self.element(id) {
            found.push(id);
            for &child in &element.children {
                self.collect(child, found);
            }
        }
    }

    /// All elements carrying a class, in document order.
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants()
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    /// The first element with an `id`.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants()
            .into_iter()
            .find(|&id| self.attribute(id, "id").as_deref() == Some(element_id))
    }

    /// The first element below `id` (not `id` itself) carrying a class.
    pub fn first_descendant_by_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut found = Vec::new();
        if let Some(element) = self.element(id) {
            for &child in &element.children {
                self.collect(child, &mut found);
            }
        }
        found.into_iter().find(|&d| self.has_class(d, class))
    }

    /// The decoded text below a node.
    #[cfg(test)]
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.nodes[id] {
            Node::Text(text) => entities::decode(text),
            Node::Raw(_) => String::new(),
            Node::Element(element) => element
                .children
                .iter()
                .map(|&child| self.text_content(child))
                .collect(),
        }
    }

    /// Replace an element's children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let text = self.push(Node::Text(entities::escape_text(text)));
        self.replace_children(id, vec![text]);
    }

    /// Replace an element's children.
    ///
    /// Void elements cannot have children and are left alone.
    pub fn replace_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        if let Some(element) = self.element_mut(id) {
            if element.close_tag == CloseTag::Void {
                return;
            }
            trace!(
                slog_scope::logger(),
                "Replacing children of <{}>",
                element.name
            );
            element.children = children;
        }
    }

    /// Whether an element can hold children. Void elements cannot.
    pub fn accepts_children(&self, id: NodeId) -> bool {
        self.element(id)
            .map(|element| element.close_tag != CloseTag::Void)
            .unwrap_or(false)
    }

    /// Append children to an element.
    pub fn append_children(&mut self, id: NodeId, children: &[NodeId]) {
        if let Some(element) = self.element_mut(id) {
            if element.close_tag == CloseTag::Void {
                return;
            }
            element.children.extend_from_slice(children);
        }
    }
}
