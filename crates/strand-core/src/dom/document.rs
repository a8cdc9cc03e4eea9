//! In-memory document tree.

use std::fmt::{self, Write as FmtWrite};

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use super::{Attribute, Dom, InputListener, NodeKind};
use crate::error::{Error, Result};

new_key_type! {
    /// A stable handle to a node in a [`Document`].
    ///
    /// Handles stay valid while nodes are moved between parents.
    pub struct NodeId;
}

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

struct NodeData {
    kind: NodeKind,
    /// Lowercased tag name for elements, empty otherwise.
    tag: String,
    attributes: Vec<Attribute>,
    /// Character data for text and comment nodes.
    text: String,
    /// Value field of input-capable elements.
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    input_listeners: Vec<InputListener>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
            input_listeners: Vec::new(),
        }
    }
}

/// An arena-backed document.
///
/// All node data lives in one [`SlotMap`] keyed by [`NodeId`]. The tree is
/// shared behind an `RwLock`; every method takes `&self`, so a document can
/// be wrapped in an `Arc` and handed to the compiler and to event sources at
/// once.
///
/// # Example
///
/// ```
/// use strand_core::{Document, Dom};
///
/// let doc = Document::new();
/// let app = doc.append_element(doc.root(), "div");
/// doc.set_attribute(app, "id", "app");
/// doc.append_text(app, "hello");
///
/// assert_eq!(doc.query_selector("#app").unwrap(), Some(app));
/// assert_eq!(doc.to_markup(app), r#"<div id="app">hello</div>"#);
/// ```
pub struct Document {
    nodes: RwLock<SlotMap<NodeId, NodeData>>,
    root: NodeId,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(NodeKind::Document));
        Self {
            nodes: RwLock::new(nodes),
            root,
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = tag.to_ascii_lowercase();
        self.nodes.write().insert(data)
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = text.to_string();
        self.nodes.write().insert(data)
    }

    /// Create a detached comment.
    pub fn create_comment(&self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Comment);
        data.text = text.to_string();
        self.nodes.write().insert(data)
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(&self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append(parent, node);
        node
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&self, parent: NodeId, text: &str) -> NodeId {
        let node = self.create_text_node(text);
        self.append(parent, node);
        node
    }

    /// Set or replace an attribute on an element.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.write();
        let Some(data) = nodes.get_mut(node) else {
            return;
        };
        match data.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => data.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Read an attribute.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.read().get(node).and_then(|data| {
            data.attributes
                .iter()
                .find(|attr| attr.name == name)
                .map(|attr| attr.value.clone())
        })
    }

    /// The element's tag name, if `node` is an element.
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes
            .read()
            .get(node)
            .filter(|data| data.kind == NodeKind::Element)
            .map(|data| data.tag.clone())
    }

    /// The parent of a node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.read().get(node).and_then(|data| data.parent)
    }

    /// Number of input listeners attached to a node.
    pub fn input_listener_count(&self, node: NodeId) -> usize {
        self.nodes
            .read()
            .get(node)
            .map_or(0, |data| data.input_listeners.len())
    }

    /// Simulate a user edit: set the element's value, then fire its input
    /// listeners with the new value.
    ///
    /// Listeners run after the document lock is released.
    pub fn dispatch_input(&self, node: NodeId, value: &str) {
        let listeners = {
            let mut nodes = self.nodes.write();
            let Some(data) = nodes.get_mut(node) else {
                tracing::warn!(target: "strand_core::dom", ?node, "input dispatched to unknown node");
                return;
            };
            data.value = value.to_string();
            data.input_listeners.clone()
        };
        tracing::trace!(
            target: "strand_core::dom",
            ?node,
            listener_count = listeners.len(),
            "dispatching input event"
        );
        for listener in listeners {
            listener(value);
        }
    }

    /// Serialize a node and its subtree as markup.
    ///
    /// Documents and fragments serialize as their children.
    pub fn to_markup(&self, node: NodeId) -> String {
        let nodes = self.nodes.read();
        let mut output = String::new();
        write_markup(&nodes, node, &mut output);
        output
    }

    fn append(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(parent) || !nodes.contains_key(child) {
            return;
        }
        let moved = if nodes[child].kind == NodeKind::Fragment {
            std::mem::take(&mut nodes[child].children)
        } else {
            vec![child]
        };
        for node in moved {
            if is_inclusive_ancestor(&nodes, node, parent) {
                tracing::warn!(
                    target: "strand_core::dom",
                    ?node,
                    ?parent,
                    "refusing to append a node into its own subtree"
                );
                continue;
            }
            detach(&mut nodes, node);
            nodes[node].parent = Some(parent);
            nodes[parent].children.push(node);
        }
    }

    fn matches(data: &NodeData, selector: &Selector<'_>) -> bool {
        if data.kind != NodeKind::Element {
            return false;
        }
        let attribute = |name: &str| {
            data.attributes
                .iter()
                .find(|attr| attr.name == name)
                .map(|attr| attr.value.as_str())
        };
        match selector {
            Selector::Id(id) => attribute("id") == Some(*id),
            Selector::Class(class) => attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == *class)),
            Selector::Tag(tag) => data.tag.eq_ignore_ascii_case(tag),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("node_count", &self.nodes.read().len())
            .finish()
    }
}

/// The simple selectors the in-memory document understands.
enum Selector<'a> {
    Id(&'a str),
    Class(&'a str),
    Tag(&'a str),
}

impl<'a> Selector<'a> {
    fn parse(selector: &'a str) -> Result<Self> {
        let valid_name = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        let parsed = if let Some(id) = selector.strip_prefix('#') {
            Selector::Id(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            Selector::Class(class)
        } else {
            Selector::Tag(selector)
        };
        let name = match &parsed {
            Selector::Id(name) | Selector::Class(name) | Selector::Tag(name) => *name,
        };
        if valid_name(name) {
            Ok(parsed)
        } else {
            Err(Error::invalid_selector(selector))
        }
    }
}

fn detach(nodes: &mut SlotMap<NodeId, NodeData>, node: NodeId) {
    if let Some(old_parent) = nodes[node].parent.take() {
        if let Some(parent) = nodes.get_mut(old_parent) {
            parent.children.retain(|&c| c != node);
        }
    }
}

fn is_inclusive_ancestor(nodes: &SlotMap<NodeId, NodeData>, candidate: NodeId, of: NodeId) -> bool {
    let mut current = Some(of);
    while let Some(id) = current {
        if id == candidate {
            return true;
        }
        current = nodes.get(id).and_then(|data| data.parent);
    }
    false
}

fn collect_text(nodes: &SlotMap<NodeId, NodeData>, node: NodeId, output: &mut String) {
    let Some(data) = nodes.get(node) else {
        return;
    };
    match data.kind {
        NodeKind::Text => output.push_str(&data.text),
        NodeKind::Comment => {}
        _ => {
            for &child in &data.children {
                collect_text(nodes, child, output);
            }
        }
    }
}

fn escape(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
}

fn write_markup(nodes: &SlotMap<NodeId, NodeData>, node: NodeId, output: &mut String) {
    let Some(data) = nodes.get(node) else {
        return;
    };
    match data.kind {
        NodeKind::Text => escape(&data.text, output),
        NodeKind::Comment => {
            write!(output, "<!--{}-->", data.text).expect("write to String");
        }
        NodeKind::Document | NodeKind::Fragment => {
            for &child in &data.children {
                write_markup(nodes, child, output);
            }
        }
        NodeKind::Element => {
            output.push('<');
            output.push_str(&data.tag);
            for attr in &data.attributes {
                write!(output, " {}=\"", attr.name).expect("write to String");
                escape(&attr.value, output);
                output.push('"');
            }
            output.push('>');
            if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                return;
            }
            for &child in &data.children {
                write_markup(nodes, child, output);
            }
            write!(output, "</{}>", data.tag).expect("write to String");
        }
    }
}

impl Dom for Document {
    type Node = NodeId;

    fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        let nodes = self.nodes.read();
        // Pre-order walk of the attached tree.
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(data) = nodes.get(id) else {
                continue;
            };
            if Self::matches(data, &selector) {
                return Ok(Some(id));
            }
            stack.extend(data.children.iter().rev().copied());
        }
        Ok(None)
    }

    fn node_kind(&self, node: &NodeId) -> NodeKind {
        self.nodes
            .read()
            .get(*node)
            .map_or(NodeKind::Fragment, |data| data.kind)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.nodes
            .read()
            .get(*node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn attributes(&self, node: &NodeId) -> Vec<Attribute> {
        self.nodes
            .read()
            .get(*node)
            .map(|data| data.attributes.clone())
            .unwrap_or_default()
    }

    fn text_content(&self, node: &NodeId) -> String {
        let nodes = self.nodes.read();
        let mut output = String::new();
        match nodes.get(*node) {
            Some(data) if matches!(data.kind, NodeKind::Comment) => output.push_str(&data.text),
            Some(_) => collect_text(&nodes, *node, &mut output),
            None => {}
        }
        output
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        let kind = self.node_kind(node);
        match kind {
            NodeKind::Text | NodeKind::Comment => {
                if let Some(data) = self.nodes.write().get_mut(*node) {
                    data.text = text.to_string();
                }
            }
            NodeKind::Element | NodeKind::Fragment => {
                // Replaces all children with a single text node.
                {
                    let mut nodes = self.nodes.write();
                    let Some(data) = nodes.get_mut(*node) else {
                        return;
                    };
                    let children = std::mem::take(&mut data.children);
                    for child in children {
                        nodes[child].parent = None;
                    }
                }
                if !text.is_empty() {
                    self.append_text(*node, text);
                }
            }
            NodeKind::Document => {}
        }
    }

    fn value(&self, node: &NodeId) -> String {
        self.nodes
            .read()
            .get(*node)
            .map(|data| data.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, node: &NodeId, value: &str) {
        if let Some(data) = self.nodes.write().get_mut(*node) {
            data.value = value.to_string();
        }
    }

    fn add_input_listener(&self, node: &NodeId, listener: InputListener) {
        if let Some(data) = self.nodes.write().get_mut(*node) {
            data.input_listeners.push(listener);
        }
    }

    fn create_fragment(&self) -> NodeId {
        self.nodes.write().insert(NodeData::new(NodeKind::Fragment))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.append(*parent, *child);
    }
}

static_assertions::assert_impl_all!(Document: Send, Sync);
