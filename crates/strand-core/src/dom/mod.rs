//! Document tree abstraction.
//!
//! The template compiler never touches a concrete tree. It works against the
//! [`Dom`] capability trait: classify a node, enumerate children and
//! attributes, read and write text content and input values, subscribe to
//! input events, and move nodes between parents.
//!
//! [`Document`] is an in-memory implementation backed by an arena, used by
//! the tests and the demo and suitable for headless rendering.

mod document;

pub use document::{Document, NodeId};

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Listener for input events. Receives the element's value after the edit.
pub type InputListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Node classification by discrete type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An element such as `<input>` or `<p>`.
    Element,
    /// A text node.
    Text,
    /// A comment.
    Comment,
    /// The document itself.
    Document,
    /// A detached container whose children move as a group.
    Fragment,
}

impl NodeKind {
    /// The numeric node type code.
    pub const fn code(self) -> u16 {
        match self {
            Self::Element => 1,
            Self::Text => 3,
            Self::Comment => 8,
            Self::Document => 9,
            Self::Fragment => 11,
        }
    }

    /// Classify a numeric node type code.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Element),
            3 => Some(Self::Text),
            8 => Some(Self::Comment),
            9 => Some(Self::Document),
            11 => Some(Self::Fragment),
            _ => None,
        }
    }
}

/// An attribute name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Capabilities the compiler needs from a host document.
///
/// Implementations must not hold internal locks while invoking input
/// listeners: a listener writes the model, which synchronously writes back
/// into the document through the watchers.
pub trait Dom: Send + Sync + 'static {
    /// Handle to a node in this document.
    type Node: Clone + fmt::Debug + Send + Sync + 'static;

    /// Find the first node in document order matching `selector`.
    fn query_selector(&self, selector: &str) -> Result<Option<Self::Node>>;

    /// Classify a node.
    fn node_kind(&self, node: &Self::Node) -> NodeKind;

    /// Child nodes in order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Attributes in source order. Empty for non-elements.
    fn attributes(&self, node: &Self::Node) -> Vec<Attribute>;

    /// Text content of a node.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Replace the text content of a node.
    fn set_text_content(&self, node: &Self::Node, text: &str);

    /// The value field of an input-capable element.
    fn value(&self, node: &Self::Node) -> String;

    /// Write the value field of an input-capable element.
    fn set_value(&self, node: &Self::Node, value: &str);

    /// Subscribe to input events on an element.
    fn add_input_listener(&self, node: &Self::Node, listener: InputListener);

    /// Create a detached fragment.
    fn create_fragment(&self) -> Self::Node;

    /// Move `child` to the end of `parent`'s children.
    ///
    /// Appending a fragment moves the fragment's children instead, in order,
    /// and leaves the fragment empty.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
}
