//! Logging and debugging facilities for Strand.
//!
//! This module provides:
//! - Target names for filtering Strand's `tracing` output by subsystem
//! - Debug visualization for document trees
//!
//! # Tracing Integration
//!
//! Strand uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("strand_core::compiler=debug,strand_core::reactive=debug")
//!         .init();
//! }
//! ```
//!
//! # Debug Visualization
//!
//! Use [`DocumentTreeDebug`] to inspect a compiled tree:
//!
//! ```
//! use strand_core::{Document, logging::DocumentTreeDebug};
//!
//! let doc = Document::new();
//! let app = doc.append_element(doc.root(), "div");
//! doc.append_text(app, "hello");
//!
//! let output = DocumentTreeDebug::new(&doc).format_subtree(app);
//! assert!(output.contains("<div>"));
//! assert!(output.contains("\"hello\""));
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::dom::{Document, Dom, NodeId, NodeKind};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "strand_core";
    /// Property conversion and writes.
    pub const REACTIVE: &str = "strand_core::reactive";
    /// Subscription registry notifications.
    pub const DEP: &str = "strand_core::dep";
    /// Watcher resolution and firing.
    pub const WATCHER: &str = "strand_core::watcher";
    /// Template compilation.
    pub const COMPILER: &str = "strand_core::compiler";
    /// In-memory document events.
    pub const DOM: &str = "strand_core::dom";
    /// The view-model façade.
    pub const FACADE: &str = "strand::facade";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for document tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node ids.
    pub show_ids: bool,
    /// Whether to show element attributes.
    pub show_attributes: bool,
    /// Whether to show element value fields.
    pub show_values: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_attributes: true,
            show_values: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_attributes: false,
            show_values: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a [`Document`].
#[derive(Debug, Clone)]
pub struct DocumentTreeDebug<'a> {
    document: &'a Document,
    options: TreeFormatOptions,
}

impl<'a> DocumentTreeDebug<'a> {
    /// Create a visualizer with default options.
    pub fn new(document: &'a Document) -> Self {
        Self::with_options(document, TreeFormatOptions::default())
    }

    /// Create a visualizer with custom options.
    pub fn with_options(document: &'a Document, options: TreeFormatOptions) -> Self {
        Self { document, options }
    }

    /// Format the whole document.
    pub fn format_all(&self) -> String {
        self.format_subtree(self.document.root())
    }

    /// Format a subtree starting from `root`.
    pub fn format_subtree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output);
        output
    }

    fn format_subtree_into(&self, id: NodeId, depth: usize, is_last: bool, output: &mut String) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(&self.build_prefix(depth, is_last));
        let doc = self.document;
        match doc.node_kind(&id) {
            NodeKind::Element => {
                let tag = doc.tag_name(id).unwrap_or_default();
                write!(output, "<{tag}").expect("write to String");
                if self.options.show_attributes {
                    for attr in doc.attributes(&id) {
                        write!(output, " {}=\"{}\"", attr.name, attr.value)
                            .expect("write to String");
                    }
                }
                output.push('>');
                if self.options.show_values {
                    let value = doc.value(&id);
                    if !value.is_empty() {
                        write!(output, " value={value:?}").expect("write to String");
                    }
                }
            }
            NodeKind::Text => {
                write!(output, "{:?}", doc.text_content(&id)).expect("write to String");
            }
            NodeKind::Comment => {
                write!(output, "<!--{}-->", doc.text_content(&id)).expect("write to String");
            }
            NodeKind::Document => output.push_str("#document"),
            NodeKind::Fragment => output.push_str("#fragment"),
        }
        if self.options.show_ids {
            write!(output, " [{id:?}]").expect("write to String");
        }
        output.push('\n');

        let children = doc.children(&id);
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_subtree_into(child, depth + 1, i == child_count - 1, output);
        }
    }

    /// Build the prefix string for a tree node.
    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

impl fmt::Display for DocumentTreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId) {
        let doc = Document::new();
        let app = doc.append_element(doc.root(), "div");
        doc.set_attribute(app, "id", "app");
        let input = doc.append_element(app, "input");
        doc.set_attribute(input, "p-model", "q");
        doc.set_value(&input, "typed");
        doc.append_text(app, "tail");
        (doc, app)
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let (doc, app) = sample();
        let output = DocumentTreeDebug::new(&doc).format_subtree(app);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], r#"<div id="app">"#);
        assert_eq!(
            lines[1],
            "\u{251c}\u{2500}\u{2500} <input p-model=\"q\"> value=\"typed\""
        );
        assert_eq!(lines[2], "\u{2514}\u{2500}\u{2500} \"tail\"");
    }

    #[test]
    fn test_tree_format_minimal_ascii() {
        let (doc, app) = sample();
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::minimal()
        };
        let output = DocumentTreeDebug::with_options(&doc, options).format_subtree(app);
        assert_eq!(output, "<div>\n+-- <input>\n`-- \"tail\"\n");
    }

    #[test]
    fn test_tree_format_max_depth() {
        let (doc, _) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        };
        let output = DocumentTreeDebug::with_options(&doc, options).format_all();
        assert_eq!(output.lines().count(), 2);
        assert!(output.starts_with("#document"));
    }
}
