//! Template compiler.
//!
//! Compiling a root element binds its subtree to a reactive model in five
//! phases:
//!
//! 1. **Locate** the root with the configured selector.
//! 2. **Ingest** the root's children into a detached fragment.
//! 3. **Collect** binding sites with a pure pre-order walk of the fragment.
//!    Nothing is mutated during the walk.
//! 4. **Bind** each site in discovery order, installing a [`Watcher`] and,
//!    for two-way sites, an input listener.
//! 5. **Re-attach** the fragment to the root, restoring the original order.
//!
//! Two kinds of binding are recognized:
//!
//! - a text node whose entire content is `{{ name }}`
//! - an element carrying the model attribute (`p-model="name"` by default)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use strand_core::{Compiler, Document, Dom, make_reactive};
//!
//! let doc = Arc::new(Document::new());
//! let app = doc.append_element(doc.root(), "div");
//! doc.set_attribute(app, "id", "app");
//! let text = doc.append_text(app, "{{ greeting }}");
//!
//! let model = make_reactive(&json!({"greeting": "hello"})).unwrap();
//! let template = Compiler::new(doc.clone(), model.clone()).compile("#app").unwrap();
//! assert_eq!(template.bindings().len(), 1);
//! assert_eq!(doc.text_content(&text), "hello");
//!
//! model.set("greeting", "bye").unwrap();
//! assert_eq!(doc.text_content(&text), "bye");
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use regex::Regex;

use crate::dom::{Dom, NodeKind};
use crate::error::{Error, Result};
use crate::reactive::ReactiveObject;
use crate::value::Value;
use crate::watcher::Watcher;

/// The two-way binding attribute recognized by default.
pub const DEFAULT_MODEL_ATTRIBUTE: &str = "p-model";

/// Whole-content `{{ name }}`: no nested braces, one interpolation only.
static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{\{\s*([^{}\s][^{}]*?)\s*\}\}$").expect("interpolation pattern is valid")
});

/// Extract the property name from a text node's content, if the whole
/// content is a single interpolation.
pub fn parse_interpolation(text: &str) -> Option<&str> {
    INTERPOLATION
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Configuration for a [`Compiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Name of the attribute that marks a two-way binding.
    pub model_attribute: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            model_attribute: DEFAULT_MODEL_ATTRIBUTE.to_string(),
        }
    }
}

impl CompilerConfig {
    /// Create a configuration using a different two-way binding attribute.
    pub fn with_model_attribute(name: impl Into<String>) -> Self {
        Self {
            model_attribute: name.into(),
        }
    }
}

/// Fluent construction of a [`Compiler`].
#[derive(Debug, Clone, Default)]
pub struct CompilerBuilder {
    config: CompilerConfig,
}

impl CompilerBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the two-way binding attribute.
    pub fn model_attribute(mut self, name: impl Into<String>) -> Self {
        self.config.model_attribute = name.into();
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Build a compiler over `dom` and `model`.
    pub fn build<D: Dom>(self, dom: Arc<D>, model: ReactiveObject) -> Compiler<D> {
        Compiler::with_config(dom, model, self.config)
    }
}

/// The kind of a discovered binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// `{{ name }}` text interpolation.
    Text,
    /// Two-way binding of an element's value field.
    Model,
}

/// A binding discovered in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSite<N> {
    /// The bound node.
    pub node: N,
    /// What kind of binding this is.
    pub kind: BindingKind,
    /// The top-level model property it is bound to.
    pub property: String,
}

/// The result of a successful compile.
///
/// Holds the discovered sites and the watchers installed for them. The
/// watchers are also kept alive by the model's registries, so dropping this
/// value does not unbind anything.
pub struct CompiledTemplate<N> {
    root: N,
    bindings: Vec<BindingSite<N>>,
    watchers: Vec<Arc<Watcher>>,
}

impl<N> CompiledTemplate<N> {
    /// The root element that was compiled.
    pub fn root(&self) -> &N {
        &self.root
    }

    /// Every discovered site, in document order.
    pub fn bindings(&self) -> &[BindingSite<N>] {
        &self.bindings
    }

    /// Watchers installed for sites whose property exists in the model.
    pub fn watchers(&self) -> &[Arc<Watcher>] {
        &self.watchers
    }
}

impl<N: fmt::Debug> fmt::Debug for CompiledTemplate<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("root", &self.root)
            .field("bindings", &self.bindings)
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

/// Binds a document subtree to a reactive model.
pub struct Compiler<D: Dom> {
    dom: Arc<D>,
    model: ReactiveObject,
    config: CompilerConfig,
}

impl<D: Dom> Compiler<D> {
    /// Create a compiler with the default configuration.
    pub fn new(dom: Arc<D>, model: ReactiveObject) -> Self {
        Self::with_config(dom, model, CompilerConfig::default())
    }

    /// Create a compiler with a custom configuration.
    pub fn with_config(dom: Arc<D>, model: ReactiveObject, config: CompilerConfig) -> Self {
        Self { dom, model, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile the subtree under the element matching `selector`.
    ///
    /// If no element matches, nothing is touched and
    /// [`Error::RootNotFound`] is returned after logging a diagnostic.
    #[tracing::instrument(skip(self), target = "strand_core::compiler", level = "debug")]
    pub fn compile(&self, selector: &str) -> Result<CompiledTemplate<D::Node>> {
        let found = self.dom.query_selector(selector).inspect_err(|err| {
            tracing::error!(target: "strand_core::compiler", %err, "root lookup failed");
        })?;
        let Some(root) = found else {
            tracing::error!(target: "strand_core::compiler", selector, "root element not found");
            return Err(Error::root_not_found(selector));
        };

        let fragment = self.ingest(&root);
        let bindings = self.collect(&fragment);
        let watchers = bindings
            .iter()
            .filter_map(|site| self.bind(site))
            .collect::<Vec<_>>();
        self.dom.append_child(&root, &fragment);

        tracing::debug!(
            target: "strand_core::compiler",
            binding_count = bindings.len(),
            watcher_count = watchers.len(),
            "template compiled"
        );
        Ok(CompiledTemplate {
            root,
            bindings,
            watchers,
        })
    }

    /// Move the root's children into a fresh fragment.
    fn ingest(&self, root: &D::Node) -> D::Node {
        let fragment = self.dom.create_fragment();
        for child in self.dom.children(root) {
            self.dom.append_child(&fragment, &child);
        }
        fragment
    }

    /// Discover binding sites below `node` without modifying anything.
    ///
    /// Sites are returned in pre-order: a node's own bindings come before
    /// its descendants'.
    pub fn collect(&self, node: &D::Node) -> Vec<BindingSite<D::Node>> {
        let mut sites = Vec::new();
        self.collect_into(node, &mut sites);
        sites
    }

    fn collect_into(&self, parent: &D::Node, sites: &mut Vec<BindingSite<D::Node>>) {
        for node in self.dom.children(parent) {
            match self.dom.node_kind(&node) {
                NodeKind::Element => {
                    for attr in self.dom.attributes(&node) {
                        if attr.name == self.config.model_attribute {
                            sites.push(BindingSite {
                                node: node.clone(),
                                kind: BindingKind::Model,
                                property: attr.value.trim().to_string(),
                            });
                        }
                    }
                }
                NodeKind::Text => {
                    let text = self.dom.text_content(&node);
                    if let Some(property) = parse_interpolation(&text) {
                        sites.push(BindingSite {
                            node: node.clone(),
                            kind: BindingKind::Text,
                            property: property.to_string(),
                        });
                    }
                }
                _ => {}
            }
            self.collect_into(&node, sites);
        }
    }

    fn bind(&self, site: &BindingSite<D::Node>) -> Option<Arc<Watcher>> {
        if !self.model.contains_key(&site.property) {
            tracing::debug!(
                target: "strand_core::compiler",
                property = %site.property,
                kind = ?site.kind,
                "binding to unknown property renders empty"
            );
            match site.kind {
                BindingKind::Text => self.dom.set_text_content(&site.node, ""),
                BindingKind::Model => self.dom.set_value(&site.node, ""),
            }
            return None;
        }
        let watcher = match site.kind {
            BindingKind::Text => self.bind_text(&site.node, &site.property),
            BindingKind::Model => self.bind_model(&site.node, &site.property),
        };
        Some(watcher)
    }

    fn bind_text(&self, node: &D::Node, property: &str) -> Arc<Watcher> {
        let initial = self.model.get(property);
        self.dom.set_text_content(node, &initial.render());

        let dom = self.dom.clone();
        let node = node.clone();
        Watcher::new(&self.model, property, move |_, value, _| {
            dom.set_text_content(&node, &value.render());
        })
    }

    fn bind_model(&self, node: &D::Node, property: &str) -> Arc<Watcher> {
        let initial = self.model.get(property);
        self.dom.set_value(node, &initial.render());

        // Last value applied in either direction.
        let last_applied = Arc::new(Mutex::new(initial));

        let watcher = {
            let dom = self.dom.clone();
            let node = node.clone();
            let last_applied = last_applied.clone();
            Watcher::new(&self.model, property, move |_, value, _| {
                *last_applied.lock() = value.clone();
                dom.set_value(&node, &value.render());
            })
        };

        let model = self.model.downgrade();
        let property = property.to_string();
        self.dom.add_input_listener(
            node,
            Arc::new(move |input: &str| {
                let value = Value::from(input);
                {
                    let mut last = last_applied.lock();
                    if *last == value {
                        return;
                    }
                    *last = value.clone();
                }
                let Some(model) = model.upgrade() else {
                    return;
                };
                if let Err(err) = model.set(&property, value) {
                    tracing::debug!(target: "strand_core::compiler", %err, "input write-back dropped");
                }
            }),
        );
        watcher
    }
}

impl<D: Dom> fmt::Debug for Compiler<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("model", &self.model)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};
    use crate::reactive::make_reactive;
    use serde_json::json;

    fn app(doc: &Document) -> NodeId {
        let app = doc.append_element(doc.root(), "div");
        doc.set_attribute(app, "id", "app");
        app
    }

    #[test]
    fn test_parse_interpolation() {
        assert_eq!(parse_interpolation("{{name}}"), Some("name"));
        assert_eq!(parse_interpolation("{{  name  }}"), Some("name"));
        assert_eq!(parse_interpolation("{{}}"), None);
        assert_eq!(parse_interpolation("{{ }}"), None);
        assert_eq!(parse_interpolation("{{a}} {{b}}"), None);
        assert_eq!(parse_interpolation("{{ {x} }}"), None);
        assert_eq!(parse_interpolation("{{name"), None);
        assert_eq!(parse_interpolation("hello {{name}}"), None);
        assert_eq!(parse_interpolation("plain"), None);
    }

    #[test]
    fn test_collect_is_preorder_and_pure() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let form = doc.append_element(root, "form");
        doc.set_attribute(form, "p-model", "outer");
        let input = doc.append_element(form, "input");
        doc.set_attribute(input, "p-model", "inner");
        let text = doc.append_text(root, "{{ tail }}");

        let model = make_reactive(&json!({})).unwrap();
        let compiler = Compiler::new(doc.clone(), model);
        let before = doc.to_markup(root);
        let sites = compiler.collect(&root);
        assert_eq!(doc.to_markup(root), before);

        let summary: Vec<_> = sites
            .iter()
            .map(|site| (site.node, site.kind, site.property.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (form, BindingKind::Model, "outer"),
                (input, BindingKind::Model, "inner"),
                (text, BindingKind::Text, "tail"),
            ]
        );
    }

    #[test]
    fn test_attribute_matching_uses_equality() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let input = doc.append_element(root, "input");
        doc.set_attribute(input, "type", "text");
        doc.set_attribute(input, "p-model", "q");
        doc.set_attribute(input, "placeholder", "search");

        let model = make_reactive(&json!({"q": "1"})).unwrap();
        let template = Compiler::new(doc.clone(), model).compile("#app").unwrap();
        assert_eq!(template.bindings().len(), 1);
        assert_eq!(template.bindings()[0].property, "q");
        assert_eq!(doc.value(&input), "1");
    }

    #[test]
    fn test_custom_model_attribute() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let input = doc.append_element(root, "input");
        doc.set_attribute(input, "v-model", "q");
        let ignored = doc.append_element(root, "input");
        doc.set_attribute(ignored, "p-model", "q");

        let model = make_reactive(&json!({"q": "x"})).unwrap();
        let config = CompilerConfig::with_model_attribute("v-model");
        let template = Compiler::with_config(doc.clone(), model, config)
            .compile("#app")
            .unwrap();
        assert_eq!(template.bindings().len(), 1);
        assert_eq!(doc.value(&input), "x");
        assert_eq!(doc.value(&ignored), "");
    }

    #[test]
    fn test_builder_sets_model_attribute() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let input = doc.append_element(root, "input");
        doc.set_attribute(input, "x-bind", "q");

        let model = make_reactive(&json!({"q": "y"})).unwrap();
        let compiler = CompilerBuilder::new()
            .model_attribute("x-bind")
            .build(doc.clone(), model);
        assert_eq!(compiler.config().model_attribute, "x-bind");

        let template = compiler.compile("#app").unwrap();
        assert_eq!(template.bindings().len(), 1);
        assert_eq!(doc.value(&input), "y");
    }

    #[test]
    fn test_builder_defaults() {
        assert_eq!(CompilerBuilder::new().config(), &CompilerConfig::default());
    }

    #[test]
    fn test_missing_root_leaves_template_untouched() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let text = doc.append_text(root, "{{ name }}");

        let model = make_reactive(&json!({"name": "x"})).unwrap();
        let result = Compiler::new(doc.clone(), model.clone()).compile("#missing");
        assert_eq!(result.err(), Some(Error::root_not_found("#missing")));
        assert_eq!(doc.text_content(&text), "{{ name }}");
        assert!(model.cell("name").unwrap().dep().is_empty());
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let doc = Arc::new(Document::new());
        let model = make_reactive(&json!({})).unwrap();
        let result = Compiler::new(doc, model).compile("div p");
        assert_eq!(result.err(), Some(Error::invalid_selector("div p")));
    }

    #[test]
    fn test_children_order_restored() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let a = doc.append_element(root, "span");
        let b = doc.append_text(root, "{{ n }}");
        let c = doc.append_element(root, "input");
        doc.set_attribute(c, "p-model", "n");

        let model = make_reactive(&json!({"n": 3})).unwrap();
        Compiler::new(doc.clone(), model).compile("#app").unwrap();
        assert_eq!(doc.children(&root), vec![a, b, c]);
        assert_eq!(doc.parent(b), Some(root));
    }

    #[test]
    fn test_unknown_property_renders_empty_without_watcher() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let text = doc.append_text(root, "{{ ghost }}");
        let input = doc.append_element(root, "input");
        doc.set_attribute(input, "p-model", "phantom");

        let model = make_reactive(&json!({"real": 1})).unwrap();
        let template = Compiler::new(doc.clone(), model.clone()).compile("#app").unwrap();
        assert_eq!(template.bindings().len(), 2);
        assert!(template.watchers().is_empty());
        assert_eq!(doc.text_content(&text), "");
        assert_eq!(doc.value(&input), "");
        assert_eq!(doc.input_listener_count(input), 0);
    }

    #[test]
    fn test_dotted_names_are_not_paths() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let text = doc.append_text(root, "{{ user.name }}");

        let model = make_reactive(&json!({"user": {"name": "Ada"}})).unwrap();
        Compiler::new(doc.clone(), model).compile("#app").unwrap();
        assert_eq!(doc.text_content(&text), "");
    }

    #[test]
    fn test_watchers_registered_in_document_order() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        doc.append_text(root, "{{ n }}");
        let p = doc.append_element(root, "p");
        doc.append_text(p, "{{ n }}");

        let model = make_reactive(&json!({"n": 0})).unwrap();
        let template = Compiler::new(doc.clone(), model.clone()).compile("#app").unwrap();
        let ids: Vec<u64> = template.watchers().iter().map(|w| w.id()).collect();
        assert_eq!(model.cell("n").unwrap().dep().subscriber_ids(), ids);
    }

    #[test]
    fn test_input_listener_skips_repeated_value() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let input = doc.append_element(root, "input");
        doc.set_attribute(input, "p-model", "q");

        let model = make_reactive(&json!({"q": "1"})).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let template = Compiler::new(doc.clone(), model.clone()).compile("#app").unwrap();
        let _spy = Watcher::new(&model, "q", move |_, new, _| log.lock().push(new.render()));
        assert_eq!(template.watchers().len(), 1);

        doc.dispatch_input(input, "1");
        doc.dispatch_input(input, "2");
        doc.dispatch_input(input, "2");
        assert_eq!(*seen.lock(), vec!["2".to_string()]);
    }

    #[test]
    fn test_retyping_value_after_programmatic_change() {
        let doc = Arc::new(Document::new());
        let root = app(&doc);
        let input = doc.append_element(root, "input");
        doc.set_attribute(input, "p-model", "q");

        let model = make_reactive(&json!({"q": "1"})).unwrap();
        Compiler::new(doc.clone(), model.clone()).compile("#app").unwrap();

        doc.dispatch_input(input, "2");
        model.set("q", "3").unwrap();
        assert_eq!(doc.value(&input), "3");

        doc.dispatch_input(input, "2");
        assert_eq!(model.get("q"), Value::from("2"));
    }
}
