//! The view-model façade.
//!
//! [`ViewModel`] owns a model, makes it reactive, and binds it to the
//! element matched by its `el` selector. Top-level model properties are
//! reachable through [`ViewModel::get`] and [`ViewModel::set`], which pass
//! straight through to the model.

use std::fmt;
use std::sync::Arc;

use strand_core::{
    CompiledTemplate, Compiler, CompilerConfig, Dom, ReactiveObject, Result, Value, make_reactive,
};

/// Construction options for a [`ViewModel`].
#[derive(Debug, Clone)]
pub struct Options {
    /// The plain model. Must be a JSON object to have any properties.
    pub data: serde_json::Value,
    /// Selector for the root element to bind.
    pub el: String,
    /// Template compiler configuration.
    pub compiler: CompilerConfig,
}

impl Options {
    /// Options with the default compiler configuration.
    pub fn new(data: serde_json::Value, el: impl Into<String>) -> Self {
        Self {
            data,
            el: el.into(),
            compiler: CompilerConfig::default(),
        }
    }

    /// Use a different two-way binding attribute.
    pub fn model_attribute(mut self, name: impl Into<String>) -> Self {
        self.compiler.model_attribute = name.into();
        self
    }
}

/// A reactive model bound to a document subtree.
///
/// Construction never fails. If the model is not an object it is treated as
/// empty; if the root element can't be found a diagnostic is logged and the
/// model stays reactive but unbound.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use strand::{Document, Dom, Options, ViewModel};
///
/// let doc = Arc::new(Document::new());
/// let app = doc.append_element(doc.root(), "div");
/// doc.set_attribute(app, "id", "app");
/// let text = doc.append_text(app, "{{ name }}");
///
/// let vm = ViewModel::new(doc.clone(), Options::new(json!({"name": "x"}), "#app"));
/// vm.set("name", "y").unwrap();
/// assert_eq!(doc.text_content(&text), "y");
/// ```
pub struct ViewModel<D: Dom> {
    dom: Arc<D>,
    data: ReactiveObject,
    template: Option<CompiledTemplate<D::Node>>,
}

impl<D: Dom> ViewModel<D> {
    /// Make `options.data` reactive and bind it to `options.el`.
    pub fn new(dom: Arc<D>, options: Options) -> Self {
        let Options { data, el, compiler } = options;
        let data = make_reactive(&data).unwrap_or_else(|| {
            tracing::warn!(target: "strand::facade", "model data is not an object, using an empty model");
            ReactiveObject::empty()
        });

        let template = match Compiler::with_config(dom.clone(), data.clone(), compiler).compile(&el)
        {
            Ok(template) => Some(template),
            Err(err) => {
                tracing::error!(target: "strand::facade", %err, "template left unbound");
                None
            }
        };

        tracing::debug!(
            target: "strand::facade",
            key_count = data.len(),
            bound = template.is_some(),
            "view model created"
        );
        Self {
            dom,
            data,
            template,
        }
    }

    /// Read a top-level model property. `Undefined` if it does not exist.
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key)
    }

    /// Write a top-level model property.
    ///
    /// Returns whether the value changed; bound nodes update before this
    /// returns.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        self.data.set(key, value)
    }

    /// Names of the pass-through properties, in model order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys()
    }

    /// The reactive model.
    pub fn data(&self) -> &ReactiveObject {
        &self.data
    }

    /// The bound document.
    pub fn dom(&self) -> &Arc<D> {
        &self.dom
    }

    /// The compiled template, if the root element was found.
    pub fn template(&self) -> Option<&CompiledTemplate<D::Node>> {
        self.template.as_ref()
    }

    /// Whether the template was bound.
    pub fn is_bound(&self) -> bool {
        self.template.is_some()
    }
}

impl<D: Dom> fmt::Debug for ViewModel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("data", &self.data)
            .field("bound", &self.is_bound())
            .finish()
    }
}
