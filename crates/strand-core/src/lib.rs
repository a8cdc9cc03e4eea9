//! Core systems for Strand.
//!
//! This crate provides the two halves of Strand's data binding:
//!
//! - **Reactive model**: plain data converted into a tree of reactive cells,
//!   each owning a subscription registry ([`Dep`])
//! - **Watchers**: subscribers that register themselves by reading and fire
//!   a callback when the value they read changes
//! - **Document abstraction**: the [`Dom`] capability trait, plus an
//!   in-memory [`Document`]
//! - **Template compiler**: discovers `{{ name }}` interpolations and
//!   `p-model` two-way bindings and wires them to the model
//!
//! # Reactivity Example
//!
//! ```
//! use serde_json::json;
//! use strand_core::{Watcher, make_reactive};
//!
//! let model = make_reactive(&json!({"count": 0})).unwrap();
//! let watcher = Watcher::new(&model, "count", |_, new, old| {
//!     println!("count: {old} -> {new}");
//! });
//!
//! model.set("count", 1).unwrap();
//! assert_eq!(watcher.value().render(), "1");
//! ```
//!
//! # Binding Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use strand_core::{Compiler, Document, Value, make_reactive};
//!
//! let doc = Arc::new(Document::new());
//! let app = doc.append_element(doc.root(), "div");
//! doc.set_attribute(app, "id", "app");
//! let input = doc.append_element(app, "input");
//! doc.set_attribute(input, "p-model", "query");
//!
//! let model = make_reactive(&json!({"query": ""})).unwrap();
//! Compiler::new(doc.clone(), model.clone()).compile("#app").unwrap();
//!
//! // A user edit writes back to the model.
//! doc.dispatch_input(input, "rust");
//! assert_eq!(model.get("query"), Value::from("rust"));
//! ```

pub mod compiler;
mod dep;
pub mod dom;
mod error;
pub mod logging;
pub mod reactive;
mod value;
pub mod watcher;

pub use compiler::{
    BindingKind, BindingSite, CompiledTemplate, Compiler, CompilerBuilder, CompilerConfig,
    DEFAULT_MODEL_ATTRIBUTE,
};
pub use dep::Dep;
pub use dom::{Attribute, Document, Dom, InputListener, NodeId, NodeKind};
pub use error::{Error, Result};
pub use logging::{DocumentTreeDebug, TreeFormatOptions, TreeStyle};
pub use reactive::{ReactiveCell, ReactiveObject, WeakObject, make_reactive};
pub use value::Value;
pub use watcher::{Collector, WatchCallback, Watcher};
