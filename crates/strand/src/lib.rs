//! Strand - a minimal two-way data-binding engine.
//!
//! This is the umbrella crate: it re-exports [`strand_core`] and adds the
//! [`ViewModel`] façade that takes a plain model and a root selector and
//! wires the two together.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use strand::prelude::*;
//!
//! let doc = Arc::new(Document::new());
//! let app = doc.append_element(doc.root(), "div");
//! doc.set_attribute(app, "id", "app");
//! let input = doc.append_element(app, "input");
//! doc.set_attribute(input, "p-model", "message");
//! let echo = doc.append_text(app, "{{ message }}");
//!
//! let vm = ViewModel::new(doc.clone(), Options::new(json!({"message": "hi"}), "#app"));
//!
//! doc.dispatch_input(input, "hello");
//! assert_eq!(doc.text_content(&echo), "hello");
//! assert_eq!(vm.get("message").render(), "hello");
//! ```

pub use strand_core::*;

pub mod prelude;
mod view_model;

pub use view_model::{Options, ViewModel};
