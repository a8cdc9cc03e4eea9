//! Binds a small form to a model and drives it from both directions.
//!
//! Run with `RUST_LOG=strand_core=debug cargo run --example greeting` to see
//! the property writes and watcher activity.

use std::sync::Arc;

use serde_json::json;
use strand::logging::DocumentTreeDebug;
use strand::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let doc = Arc::new(Document::new());
    let app = doc.append_element(doc.root(), "div");
    doc.set_attribute(app, "id", "app");

    let input = doc.append_element(app, "input");
    doc.set_attribute(input, "type", "text");
    doc.set_attribute(input, "p-model", "name");
    let heading = doc.append_element(app, "h1");
    doc.append_text(heading, "{{ name }}");
    let footer = doc.append_element(app, "p");
    doc.append_text(footer, "{{ visits }}");

    let vm = ViewModel::new(
        doc.clone(),
        Options::new(json!({"name": "world", "visits": 1}), "#app"),
    );
    println!("initial:\n{}", DocumentTreeDebug::new(&doc).format_subtree(app));

    doc.dispatch_input(input, "strand");
    println!("after typing:\n{}", doc.to_markup(app));

    if let Err(err) = vm.set("visits", 2) {
        eprintln!("write failed: {err}");
    }
    vm.set("name", "again").ok();
    println!("after model writes:\n{}", doc.to_markup(app));
}
