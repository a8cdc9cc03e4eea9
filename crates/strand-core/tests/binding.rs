//! Integration tests for reactivity and template binding.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use strand_core::{Compiler, Document, Dom, NodeId, Value, Watcher, make_reactive};

fn app(doc: &Document) -> NodeId {
    let app = doc.append_element(doc.root(), "div");
    doc.set_attribute(app, "id", "app");
    app
}

#[test]
fn test_round_trip_notifies_each_subscriber_once_in_order() {
    let model = make_reactive(&json!({"p": "v0"})).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let watchers: Vec<_> = (0..3)
        .map(|i| {
            let log = log.clone();
            Watcher::new(&model, "p", move |_, new, old| {
                log.lock().push((i, new.render(), old.render()));
            })
        })
        .collect();
    assert_eq!(watchers.len(), 3);

    model.set("p", "v1").unwrap();
    assert_eq!(
        *log.lock(),
        vec![
            (0, "v1".to_string(), "v0".to_string()),
            (1, "v1".to_string(), "v0".to_string()),
            (2, "v1".to_string(), "v0".to_string()),
        ]
    );

    // Writing the held value again notifies nobody.
    log.lock().clear();
    model.set("p", "v1").unwrap();
    assert!(log.lock().is_empty());
}

#[test]
fn test_nested_properties_are_tracked_independently() {
    let model = make_reactive(&json!({"a": {"b": 1}})).unwrap();
    let hits = Arc::new(Mutex::new(Vec::new()));

    let a_hits = hits.clone();
    let _on_a = Watcher::new(&model, "a", move |_, _, _| a_hits.lock().push("a"));
    let inner = model.get("a").as_object().cloned().unwrap();
    let b_hits = hits.clone();
    let _on_b = Watcher::new(&inner, "b", move |_, _, _| b_hits.lock().push("b"));

    inner.set("b", 2).unwrap();
    assert_eq!(*hits.lock(), vec!["b"]);

    model.set("a", json!({"b": 3})).unwrap();
    assert_eq!(*hits.lock(), vec!["b", "a"]);
}

#[test]
fn test_text_binding_scenario() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let p = doc.append_element(root, "p");
    let text = doc.append_text(p, "{{name}}");

    let model = make_reactive(&json!({"name": "x"})).unwrap();
    Compiler::new(doc.clone(), model.clone())
        .compile("#app")
        .unwrap();
    assert_eq!(doc.text_content(&text), "x");

    model.set("name", "y").unwrap();
    assert_eq!(doc.text_content(&text), "y");

    model.set("name", Value::Undefined).unwrap();
    assert_eq!(doc.text_content(&text), "");
    assert_eq!(doc.to_markup(root), r#"<div id="app"><p></p></div>"#);
}

#[test]
fn test_two_way_binding_scenario() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let input = doc.append_element(root, "input");
    doc.set_attribute(input, "p-model", "q");

    let model = make_reactive(&json!({"q": "1"})).unwrap();
    Compiler::new(doc.clone(), model.clone())
        .compile("#app")
        .unwrap();
    assert_eq!(doc.value(&input), "1");

    doc.dispatch_input(input, "2");
    assert_eq!(model.get("q"), Value::from("2"));

    model.set("q", "3").unwrap();
    assert_eq!(doc.value(&input), "3");
}

#[test]
fn test_undefined_property_renders_empty() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let text = doc.append_text(root, "{{ missing }}");

    let model = make_reactive(&json!({"present": true})).unwrap();
    Compiler::new(doc.clone(), model).compile("#app").unwrap();
    assert_eq!(doc.text_content(&text), "");
}

#[test]
fn test_input_updates_every_bound_site() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let input = doc.append_element(root, "input");
    doc.set_attribute(input, "p-model", "title");
    let heading = doc.append_element(root, "h1");
    let text = doc.append_text(heading, "{{ title }}");

    let model = make_reactive(&json!({"title": "Draft"})).unwrap();
    Compiler::new(doc.clone(), model.clone())
        .compile("#app")
        .unwrap();
    assert_eq!(doc.text_content(&text), "Draft");

    doc.dispatch_input(input, "Final");
    assert_eq!(doc.text_content(&text), "Final");
    assert_eq!(
        doc.to_markup(root),
        r#"<div id="app"><input p-model="title"><h1>Final</h1></div>"#
    );
}

#[test]
fn test_malformed_interpolations_stay_static() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let two = doc.append_text(root, "{{a}}{{b}}");
    let open = doc.append_text(root, "{{a");
    let prefixed = doc.append_text(root, "x {{a}}");

    let model = make_reactive(&json!({"a": 1, "b": 2})).unwrap();
    let template = Compiler::new(doc.clone(), model).compile("#app").unwrap();
    assert!(template.bindings().is_empty());
    assert_eq!(doc.text_content(&two), "{{a}}{{b}}");
    assert_eq!(doc.text_content(&open), "{{a");
    assert_eq!(doc.text_content(&prefixed), "x {{a}}");
}

#[test]
fn test_numbers_render_without_fraction() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let text = doc.append_text(root, "{{ count }}");

    let model = make_reactive(&json!({"count": 1})).unwrap();
    Compiler::new(doc.clone(), model.clone())
        .compile("#app")
        .unwrap();
    assert_eq!(doc.text_content(&text), "1");

    model.set("count", 2.5).unwrap();
    assert_eq!(doc.text_content(&text), "2.5");
}

#[test]
fn test_bindings_survive_dropped_template() {
    let doc = Arc::new(Document::new());
    let root = app(&doc);
    let text = doc.append_text(root, "{{ n }}");

    let model = make_reactive(&json!({"n": 0})).unwrap();
    drop(
        Compiler::new(doc.clone(), model.clone())
            .compile("#app")
            .unwrap(),
    );

    model.set("n", 5).unwrap();
    assert_eq!(doc.text_content(&text), "5");
}
