//! Reactive model conversion.
//!
//! [`make_reactive`] turns plain data into a tree of [`ReactiveCell`]s, one
//! per property at every nesting level. Each cell owns a [`Dep`] and exposes
//! the capability set the rest of the crate builds on:
//!
//! - **read** ([`ReactiveCell::get`]): untracked read of the current value
//! - **track** ([`ReactiveCell::track`]): read that also registers the
//!   collector passed in, if any
//! - **write** ([`ReactiveCell::set`]): store and notify, unless the new
//!   value is identical to the current one
//! - **subscribe** ([`ReactiveCell::subscribe`]): explicit registration
//!
//! The key set of a [`ReactiveObject`] is fixed when it is converted. Cells
//! can't be removed or replaced, so a property stays reactive for the whole
//! lifetime of its object.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use strand_core::{Value, make_reactive};
//!
//! let model = make_reactive(&json!({"user": {"name": "Ada"}})).unwrap();
//! assert_eq!(model.get_path("user.name"), Value::from("Ada"));
//!
//! model.set_path("user.name", "Grace").unwrap();
//! assert_eq!(model.get_path("user.name").render(), "Grace");
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::dep::Dep;
use crate::error::{Error, Result};
use crate::value::Value;
use crate::watcher::{Collector, Watcher};

/// Convert plain data into a reactive object.
///
/// Returns `None` when `plain` is not an object; primitives, arrays and null
/// have no properties to intercept. Nested objects are converted depth first
/// before the cell that holds them is created.
pub fn make_reactive(plain: &serde_json::Value) -> Option<ReactiveObject> {
    match plain {
        serde_json::Value::Object(map) => Some(ReactiveObject::from_map(map)),
        _ => None,
    }
}

/// One reactive property: a value plus its subscription registry.
pub struct ReactiveCell {
    key: String,
    value: RwLock<Value>,
    dep: Dep,
}

impl ReactiveCell {
    fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value: RwLock::new(value),
            dep: Dep::new(),
        }
    }

    /// The property name this cell was created for.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current value without registering anything.
    pub fn get(&self) -> Value {
        self.value.read().clone()
    }

    /// Read the current value, registering `collector`'s watcher first.
    ///
    /// This is the only way a watcher becomes subscribed during resolution.
    pub fn track(&self, collector: Option<&Collector>) -> Value {
        if let Some(collector) = collector.filter(|c| c.should_register(&self.dep)) {
            tracing::trace!(
                target: "strand_core::reactive",
                key = %self.key,
                watcher = collector.watcher().id(),
                "collected dependency"
            );
            self.dep.add_subscriber(collector.watcher().clone());
        }
        self.get()
    }

    /// Write a value, notifying subscribers if it differs from the current one.
    ///
    /// Returns `true` if the value changed. The lock is released before
    /// subscribers run so they can read this cell again.
    pub fn set(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value;
        }
        tracing::debug!(
            target: "strand_core::reactive",
            key = %self.key,
            value = %self.value.read().render(),
            "property changed"
        );
        self.dep.notify();
        true
    }

    /// Register a watcher without reading.
    pub fn subscribe(&self, watcher: Arc<Watcher>) {
        self.dep.add_subscriber(watcher);
    }

    /// The subscription registry owned by this cell.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }
}

impl fmt::Debug for ReactiveCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("key", &self.key)
            .field("value", &*self.value.read())
            .field("subscribers", &self.dep.len())
            .finish()
    }
}

struct ObjectInner {
    cells: Vec<Arc<ReactiveCell>>,
}

/// A shared handle to a reactive object.
///
/// Cloning the handle is cheap and yields the same object; equality between
/// [`Value::Object`]s is identity of this handle.
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Arc<ObjectInner>,
}

impl ReactiveObject {
    pub(crate) fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let cells = map
            .iter()
            .map(|(key, plain)| Arc::new(ReactiveCell::new(key.as_str(), Value::from(plain))))
            .collect();
        Self {
            inner: Arc::new(ObjectInner { cells }),
        }
    }

    /// An object with no properties.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(ObjectInner { cells: Vec::new() }),
        }
    }

    /// Property names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.cells.iter().map(|cell| cell.key())
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.inner.cells.len()
    }

    /// Whether the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.inner.cells.is_empty()
    }

    /// Whether `key` is a property of this object.
    pub fn contains_key(&self, key: &str) -> bool {
        self.cell(key).is_some()
    }

    /// The cell for a top-level property.
    pub fn cell(&self, key: &str) -> Option<Arc<ReactiveCell>> {
        self.inner.cells.iter().find(|cell| cell.key() == key).cloned()
    }

    /// Untracked read of a top-level property; `Undefined` if absent.
    pub fn get(&self, key: &str) -> Value {
        self.cell(key).map_or(Value::Undefined, |cell| cell.get())
    }

    /// Tracked read of a top-level property; `Undefined` if absent.
    pub fn track(&self, key: &str, collector: Option<&Collector>) -> Value {
        self.cell(key)
            .map_or(Value::Undefined, |cell| cell.track(collector))
    }

    /// Write a top-level property.
    ///
    /// Returns whether the value changed, or [`Error::UnknownProperty`] if
    /// the key was not present at conversion.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<bool> {
        let cell = self.cell(key).ok_or_else(|| Error::unknown_property(key))?;
        Ok(cell.set(value))
    }

    /// Tracked read along a dotted path such as `user.name`.
    ///
    /// Every segment is tracked, so the collector is registered with each
    /// cell on the way down. Resolves to `Undefined` as soon as a segment is
    /// missing or not an object.
    pub fn track_path(&self, path: &str, collector: Option<&Collector>) -> Value {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Value::Undefined;
        };
        let mut value = self.track(first, collector);
        for segment in segments {
            value = match &value {
                Value::Object(obj) => obj.track(segment, collector),
                _ => return Value::Undefined,
            };
        }
        value
    }

    /// Untracked read along a dotted path.
    pub fn get_path(&self, path: &str) -> Value {
        self.track_path(path, None)
    }

    /// Resolve the cell at a dotted path.
    pub fn cell_path(&self, path: &str) -> Result<Arc<ReactiveCell>> {
        let mut segments = path.split('.').peekable();
        let mut current = self.clone();
        while let Some(segment) = segments.next() {
            let cell = current
                .cell(segment)
                .ok_or_else(|| Error::unknown_property(path))?;
            if segments.peek().is_none() {
                return Ok(cell);
            }
            current = match cell.get() {
                Value::Object(obj) => obj,
                _ => return Err(Error::not_an_object(path)),
            };
        }
        Err(Error::unknown_property(path))
    }

    /// Write along a dotted path. Only the final segment's cell notifies.
    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> Result<bool> {
        Ok(self.cell_path(path)?.set(value))
    }

    /// Plain, untracked snapshot of the whole object.
    ///
    /// An object that contains itself recurses without bound.
    pub fn to_plain(&self) -> serde_json::Value {
        let map = self
            .inner
            .cells
            .iter()
            .map(|cell| (cell.key().to_string(), cell.get().to_plain()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A non-owning handle.
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A non-owning handle to a [`ReactiveObject`].
///
/// Watchers and input listeners hold these so the model can be dropped
/// while bindings still exist.
#[derive(Clone, Default)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    /// Get the object back, if it is still alive.
    pub fn upgrade(&self) -> Option<ReactiveObject> {
        self.inner.upgrade().map(|inner| ReactiveObject { inner })
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

static_assertions::assert_impl_all!(ReactiveObject: Send, Sync);
static_assertions::assert_impl_all!(WeakObject: Send, Sync);
