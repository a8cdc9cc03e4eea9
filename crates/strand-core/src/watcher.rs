//! Watchers: live bindings between one model path and one callback.
//!
//! A [`Watcher`] subscribes itself by reading. On construction it resolves
//! its path once with a [`Collector`] in hand; every cell read during that
//! pass appends the watcher to its [`Dep`](crate::Dep). There is no separate
//! subscribe step.
//!
//! The collector is an ordinary value passed down the call stack, scoped to
//! one resolution pass. Nothing outlives the pass, so a read made anywhere
//! else can never be attributed to a watcher, and building a watcher from
//! inside another watcher's callback is safe.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use serde_json::json;
//! use strand_core::{Value, Watcher, make_reactive};
//!
//! let model = make_reactive(&json!({"count": 0})).unwrap();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let log = seen.clone();
//! let watcher = Watcher::new(&model, "count", move |_, new, old| {
//!     log.lock().push((new.clone(), old.clone()));
//! });
//!
//! model.set("count", 1).unwrap();
//! assert_eq!(*seen.lock(), vec![(Value::from(1), Value::from(0))]);
//! assert_eq!(watcher.value(), Value::from(1));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::reactive::{ReactiveObject, WeakObject};
use crate::value::Value;

/// Callback invoked with `(model, new_value, old_value)` when a watched
/// value changes.
pub type WatchCallback = Box<dyn Fn(&ReactiveObject, &Value, &Value) + Send + Sync>;

static NEXT_WATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// Dependency collection context for a single resolution pass.
///
/// Passing a collector to [`ReactiveCell::track`](crate::ReactiveCell::track)
/// registers its watcher with that cell.
pub struct Collector {
    watcher: Arc<Watcher>,
    skip_registered: bool,
}

impl Collector {
    /// A collector that registers `watcher` on every tracked read.
    pub fn for_watcher(watcher: &Arc<Watcher>) -> Self {
        Self {
            watcher: watcher.clone(),
            skip_registered: false,
        }
    }

    /// A collector for re-resolving `watcher`: cells that already list the
    /// watcher are left alone.
    pub fn for_rerun(watcher: &Arc<Watcher>) -> Self {
        Self {
            watcher: watcher.clone(),
            skip_registered: true,
        }
    }

    /// The watcher being collected for.
    pub fn watcher(&self) -> &Arc<Watcher> {
        &self.watcher
    }

    /// Whether a read of a cell guarded by `dep` should register the watcher.
    pub(crate) fn should_register(&self, dep: &crate::Dep) -> bool {
        !(self.skip_registered && dep.contains(self.watcher.id))
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("watcher", &self.watcher.id)
            .finish()
    }
}

/// A subscriber to one model path.
///
/// The watcher caches the last value it saw and only invokes its callback
/// when a re-read produces a value that is not strictly equal to the cache.
/// It holds the model weakly; once the model is dropped, updates are no-ops.
pub struct Watcher {
    id: u64,
    model: WeakObject,
    path: String,
    value: Mutex<Value>,
    callback: WatchCallback,
}

impl Watcher {
    /// Create a watcher and subscribe it by resolving `path` once.
    ///
    /// `path` is a property name or a dotted path (`user.name`). Each
    /// segment read is tracked, so a watcher on `user.name` is registered
    /// with both `user` and `name`. When an intermediate object is replaced,
    /// the next run registers the watcher with the replacement's cells.
    pub fn new<F>(model: &ReactiveObject, path: impl Into<String>, callback: F) -> Arc<Self>
    where
        F: Fn(&ReactiveObject, &Value, &Value) + Send + Sync + 'static,
    {
        let watcher = Arc::new(Self {
            id: NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed),
            model: model.downgrade(),
            path: path.into(),
            value: Mutex::new(Value::Undefined),
            callback: Box::new(callback),
        });
        let value = watcher.resolve(model);
        tracing::trace!(
            target: "strand_core::watcher",
            id = watcher.id,
            path = %watcher.path,
            value = %value.render(),
            "watcher resolved"
        );
        *watcher.value.lock() = value;
        watcher
    }

    fn resolve(self: &Arc<Self>, model: &ReactiveObject) -> Value {
        let collector = Collector::for_watcher(self);
        model.track_path(&self.path, Some(&collector))
    }

    /// Called by a [`Dep`](crate::Dep) when a dependency changed.
    pub fn update(self: &Arc<Self>) {
        self.run();
    }

    /// Re-read the path and fire the callback if the value changed.
    ///
    /// A single-key path is re-read untracked. A dotted path is re-read with
    /// a [`Collector::for_rerun`], since the objects along it may be new.
    pub fn run(self: &Arc<Self>) {
        let Some(model) = self.model.upgrade() else {
            tracing::trace!(target: "strand_core::watcher", id = self.id, "model dropped, skipping");
            return;
        };
        let value = if self.path.contains('.') {
            model.track_path(&self.path, Some(&Collector::for_rerun(self)))
        } else {
            model.get_path(&self.path)
        };
        let old = {
            let mut cached = self.value.lock();
            if *cached == value {
                return;
            }
            std::mem::replace(&mut *cached, value.clone())
        };
        tracing::trace!(
            target: "strand_core::watcher",
            id = self.id,
            path = %self.path,
            "watcher fired"
        );
        (self.callback)(&model, &value, &old);
    }

    /// The last value this watcher observed.
    pub fn value(&self) -> Value {
        self.value.lock().clone()
    }

    /// The watched path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Process-unique id, useful in logs.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("value", &*self.value.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::make_reactive;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_construction_registers_exactly_once() {
        let model = make_reactive(&json!({"p": 1, "q": 2})).unwrap();
        let watcher = Watcher::new(&model, "p", |_, _, _| {});

        assert_eq!(model.cell("p").unwrap().dep().subscriber_ids(), vec![watcher.id()]);
        assert!(model.cell("q").unwrap().dep().is_empty());
        assert_eq!(watcher.value(), Value::from(1));
    }

    #[test]
    fn test_reads_after_construction_are_not_collected() {
        let model = make_reactive(&json!({"p": 1})).unwrap();
        let _watcher = Watcher::new(&model, "p", |_, _, _| {});

        // Plain reads after the resolution pass must not register anyone.
        let _ = model.get("p");
        let _ = model.track("p", None);
        assert_eq!(model.cell("p").unwrap().dep().len(), 1);
    }

    #[test]
    fn test_run_fires_with_new_and_old() {
        let model = make_reactive(&json!({"p": "a"})).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _watcher = Watcher::new(&model, "p", move |_, new, old| {
            log.lock().push((new.render(), old.render()));
        });

        model.set("p", "b").unwrap();
        model.set("p", "b").unwrap();
        model.set("p", "a").unwrap();
        assert_eq!(
            *seen.lock(),
            vec![
                ("b".to_string(), "a".to_string()),
                ("a".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_callback_receives_model() {
        let model = make_reactive(&json!({"p": 1, "mirror": 0})).unwrap();
        let _watcher = Watcher::new(&model, "p", |model, new, _| {
            model.set("mirror", new.clone()).unwrap();
        });

        model.set("p", 7).unwrap();
        assert_eq!(model.get("mirror"), Value::from(7));
    }

    #[test]
    fn test_missing_property_resolves_undefined() {
        let model = make_reactive(&json!({"p": 1})).unwrap();
        let watcher = Watcher::new(&model, "missing", |_, _, _| {});
        assert!(watcher.value().is_undefined());
    }

    #[test]
    fn test_dotted_path_tracks_every_segment() {
        let model = make_reactive(&json!({"user": {"name": "Ada"}})).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let watcher = Watcher::new(&model, "user.name", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(model.cell("user").unwrap().dep().len(), 1);
        assert_eq!(model.cell_path("user.name").unwrap().dep().len(), 1);

        model.set_path("user.name", "Grace").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.value(), Value::from("Grace"));

        model.set("user", json!({"name": "Linus"})).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(watcher.value(), Value::from("Linus"));
    }

    #[test]
    fn test_dotted_path_follows_replaced_parent() {
        let model = make_reactive(&json!({"user": {"name": "Ada"}})).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let watcher = Watcher::new(&model, "user.name", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        model.set("user", json!({"name": "Linus"})).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Registered once on the replacement's cell, still once on the parent.
        assert_eq!(model.cell_path("user.name").unwrap().dep().len(), 1);
        assert_eq!(model.cell("user").unwrap().dep().len(), 1);

        model.set_path("user.name", "Grace").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(watcher.value(), model.get_path("user.name"));
        assert_eq!(watcher.value(), Value::from("Grace"));

        // Repeated runs do not pile up registrations.
        model.set_path("user.name", "Edsger").unwrap();
        assert_eq!(model.cell_path("user.name").unwrap().dep().len(), 1);
        assert_eq!(watcher.value(), Value::from("Edsger"));
    }

    #[test]
    fn test_nested_construction_inside_callback() {
        let model = make_reactive(&json!({"a": 1, "b": 1})).unwrap();
        let spawned = Arc::new(Mutex::new(Vec::new()));
        let store = spawned.clone();
        let _outer = Watcher::new(&model, "a", move |model, _, _| {
            store.lock().push(Watcher::new(model, "b", |_, _, _| {}));
        });

        model.set("a", 2).unwrap();
        // The inner watcher lands on "b" only, never on "a".
        assert_eq!(model.cell("a").unwrap().dep().len(), 1);
        assert_eq!(model.cell("b").unwrap().dep().len(), 1);
    }

    #[test]
    fn test_dropped_model_makes_run_noop() {
        let model = make_reactive(&json!({"p": 1})).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let watcher = Watcher::new(&model, "p", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(model);
        watcher.run();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_registration_fires_once() {
        let model = make_reactive(&json!({"p": 1})).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let watcher = Watcher::new(&model, "p", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        model.cell("p").unwrap().subscribe(watcher.clone());
        assert_eq!(model.cell("p").unwrap().dep().len(), 2);

        model.set("p", 2).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
